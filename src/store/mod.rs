//! Persistence of discovered items, seen URLs and save counters

pub mod error;
pub mod sqlite;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
pub use types::{
    ContentType, DiscoveredItem, EnrichedContent, ItemStatus, NewItem, SaveCounters, SeenUrl,
};

use crate::hero::{HeroImageResult, HeroSink};

/// Open a WAL-mode SQLite pool at `db_path`, creating the file and its
/// parent directory if needed.
pub async fn open_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .context("Failed to open SQLite database")
}

/// Durable side of the discovery pipeline
#[async_trait]
pub trait DiscoveryStore: Send + Sync {
    /// Existing item of the patch whose canonical or source URL matches.
    async fn find_by_canonical_url(
        &self,
        patch_id: &str,
        canonical_url: &str,
    ) -> StoreResult<Option<DiscoveredItem>>;

    /// Insert an item. A second item with the same `(patch_id, canonical_url)`
    /// fails with [`StoreError::Duplicate`].
    async fn create(&self, item: NewItem) -> StoreResult<DiscoveredItem>;

    /// SimHashes of every saved item of the patch.
    async fn content_hashes(&self, patch_id: &str) -> StoreResult<Vec<u64>>;

    /// Upsert the seen-URL row of a canonical URL, bumping `times_seen`.
    async fn record_seen_url(&self, canonical_url: &str, domain: &str) -> StoreResult<()>;

    async fn seen_url(&self, canonical_url: &str) -> StoreResult<Option<SeenUrl>>;

    async fn increment_save_counters(
        &self,
        patch_id: &str,
        controversy: bool,
        history: bool,
    ) -> StoreResult<SaveCounters>;

    async fn save_counters(&self, patch_id: &str) -> StoreResult<SaveCounters>;

    async fn item_count(&self, patch_id: &str) -> StoreResult<u64>;

    /// Items still carrying a skeleton (or no) hero, oldest first.
    async fn skeleton_hero_items(&self, patch_id: &str, limit: usize) -> StoreResult<Vec<DiscoveredItem>>;

    async fn update_hero(&self, item_id: &str, hero: &HeroImageResult) -> StoreResult<()>;

    async fn update_status(&self, item_id: &str, status: ItemStatus) -> StoreResult<()>;
}

/// Writes backfilled heroes through a [`DiscoveryStore`]
pub struct StoreHeroSink {
    store: Arc<dyn DiscoveryStore>,
}

impl StoreHeroSink {
    #[must_use]
    pub fn new(store: Arc<dyn DiscoveryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HeroSink for StoreHeroSink {
    async fn save_hero(&self, item_id: &str, hero: &HeroImageResult) -> Result<()> {
        self.store
            .update_hero(item_id, hero)
            .await
            .with_context(|| format!("Failed to save hero for {item_id}"))
    }
}
