//! SQLite-backed [`DiscoveryStore`]

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::types::{
    ContentType, DiscoveredItem, EnrichedContent, ItemStatus, NewItem, SaveCounters, SeenUrl,
};
use super::{DiscoveryStore, open_pool};
use crate::fingerprint::simhash::{from_stored, to_stored};
use crate::hero::{HeroImageResult, HeroSource};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS discovered_content (
    id TEXT PRIMARY KEY,
    patch_id TEXT NOT NULL,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    canonical_url TEXT NOT NULL,
    domain TEXT NOT NULL,
    content TEXT NOT NULL,
    content_type TEXT NOT NULL,
    status TEXT NOT NULL,
    relevance_score REAL NOT NULL,
    quality_score REAL NOT NULL,
    sim_hash INTEGER NOT NULL,
    contested INTEGER NOT NULL DEFAULT 0,
    enriched_json TEXT NOT NULL,
    hero_url TEXT,
    hero_source TEXT,
    hero_width INTEGER,
    hero_height INTEGER,
    hero_alt TEXT,
    hero_color TEXT,
    created_at INTEGER NOT NULL,
    UNIQUE(patch_id, canonical_url)
);

CREATE INDEX IF NOT EXISTS idx_content_patch ON discovered_content(patch_id, created_at);
CREATE INDEX IF NOT EXISTS idx_content_url ON discovered_content(patch_id, url);

CREATE TABLE IF NOT EXISTS seen_urls (
    url TEXT PRIMARY KEY,
    first_seen INTEGER NOT NULL,
    last_seen INTEGER NOT NULL,
    times_seen INTEGER NOT NULL DEFAULT 1,
    domain TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS save_counters (
    patch_id TEXT PRIMARY KEY,
    total INTEGER NOT NULL DEFAULT 0,
    controversy INTEGER NOT NULL DEFAULT 0,
    history INTEGER NOT NULL DEFAULT 0
);
"#;

const ITEM_COLUMNS: &str = "id, patch_id, title, url, canonical_url, domain, content, content_type, \
     status, relevance_score, quality_score, sim_hash, contested, enriched_json, hero_url, \
     hero_source, hero_width, hero_height, hero_alt, hero_color, created_at";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the store at `db_path`, creating tables on first use.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = open_pool(db_path).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("Failed to initialize database schema")?;
        Ok(Self { pool })
    }

    /// Pool handle, for sharing with the durable dedup state.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get(&self, item_id: &str) -> StoreResult<Option<DiscoveredItem>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM discovered_content WHERE id = ?"))
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    /// Most recent items of a patch.
    pub async fn items(&self, patch_id: &str, limit: usize) -> StoreResult<Vec<DiscoveredItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM discovered_content WHERE patch_id = ? ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(patch_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(item_from_row).collect()
    }
}

fn millis_to_datetime(millis: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {millis}")))
}

fn hero_from_row(row: &SqliteRow) -> StoreResult<Option<HeroImageResult>> {
    let Some(url) = row.try_get::<Option<String>, _>("hero_url")? else {
        return Ok(None);
    };
    let source_name: Option<String> = row.try_get("hero_source")?;
    let source = source_name
        .as_deref()
        .and_then(HeroSource::parse)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown hero source {source_name:?}")))?;

    Ok(Some(HeroImageResult {
        url,
        source,
        width: row.try_get::<Option<i64>, _>("hero_width")?.unwrap_or(0).max(0) as u32,
        height: row.try_get::<Option<i64>, _>("hero_height")?.unwrap_or(0).max(0) as u32,
        alt: row.try_get::<Option<String>, _>("hero_alt")?.unwrap_or_default(),
        dominant_color: row.try_get("hero_color")?,
    }))
}

fn item_from_row(row: &SqliteRow) -> StoreResult<DiscoveredItem> {
    let content_type: String = row.try_get("content_type")?;
    let status: String = row.try_get("status")?;
    let enriched_json: String = row.try_get("enriched_json")?;
    let enriched: EnrichedContent = serde_json::from_str(&enriched_json)?;

    Ok(DiscoveredItem {
        id: row.try_get("id")?,
        patch_id: row.try_get("patch_id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        canonical_url: row.try_get("canonical_url")?,
        domain: row.try_get("domain")?,
        content: row.try_get("content")?,
        content_type: ContentType::parse(&content_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown content type {content_type}")))?,
        status: ItemStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status {status}")))?,
        relevance_score: row.try_get("relevance_score")?,
        quality_score: row.try_get("quality_score")?,
        sim_hash: from_stored(row.try_get("sim_hash")?),
        contested: row.try_get::<i64, _>("contested")? != 0,
        enriched,
        hero: hero_from_row(row)?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl DiscoveryStore for SqliteStore {
    async fn find_by_canonical_url(
        &self,
        patch_id: &str,
        canonical_url: &str,
    ) -> StoreResult<Option<DiscoveredItem>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM discovered_content \
             WHERE patch_id = ? AND (canonical_url = ? OR url = ?) LIMIT 1"
        ))
        .bind(patch_id)
        .bind(canonical_url)
        .bind(canonical_url)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn create(&self, item: NewItem) -> StoreResult<DiscoveredItem> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let enriched_json = serde_json::to_string(&item.enriched)?;
        let hero = item.hero.as_ref();

        let result = sqlx::query(&format!(
            "INSERT INTO discovered_content ({ITEM_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&id)
        .bind(&item.patch_id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.canonical_url)
        .bind(&item.domain)
        .bind(&item.content)
        .bind(item.content_type.as_str())
        .bind(ItemStatus::Ready.as_str())
        .bind(item.relevance_score)
        .bind(item.quality_score)
        .bind(to_stored(item.sim_hash))
        .bind(i64::from(item.contested))
        .bind(&enriched_json)
        .bind(hero.map(|h| h.url.clone()))
        .bind(hero.map(|h| h.source.as_str()))
        .bind(hero.map(|h| i64::from(h.width)))
        .bind(hero.map(|h| i64::from(h.height)))
        .bind(hero.map(|h| h.alt.clone()))
        .bind(hero.and_then(|h| h.dominant_color.clone()))
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Duplicate {
                    canonical_url: item.canonical_url,
                });
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Stored item {id} for patch {}", item.patch_id);
        Ok(DiscoveredItem {
            id,
            patch_id: item.patch_id,
            title: item.title,
            url: item.url,
            canonical_url: item.canonical_url,
            domain: item.domain,
            content: item.content,
            content_type: item.content_type,
            status: ItemStatus::Ready,
            relevance_score: item.relevance_score,
            quality_score: item.quality_score,
            sim_hash: item.sim_hash,
            contested: item.contested,
            enriched: item.enriched,
            hero: item.hero,
            // Millisecond precision, same as a re-read row
            created_at: millis_to_datetime(created_at.timestamp_millis())?,
        })
    }

    async fn content_hashes(&self, patch_id: &str) -> StoreResult<Vec<u64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT sim_hash FROM discovered_content WHERE patch_id = ?")
                .bind(patch_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(h,)| from_stored(h)).collect())
    }

    async fn record_seen_url(&self, canonical_url: &str, domain: &str) -> StoreResult<()> {
        let now = Utc::now().timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO seen_urls (url, first_seen, last_seen, times_seen, domain)
            VALUES (?, ?, ?, 1, ?)
            ON CONFLICT(url) DO UPDATE SET
                last_seen = excluded.last_seen,
                times_seen = seen_urls.times_seen + 1
            "#,
        )
        .bind(canonical_url)
        .bind(now)
        .bind(now)
        .bind(domain)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn seen_url(&self, canonical_url: &str) -> StoreResult<Option<SeenUrl>> {
        let row: Option<(String, String, i64, i64, i64)> = sqlx::query_as(
            "SELECT url, domain, first_seen, last_seen, times_seen FROM seen_urls WHERE url = ?",
        )
        .bind(canonical_url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(url, domain, first, last, times)| {
            Ok(SeenUrl {
                url,
                domain,
                first_seen: millis_to_datetime(first)?,
                last_seen: millis_to_datetime(last)?,
                times_seen: times.max(0) as u64,
            })
        })
        .transpose()
    }

    async fn increment_save_counters(
        &self,
        patch_id: &str,
        controversy: bool,
        history: bool,
    ) -> StoreResult<SaveCounters> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO save_counters (patch_id, total, controversy, history)
            VALUES (?, 1, ?, ?)
            ON CONFLICT(patch_id) DO UPDATE SET
                total = save_counters.total + 1,
                controversy = save_counters.controversy + excluded.controversy,
                history = save_counters.history + excluded.history
            "#,
        )
        .bind(patch_id)
        .bind(i64::from(controversy))
        .bind(i64::from(history))
        .execute(&mut *tx)
        .await?;

        let (total, controversy, history): (i64, i64, i64) = sqlx::query_as(
            "SELECT total, controversy, history FROM save_counters WHERE patch_id = ?",
        )
        .bind(patch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SaveCounters {
            total: total.max(0) as u64,
            controversy: controversy.max(0) as u64,
            history: history.max(0) as u64,
        })
    }

    async fn save_counters(&self, patch_id: &str) -> StoreResult<SaveCounters> {
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            "SELECT total, controversy, history FROM save_counters WHERE patch_id = ?",
        )
        .bind(patch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|(total, controversy, history)| SaveCounters {
                total: total.max(0) as u64,
                controversy: controversy.max(0) as u64,
                history: history.max(0) as u64,
            })
            .unwrap_or_default())
    }

    async fn item_count(&self, patch_id: &str) -> StoreResult<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM discovered_content WHERE patch_id = ?")
                .bind(patch_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn skeleton_hero_items(&self, patch_id: &str, limit: usize) -> StoreResult<Vec<DiscoveredItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM discovered_content \
             WHERE patch_id = ? AND (hero_source IS NULL OR hero_source = 'skeleton') \
             ORDER BY created_at ASC LIMIT ?"
        ))
        .bind(patch_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn update_hero(&self, item_id: &str, hero: &HeroImageResult) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE discovered_content SET
                hero_url = ?, hero_source = ?, hero_width = ?, hero_height = ?,
                hero_alt = ?, hero_color = ?
            WHERE id = ?
            "#,
        )
        .bind(&hero.url)
        .bind(hero.source.as_str())
        .bind(i64::from(hero.width))
        .bind(i64::from(hero.height))
        .bind(&hero.alt)
        .bind(&hero.dominant_color)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(item_id.to_string()));
        }
        Ok(())
    }

    async fn update_status(&self, item_id: &str, status: ItemStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE discovered_content SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(item_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::skeleton_hero;
    use crate::vetting::Quote;
    use tempfile::TempDir;

    fn new_item(patch: &str, canonical: &str) -> NewItem {
        NewItem {
            patch_id: patch.to_string(),
            title: "Harbour festival returns".to_string(),
            url: format!("{canonical}?utm_source=x"),
            canonical_url: canonical.to_string(),
            domain: "news.example".to_string(),
            content: "Boats filled the bay.".to_string(),
            content_type: ContentType::Article,
            relevance_score: 0.8,
            quality_score: 0.7,
            sim_hash: u64::MAX - 5,
            contested: false,
            enriched: EnrichedContent {
                summary: "Boats filled the bay.".to_string(),
                key_points: vec!["Boats".to_string()],
                quotes: vec![Quote {
                    text: "Magical".to_string(),
                    speaker: None,
                    citation: None,
                }],
            },
            hero: Some(skeleton_hero("Harbour festival returns")),
        }
    }

    async fn open_temp() -> Result<(TempDir, SqliteStore)> {
        let dir = TempDir::new()?;
        let store = SqliteStore::open(&dir.path().join("discovery.sqlite")).await?;
        Ok((dir, store))
    }

    #[tokio::test]
    async fn create_and_read_back() -> Result<()> {
        let (_dir, store) = open_temp().await?;
        let created = store.create(new_item("p1", "https://news.example/a")).await?;

        let found = store
            .find_by_canonical_url("p1", "https://news.example/a")
            .await?
            .expect("item present");
        assert_eq!(found, created);
        assert_eq!(found.sim_hash, u64::MAX - 5);
        assert_eq!(store.item_count("p1").await?, 1);
        assert_eq!(store.content_hashes("p1").await?, vec![u64::MAX - 5]);
        assert!(store.find_by_canonical_url("p2", "https://news.example/a").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unique_per_patch() -> Result<()> {
        let (_dir, store) = open_temp().await?;
        store.create(new_item("p1", "https://news.example/a")).await?;
        let err = store
            .create(new_item("p1", "https://news.example/a"))
            .await
            .expect_err("second insert must fail");
        assert!(matches!(err, StoreError::Duplicate { .. }));
        store.create(new_item("p2", "https://news.example/a")).await?;
        Ok(())
    }

    #[tokio::test]
    async fn counters_accumulate() -> Result<()> {
        let (_dir, store) = open_temp().await?;
        store.increment_save_counters("p1", true, false).await?;
        store.increment_save_counters("p1", false, true).await?;
        let counters = store.increment_save_counters("p1", true, true).await?;
        assert_eq!(counters, SaveCounters { total: 3, controversy: 2, history: 2 });
        assert_eq!(store.save_counters("p1").await?, counters);
        assert_eq!(store.save_counters("other").await?, SaveCounters::default());
        Ok(())
    }

    #[tokio::test]
    async fn seen_urls_count_visits() -> Result<()> {
        let (_dir, store) = open_temp().await?;
        store.record_seen_url("https://news.example/a", "news.example").await?;
        store.record_seen_url("https://news.example/a", "news.example").await?;
        let seen = store.seen_url("https://news.example/a").await?.expect("recorded");
        assert_eq!(seen.times_seen, 2);
        assert_eq!(seen.domain, "news.example");
        assert!(seen.last_seen >= seen.first_seen);
        assert!(store.seen_url("https://news.example/b").await?.is_none());

        let ttl = chrono::Duration::days(30);
        assert!(seen.is_fresh(ttl, Utc::now()));
        assert!(!seen.is_fresh(ttl, seen.last_seen + chrono::Duration::days(31)));
        Ok(())
    }

    #[tokio::test]
    async fn hero_upgrade_leaves_skeleton_list() -> Result<()> {
        let (_dir, store) = open_temp().await?;
        let item = store.create(new_item("p1", "https://news.example/a")).await?;
        assert_eq!(store.skeleton_hero_items("p1", 10).await?.len(), 1);

        let upgraded = HeroImageResult {
            url: "https://img.example/h.png".to_string(),
            source: HeroSource::Ai,
            width: 1024,
            height: 1024,
            alt: "Harbour".to_string(),
            dominant_color: None,
        };
        store.update_hero(&item.id, &upgraded).await?;

        assert!(store.skeleton_hero_items("p1", 10).await?.is_empty());
        let reread = store.get(&item.id).await?.expect("item");
        assert_eq!(reread.hero, Some(upgraded));
        Ok(())
    }

    #[tokio::test]
    async fn status_update_of_missing_item() -> Result<()> {
        let (_dir, store) = open_temp().await?;
        let item = store.create(new_item("p1", "https://news.example/a")).await?;
        store.update_status(&item.id, ItemStatus::Hidden).await?;
        assert_eq!(store.get(&item.id).await?.map(|i| i.status), Some(ItemStatus::Hidden));
        assert!(matches!(
            store.update_status("missing", ItemStatus::Archived).await,
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }
}
