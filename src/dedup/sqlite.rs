//! Durable dedup state in SQLite
//!
//! Seen URLs, content hashes and recent titles survive restarts. Every row
//! carries an `expires_at` 30 days out; expired rows are ignored by reads and
//! removed by [`SqliteDedupState::prune_expired`]. Concurrent runs rely on
//! SQLite's upsert atomicity, nothing else.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;

use super::state::DedupState;
use super::types::{Registration, TitleEntry};
use crate::fingerprint::simhash::{from_stored, to_stored};
use crate::utils::{DURABLE_DEDUP_TTL_DAYS, RECENT_HASH_CAPACITY, RECENT_TITLE_CAPACITY};

const DEDUP_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS dedup_seen_urls (
    url TEXT PRIMARY KEY,
    expires_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS dedup_hashes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id TEXT NOT NULL,
    sim_hash INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dedup_hashes_group ON dedup_hashes(group_id, id);

CREATE TABLE IF NOT EXISTS dedup_titles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id TEXT NOT NULL,
    title TEXT NOT NULL,
    domain TEXT NOT NULL,
    seen_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dedup_titles_group ON dedup_titles(group_id, id);
"#;

#[derive(Clone)]
pub struct SqliteDedupState {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqliteDedupState {
    /// Open (or create) the dedup tables in the database at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = crate::store::open_pool(db_path).await?;
        Self::from_pool(pool).await
    }

    /// Share an existing pool, e.g. the store's.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(DEDUP_SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("Failed to initialize dedup schema")?;

        let state = Self {
            pool,
            ttl: Duration::days(DURABLE_DEDUP_TTL_DAYS),
        };
        let pruned = state.prune_expired().await?;
        if pruned > 0 {
            log::debug!("Pruned {pruned} expired dedup rows");
        }
        Ok(state)
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Delete expired rows from all dedup tables. Returns rows removed.
    pub async fn prune_expired(&self) -> Result<u64> {
        let now = Utc::now().timestamp();
        let mut removed = 0;
        for table in ["dedup_seen_urls", "dedup_hashes", "dedup_titles"] {
            let result = sqlx::query(&format!("DELETE FROM {table} WHERE expires_at <= ?"))
                .bind(now)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to prune {table}"))?;
            removed += result.rows_affected();
        }
        Ok(removed)
    }
}

#[async_trait]
impl DedupState for SqliteDedupState {
    async fn is_url_seen(&self, canonical_url: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM dedup_seen_urls WHERE url = ? AND expires_at > ?")
                .bind(canonical_url)
                .bind(Utc::now().timestamp())
                .fetch_optional(&self.pool)
                .await
                .context("Failed to query seen URL")?;
        Ok(row.is_some())
    }

    async fn recent_hashes(&self, group_id: &str) -> Result<Vec<u64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT sim_hash FROM dedup_hashes
            WHERE group_id = ? AND expires_at > ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(group_id)
        .bind(Utc::now().timestamp())
        .bind(RECENT_HASH_CAPACITY as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query recent hashes")?;

        Ok(rows.into_iter().map(|(h,)| from_stored(h)).collect())
    }

    async fn recent_titles(
        &self,
        group_id: &str,
        domain: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TitleEntry>> {
        // The ring is the group's last N titles; domain and window filter after
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT title, domain, seen_at FROM (
                SELECT title, domain, seen_at FROM dedup_titles
                WHERE group_id = ? AND expires_at > ?
                ORDER BY id DESC
                LIMIT ?
            )
            WHERE domain = ? AND seen_at >= ?
            "#,
        )
        .bind(group_id)
        .bind(Utc::now().timestamp())
        .bind(RECENT_TITLE_CAPACITY as i64)
        .bind(domain)
        .bind(since.timestamp())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query recent titles")?;

        Ok(rows
            .into_iter()
            .map(|(title, domain, seen_at)| TitleEntry {
                title,
                domain,
                seen_at: Utc.timestamp_opt(seen_at, 0).single().unwrap_or_else(Utc::now),
            })
            .collect())
    }

    async fn register(&self, group_id: &str, registration: Registration) -> Result<()> {
        let expires_at = (Utc::now() + self.ttl).timestamp();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO dedup_seen_urls (url, expires_at) VALUES (?, ?)
            ON CONFLICT(url) DO UPDATE SET expires_at = excluded.expires_at
            "#,
        )
        .bind(&registration.canonical_url)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .context("Failed to upsert seen URL")?;

        if let Some(hash) = registration.sim_hash {
            sqlx::query("INSERT INTO dedup_hashes (group_id, sim_hash, expires_at) VALUES (?, ?, ?)")
                .bind(group_id)
                .bind(to_stored(hash))
                .bind(expires_at)
                .execute(&mut *tx)
                .await
                .context("Failed to insert content hash")?;
        }

        sqlx::query(
            "INSERT INTO dedup_titles (group_id, title, domain, seen_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(group_id)
        .bind(&registration.title.title)
        .bind(&registration.title.domain)
        .bind(registration.title.seen_at.timestamp())
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .context("Failed to insert title")?;

        tx.commit().await.context("Failed to commit dedup registration")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registration(url: &str, hash: u64) -> Registration {
        Registration {
            canonical_url: url.to_string(),
            sim_hash: Some(hash),
            title: TitleEntry {
                title: "Harbour bridge reopens after repairs".to_string(),
                domain: "news.example".to_string(),
                seen_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn survives_reopen() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db = temp_dir.path().join("dedup.sqlite");

        {
            let state = SqliteDedupState::open(&db).await?;
            state.register("patch-1", registration("https://news.example/a", u64::MAX)).await?;
        }

        let reopened = SqliteDedupState::open(&db).await?;
        assert!(reopened.is_url_seen("https://news.example/a").await?);
        assert_eq!(reopened.recent_hashes("patch-1").await?, vec![u64::MAX]);
        let titles = reopened
            .recent_titles("patch-1", "news.example", Utc::now() - Duration::days(1))
            .await?;
        assert_eq!(titles.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn expired_rows_are_invisible_and_pruned() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let state = SqliteDedupState::open(&temp_dir.path().join("dedup.sqlite"))
            .await?
            .with_ttl(Duration::seconds(-1));

        state.register("patch-1", registration("https://news.example/old", 42)).await?;
        assert!(!state.is_url_seen("https://news.example/old").await?);
        assert!(state.recent_hashes("patch-1").await?.is_empty());
        assert_eq!(state.prune_expired().await?, 3);
        Ok(())
    }
}
