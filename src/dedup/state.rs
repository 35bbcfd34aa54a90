//! Storage seam for deduplication state
//!
//! The checker's tier logic only talks to [`DedupState`]. The in-memory
//! implementation below is owned by a single run; `SqliteDedupState` keeps the
//! same data across restarts with a TTL.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::types::{Registration, TitleEntry};
use crate::utils::{RECENT_HASH_CAPACITY, RECENT_TITLE_CAPACITY};

#[async_trait]
pub trait DedupState: Send + Sync {
    /// Seen-URL membership is global across groups.
    async fn is_url_seen(&self, canonical_url: &str) -> Result<bool>;

    /// Most recent content hashes recorded for the group.
    async fn recent_hashes(&self, group_id: &str) -> Result<Vec<u64>>;

    /// Recent titles of the group from `domain`, seen at or after `since`.
    async fn recent_titles(
        &self,
        group_id: &str,
        domain: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TitleEntry>>;

    async fn register(&self, group_id: &str, registration: Registration) -> Result<()>;
}

#[derive(Debug, Default)]
struct GroupRings {
    hashes: VecDeque<u64>,
    titles: VecDeque<TitleEntry>,
}

/// Bounded FIFO rings per group plus a global seen-URL set
#[derive(Debug)]
pub struct MemoryDedupState {
    seen_urls: Mutex<HashSet<String>>,
    groups: Mutex<HashMap<String, GroupRings>>,
    hash_capacity: usize,
    title_capacity: usize,
}

impl MemoryDedupState {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(RECENT_HASH_CAPACITY, RECENT_TITLE_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(hash_capacity: usize, title_capacity: usize) -> Self {
        Self {
            seen_urls: Mutex::new(HashSet::new()),
            groups: Mutex::new(HashMap::new()),
            hash_capacity: hash_capacity.max(1),
            title_capacity: title_capacity.max(1),
        }
    }

    /// Number of hashes currently held for a group.
    pub async fn hash_count(&self, group_id: &str) -> usize {
        let groups = self.groups.lock().await;
        groups.get(group_id).map_or(0, |g| g.hashes.len())
    }

    pub async fn title_count(&self, group_id: &str) -> usize {
        let groups = self.groups.lock().await;
        groups.get(group_id).map_or(0, |g| g.titles.len())
    }
}

impl Default for MemoryDedupState {
    fn default() -> Self {
        Self::new()
    }
}

/// Lets a run pick its backend at runtime as `Arc<dyn DedupState>`.
#[async_trait]
impl<T: DedupState + ?Sized> DedupState for std::sync::Arc<T> {
    async fn is_url_seen(&self, canonical_url: &str) -> Result<bool> {
        (**self).is_url_seen(canonical_url).await
    }

    async fn recent_hashes(&self, group_id: &str) -> Result<Vec<u64>> {
        (**self).recent_hashes(group_id).await
    }

    async fn recent_titles(
        &self,
        group_id: &str,
        domain: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TitleEntry>> {
        (**self).recent_titles(group_id, domain, since).await
    }

    async fn register(&self, group_id: &str, registration: Registration) -> Result<()> {
        (**self).register(group_id, registration).await
    }
}

#[async_trait]
impl DedupState for MemoryDedupState {
    async fn is_url_seen(&self, canonical_url: &str) -> Result<bool> {
        Ok(self.seen_urls.lock().await.contains(canonical_url))
    }

    async fn recent_hashes(&self, group_id: &str) -> Result<Vec<u64>> {
        let groups = self.groups.lock().await;
        Ok(groups
            .get(group_id)
            .map(|g| g.hashes.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn recent_titles(
        &self,
        group_id: &str,
        domain: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TitleEntry>> {
        let groups = self.groups.lock().await;
        Ok(groups
            .get(group_id)
            .map(|g| {
                g.titles
                    .iter()
                    .filter(|t| t.domain == domain && t.seen_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn register(&self, group_id: &str, registration: Registration) -> Result<()> {
        self.seen_urls
            .lock()
            .await
            .insert(registration.canonical_url);

        let mut groups = self.groups.lock().await;
        let rings = groups.entry(group_id.to_string()).or_default();

        if let Some(hash) = registration.sim_hash {
            rings.hashes.push_back(hash);
            while rings.hashes.len() > self.hash_capacity {
                rings.hashes.pop_front();
            }
        }

        rings.titles.push_back(registration.title);
        while rings.titles.len() > self.title_capacity {
            rings.titles.pop_front();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(url: &str, hash: u64, title: &str) -> Registration {
        Registration {
            canonical_url: url.to_string(),
            sim_hash: Some(hash),
            title: TitleEntry {
                title: title.to_string(),
                domain: "example.com".to_string(),
                seen_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn rings_evict_oldest_first() -> Result<()> {
        let state = MemoryDedupState::with_capacity(2, 2);
        for i in 0..3u64 {
            state
                .register("g", registration(&format!("https://e.com/{i}"), i, &format!("t{i}")))
                .await?;
        }
        assert_eq!(state.recent_hashes("g").await?, vec![1, 2]);
        assert_eq!(state.title_count("g").await, 2);
        // URL set is not a ring
        assert!(state.is_url_seen("https://e.com/0").await?);
        Ok(())
    }

    #[tokio::test]
    async fn groups_are_isolated_but_urls_are_global() -> Result<()> {
        let state = MemoryDedupState::new();
        state.register("a", registration("https://e.com/x", 7, "x")).await?;
        assert!(state.recent_hashes("b").await?.is_empty());
        assert!(state.is_url_seen("https://e.com/x").await?);
        Ok(())
    }
}
