use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which check caught the duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateTier {
    /// Canonical URL already seen
    A,
    /// SimHash of the body within the Hamming threshold
    B,
    /// Similar title on the same domain inside the tracking window
    C,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeduplicationResult {
    pub is_duplicate: bool,
    pub tier: Option<DuplicateTier>,
    pub reason: String,
    pub similarity: Option<f64>,
    /// Id of a persisted item this duplicates, when known
    pub existing_item: Option<String>,
}

impl DeduplicationResult {
    #[must_use]
    pub fn unique() -> Self {
        Self {
            is_duplicate: false,
            tier: None,
            reason: "unique".to_string(),
            similarity: None,
            existing_item: None,
        }
    }

    #[must_use]
    pub fn duplicate(tier: DuplicateTier, reason: impl Into<String>, similarity: Option<f64>) -> Self {
        Self {
            is_duplicate: true,
            tier: Some(tier),
            reason: reason.into(),
            similarity,
            existing_item: None,
        }
    }

    #[must_use]
    pub fn with_existing_item(mut self, id: impl Into<String>) -> Self {
        self.existing_item = Some(id.into());
        self
    }
}

/// One entry of a group's recent-title ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleEntry {
    pub title: String,
    pub domain: String,
    pub seen_at: DateTime<Utc>,
}

/// Everything recorded after a not-duplicate verdict
#[derive(Debug, Clone)]
pub struct Registration {
    pub canonical_url: String,
    /// `None` when the body had no tokens
    pub sim_hash: Option<u64>,
    pub title: TitleEntry,
}
