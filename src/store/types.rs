use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::frontier::CandidateSource;
use crate::hero::HeroImageResult;
use crate::vetting::Quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Article,
    Reference,
    Paper,
}

impl ContentType {
    #[must_use]
    pub fn for_source(source: CandidateSource) -> Self {
        match source {
            CandidateSource::Wikipedia => Self::Reference,
            CandidateSource::Arxiv => Self::Paper,
            CandidateSource::News | CandidateSource::Rss | CandidateSource::Direct => Self::Article,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Reference => "reference",
            Self::Paper => "paper",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "article" => Some(Self::Article),
            "reference" => Some(Self::Reference),
            "paper" => Some(Self::Paper),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Ready,
    Hidden,
    Archived,
}

impl ItemStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Hidden => "hidden",
            Self::Archived => "archived",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ready" => Some(Self::Ready),
            "hidden" => Some(Self::Hidden),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedContent {
    pub summary: String,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
}

/// Accepted content, ready to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub patch_id: String,
    pub title: String,
    pub url: String,
    pub canonical_url: String,
    pub domain: String,
    pub content: String,
    pub content_type: ContentType,
    pub relevance_score: f64,
    pub quality_score: f64,
    pub sim_hash: u64,
    pub contested: bool,
    pub enriched: EnrichedContent,
    pub hero: Option<HeroImageResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredItem {
    pub id: String,
    pub patch_id: String,
    pub title: String,
    pub url: String,
    pub canonical_url: String,
    pub domain: String,
    pub content: String,
    pub content_type: ContentType,
    pub status: ItemStatus,
    pub relevance_score: f64,
    pub quality_score: f64,
    pub sim_hash: u64,
    pub contested: bool,
    pub enriched: EnrichedContent,
    pub hero: Option<HeroImageResult>,
    pub created_at: DateTime<Utc>,
}

/// Per-patch totals, bumped on every save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveCounters {
    pub total: u64,
    pub controversy: u64,
    pub history: u64,
}

/// Row of the cross-run seen-URL table, keyed by canonical URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenUrl {
    pub url: String,
    pub domain: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub times_seen: u64,
}

impl SeenUrl {
    /// Last sighting is no older than `ttl`.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_seen <= ttl
    }
}
