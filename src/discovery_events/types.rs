//! Event payloads emitted while a discovery run progresses
//!
//! Serialized as `{run_id, timestamp, type, data, message}`: the `type` tag
//! and `data` content come from [`EventKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dedup::{DeduplicationResult, DuplicateTier};
use crate::discovery_engine::{RunStatus, SkipReason};
use crate::frontier::CandidateSource;
use crate::hero::HeroImageResult;
use crate::store::{ContentType, DiscoveredItem, SaveCounters};

/// Reason for event bus shutdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownReason {
    RunFinished,
    Error(String),
    Cancelled,
}

/// Display payload of a saved item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCard {
    pub id: String,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub content_type: ContentType,
    pub relevance_score: f64,
    pub quality_score: f64,
    pub contested: bool,
    pub hero: Option<HeroImageResult>,
    pub created_at: DateTime<Utc>,
}

impl From<&DiscoveredItem> for ItemCard {
    fn from(item: &DiscoveredItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            url: item.url.clone(),
            domain: item.domain.clone(),
            summary: item.enriched.summary.clone(),
            key_points: item.enriched.key_points.clone(),
            content_type: item.content_type,
            relevance_score: item.relevance_score,
            quality_score: item.quality_score,
            contested: item.contested,
            hero: item.hero.clone(),
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    RunStarted {
        patch_id: String,
        topic: String,
        seeds: usize,
    },
    Searching {
        source: CandidateSource,
        query: String,
        cursor: String,
    },
    Vetting {
        url: String,
        title: String,
    },
    Hero {
        url: String,
        title: String,
    },
    Saved {
        card: ItemCard,
        counters: SaveCounters,
    },
    Skipped {
        url: String,
        reason: SkipReason,
        detail: String,
        /// Dedup tier, for `duplicate` skips
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tier: Option<DuplicateTier>,
        /// Id of the stored item this page duplicates
        #[serde(default, skip_serializing_if = "Option::is_none")]
        existing_item: Option<String>,
    },
    Error {
        url: Option<String>,
        detail: String,
    },
    /// Frontier and angles are both empty
    Idle,
    Expanded {
        angle: String,
        candidates: usize,
    },
    RunCompleted {
        status: RunStatus,
        items_saved: usize,
        duration_ms: u64,
    },
    /// Subscribers should exit their loops on this event
    Shutdown {
        reason: ShutdownReason,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryEvent {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
    pub message: String,
}

impl DiscoveryEvent {
    #[must_use]
    pub fn new(run_id: impl Into<String>, kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        }
    }

    /// The serialized `type` tag
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EventKind::RunStarted { .. } => "run_started",
            EventKind::Searching { .. } => "searching",
            EventKind::Vetting { .. } => "vetting",
            EventKind::Hero { .. } => "hero",
            EventKind::Saved { .. } => "saved",
            EventKind::Skipped { .. } => "skipped",
            EventKind::Error { .. } => "error",
            EventKind::Idle => "idle",
            EventKind::Expanded { .. } => "expanded",
            EventKind::RunCompleted { .. } => "run_completed",
            EventKind::Shutdown { .. } => "shutdown",
        }
    }

    /// Emitted when a run starts
    #[must_use]
    pub fn run_started(run_id: &str, patch_id: &str, topic: &str, seeds: usize) -> Self {
        Self::new(
            run_id,
            EventKind::RunStarted {
                patch_id: patch_id.to_string(),
                topic: topic.to_string(),
                seeds,
            },
            format!("Discovering '{topic}' from {seeds} seeds"),
        )
    }

    #[must_use]
    pub fn searching(run_id: &str, source: CandidateSource, query: &str, cursor: &str) -> Self {
        Self::new(
            run_id,
            EventKind::Searching {
                source,
                query: query.to_string(),
                cursor: cursor.to_string(),
            },
            format!("Searching {} for '{query}'", source.as_str()),
        )
    }

    #[must_use]
    pub fn vetting(run_id: &str, url: &str, title: &str) -> Self {
        Self::new(
            run_id,
            EventKind::Vetting {
                url: url.to_string(),
                title: title.to_string(),
            },
            format!("Vetting '{title}'"),
        )
    }

    #[must_use]
    pub fn hero(run_id: &str, url: &str, title: &str) -> Self {
        Self::new(
            run_id,
            EventKind::Hero {
                url: url.to_string(),
                title: title.to_string(),
            },
            format!("Finding a hero image for '{title}'"),
        )
    }

    #[must_use]
    pub fn saved(run_id: &str, item: &DiscoveredItem, counters: SaveCounters) -> Self {
        let card = ItemCard::from(item);
        let message = format!("Saved '{}' ({} total)", card.title, counters.total);
        Self::new(run_id, EventKind::Saved { card, counters }, message)
    }

    #[must_use]
    pub fn skipped(run_id: &str, url: &str, reason: SkipReason, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(
            run_id,
            EventKind::Skipped {
                url: url.to_string(),
                reason,
                detail: detail.clone(),
                tier: None,
                existing_item: None,
            },
            format!("Skipped {url}: {reason} ({detail})"),
        )
    }

    /// A `duplicate` skip carrying the dedup verdict.
    #[must_use]
    pub fn duplicate(run_id: &str, url: &str, result: &DeduplicationResult) -> Self {
        let message = match &result.existing_item {
            Some(id) => format!("Skipped {url}: duplicate of {id} ({})", result.reason),
            None => format!("Skipped {url}: duplicate ({})", result.reason),
        };
        Self::new(
            run_id,
            EventKind::Skipped {
                url: url.to_string(),
                reason: SkipReason::Duplicate,
                detail: result.reason.clone(),
                tier: result.tier,
                existing_item: result.existing_item.clone(),
            },
            message,
        )
    }

    #[must_use]
    pub fn error(run_id: &str, url: Option<&str>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let message = match url {
            Some(url) => format!("Error processing {url}: {detail}"),
            None => format!("Error: {detail}"),
        };
        Self::new(
            run_id,
            EventKind::Error {
                url: url.map(str::to_string),
                detail,
            },
            message,
        )
    }

    #[must_use]
    pub fn idle(run_id: &str) -> Self {
        Self::new(run_id, EventKind::Idle, "No candidates or angles left")
    }

    #[must_use]
    pub fn expanded(run_id: &str, angle: &str, candidates: usize) -> Self {
        Self::new(
            run_id,
            EventKind::Expanded {
                angle: angle.to_string(),
                candidates,
            },
            format!("Expanded search with angle '{angle}'"),
        )
    }

    #[must_use]
    pub fn run_completed(run_id: &str, status: RunStatus, items_saved: usize, duration_ms: u64) -> Self {
        Self::new(
            run_id,
            EventKind::RunCompleted {
                status,
                items_saved,
                duration_ms,
            },
            format!("Run {status} with {items_saved} items"),
        )
    }

    #[must_use]
    pub fn shutdown(reason: ShutdownReason) -> Self {
        Self::new(String::new(), EventKind::Shutdown { reason }, "Event bus shutting down")
    }
}
