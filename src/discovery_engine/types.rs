//! Run plans, outcomes and skip classification

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use super::errors::DiscoveryError;
use crate::config::DiscoveryConfig;
use crate::frontier::SearchCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    /// Max items reached or the run deadline passed
    Completed,
    /// Frontier and angles ran dry
    Exhausted,
    Stopped,
    /// Setup failed before any candidate was processed
    #[serde(rename = "error", alias = "failed")]
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
            Self::Stopped => "stopped",
            Self::Failed => "error",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a URL did not become an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Duplicate,
    ContentTooShort,
    EntityMissing,
    NearDuplicate,
    VetterRejected,
    VetterInsufficientFacts,
    LowRelevance,
    ProcessingError,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::ContentTooShort => "content_too_short",
            Self::EntityMissing => "entity_missing",
            Self::NearDuplicate => "near_duplicate",
            Self::VetterRejected => "vetter_rejected",
            Self::VetterInsufficientFacts => "vetter_insufficient_facts",
            Self::LowRelevance => "low_relevance",
            Self::ProcessingError => "processing_error",
        }
    }

    /// Whether the skip is remembered in the seen-URL table.
    ///
    /// Length and entity gates depend on the run's settings and processing
    /// errors may be transient, so those URLs stay eligible for later runs.
    #[must_use]
    pub fn is_lasting(&self) -> bool {
        !matches!(
            self,
            Self::ContentTooShort | Self::EntityMissing | Self::ProcessingError
        )
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to discover and where to start looking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    pub config: DiscoveryConfig,
    pub seeds: Vec<SearchCandidate>,
    /// Expansion angles, each turned into `"{topic} {angle}"` searches once
    /// the frontier runs dry
    #[serde(default)]
    pub angles: Vec<String>,
}

impl RunPlan {
    #[must_use]
    pub fn new(config: DiscoveryConfig, seeds: Vec<SearchCandidate>) -> Self {
        Self {
            config,
            seeds,
            angles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_angles(mut self, angles: Vec<String>) -> Self {
        self.angles = angles;
        self
    }

    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.config.topic().trim().is_empty() {
            return Err(DiscoveryError::InvalidPlan("topic is empty".to_string()));
        }
        let has_angle = self.angles.iter().any(|a| !a.trim().is_empty());
        if self.seeds.is_empty() && !has_angle {
            return Err(DiscoveryError::InvalidPlan(
                "plan needs at least one seed or angle".to_string(),
            ));
        }
        if let Some(bad) = self.seeds.iter().find(|s| s.cursor.trim().is_empty()) {
            return Err(DiscoveryError::InvalidPlan(format!(
                "seed for '{}' has an empty cursor",
                bad.query
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub patch_id: String,
    pub status: RunStatus,
    pub items_saved: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub candidates_processed: usize,
    pub urls_processed: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    #[must_use]
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Cooperative cancellation flag shared between a run and its owner
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DiscoveryConfig {
        DiscoveryConfig::builder()
            .patch_id("p")
            .topic("Example")
            .build()
            .unwrap()
    }

    #[test]
    fn plan_without_seeds_or_angles_is_invalid() {
        let plan = RunPlan::new(config(), Vec::new());
        assert!(matches!(plan.validate(), Err(DiscoveryError::InvalidPlan(_))));

        let plan = RunPlan::new(config(), Vec::new()).with_angles(vec!["history".into()]);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn skip_reasons_serialize_snake_case() {
        let json = serde_json::to_string(&SkipReason::VetterInsufficientFacts).unwrap();
        assert_eq!(json, "\"vetter_insufficient_facts\"");
        assert_eq!(SkipReason::ContentTooShort.to_string(), "content_too_short");
    }

    #[test]
    fn only_content_verdicts_are_lasting() {
        assert!(SkipReason::Duplicate.is_lasting());
        assert!(SkipReason::VetterRejected.is_lasting());
        assert!(!SkipReason::EntityMissing.is_lasting());
        assert!(!SkipReason::ProcessingError.is_lasting());
    }

    #[test]
    fn failed_runs_surface_as_error() {
        assert_eq!(serde_json::to_string(&RunStatus::Failed).unwrap(), "\"error\"");
        assert_eq!(RunStatus::Failed.to_string(), "error");
        let legacy: RunStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(legacy, RunStatus::Failed);
    }

    #[test]
    fn stop_handle_is_shared() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        clone.stop();
        assert!(handle.is_stopped());
    }
}
