//! Settings for a single discovery run

use serde::{Deserialize, Serialize};

/// Everything a run needs beyond its collaborators.
///
/// Built through [`DiscoveryConfig::builder`]; `patch_id` and `topic` are
/// required, everything else has a default from `utils::constants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Crawl target the saved items belong to; also the dedup group
    pub(crate) patch_id: String,
    pub(crate) topic: String,
    /// Alternate names accepted by the entity-mention gate
    pub(crate) aliases: Vec<String>,

    pub(crate) max_items: usize,
    pub(crate) run_timeout_secs: u64,

    pub(crate) frontier_capacity: usize,
    pub(crate) novelty_weight: f64,
    pub(crate) penalty_weight: f64,
    pub(crate) diversity_weight: f64,
    pub(crate) page_size: u32,
    pub(crate) max_empty_yields: u32,
    pub(crate) priority_burst_size: usize,

    pub(crate) min_content_length: usize,
    pub(crate) min_relevance: f64,
    pub(crate) min_quality: f64,
    /// Floors used until the run saves its first item
    pub(crate) soft_min_relevance: f64,
    pub(crate) soft_min_quality: f64,

    pub(crate) fetch_timeout_secs: u64,
    pub(crate) canonicalize_timeout_secs: u64,
    pub(crate) hero_ai_timeout_secs: u64,
    pub(crate) vet_timeout_secs: u64,

    pub(crate) crawl_rate_rps: f64,
    pub(crate) circuit_breaker_enabled: bool,
    pub(crate) circuit_breaker_failure_threshold: u32,
    pub(crate) circuit_breaker_retry_delay_secs: u64,

    /// Entities preferred when choosing a Commons search term
    pub(crate) known_entities: Vec<String>,
    pub(crate) hero_style: String,
    pub(crate) user_agent: String,
}
