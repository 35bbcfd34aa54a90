//! Typestate builder for `DiscoveryConfig`
//!
//! `patch_id` then `topic` must be set before `build()` exists.

use std::marker::PhantomData;

use anyhow::{Result, bail};

use super::types::DiscoveryConfig;
use crate::utils::{
    DEFAULT_CANONICALIZE_TIMEOUT_SECS, DEFAULT_CIRCUIT_BREAKER_RETRY_SECS,
    DEFAULT_CIRCUIT_BREAKER_THRESHOLD, DEFAULT_CRAWL_RATE_RPS, DEFAULT_DIVERSITY_WEIGHT,
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FRONTIER_CAPACITY, DEFAULT_HERO_AI_TIMEOUT_SECS,
    DEFAULT_MAX_EMPTY_YIELDS, DEFAULT_MAX_ITEMS, DEFAULT_MIN_CONTENT_LENGTH, DEFAULT_MIN_QUALITY,
    DEFAULT_MIN_RELEVANCE, DEFAULT_NOVELTY_WEIGHT, DEFAULT_PAGE_SIZE, DEFAULT_PENALTY_WEIGHT,
    DEFAULT_PRIORITY_BURST_SIZE, DEFAULT_RUN_TIMEOUT_SECS, DEFAULT_SOFT_MIN_QUALITY,
    DEFAULT_SOFT_MIN_RELEVANCE, DEFAULT_VET_TIMEOUT_SECS, USER_AGENT,
};

// Type states for the builder
pub struct WithPatchId;
pub struct Complete;

pub struct DiscoveryConfigBuilder<State = ()> {
    pub(crate) patch_id: Option<String>,
    pub(crate) topic: Option<String>,
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
    pub(crate) known_entities: Vec<String>,
    pub(crate) hero_style: String,
    pub(crate) user_agent: String,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for DiscoveryConfigBuilder<()> {
    fn default() -> Self {
        Self {
            patch_id: None,
            topic: None,
            aliases: Vec::new(),
            max_items: DEFAULT_MAX_ITEMS,
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
            novelty_weight: DEFAULT_NOVELTY_WEIGHT,
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
            diversity_weight: DEFAULT_DIVERSITY_WEIGHT,
            page_size: DEFAULT_PAGE_SIZE,
            max_empty_yields: DEFAULT_MAX_EMPTY_YIELDS,
            priority_burst_size: DEFAULT_PRIORITY_BURST_SIZE,
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            min_relevance: DEFAULT_MIN_RELEVANCE,
            min_quality: DEFAULT_MIN_QUALITY,
            soft_min_relevance: DEFAULT_SOFT_MIN_RELEVANCE,
            soft_min_quality: DEFAULT_SOFT_MIN_QUALITY,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            canonicalize_timeout_secs: DEFAULT_CANONICALIZE_TIMEOUT_SECS,
            hero_ai_timeout_secs: DEFAULT_HERO_AI_TIMEOUT_SECS,
            vet_timeout_secs: DEFAULT_VET_TIMEOUT_SECS,
            crawl_rate_rps: DEFAULT_CRAWL_RATE_RPS,
            circuit_breaker_enabled: true,
            circuit_breaker_failure_threshold: DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            circuit_breaker_retry_delay_secs: DEFAULT_CIRCUIT_BREAKER_RETRY_SECS,
            known_entities: Vec::new(),
            hero_style: "editorial".to_string(),
            user_agent: USER_AGENT.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl DiscoveryConfig {
    /// Create a builder for configuring a `DiscoveryConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> DiscoveryConfigBuilder<()> {
        DiscoveryConfigBuilder::default()
    }
}

impl<State> DiscoveryConfigBuilder<State> {
    /// Same settings, next state.
    fn advance<Next>(self) -> DiscoveryConfigBuilder<Next> {
        DiscoveryConfigBuilder {
            patch_id: self.patch_id,
            topic: self.topic,
            aliases: self.aliases,
            max_items: self.max_items,
            run_timeout_secs: self.run_timeout_secs,
            frontier_capacity: self.frontier_capacity,
            novelty_weight: self.novelty_weight,
            penalty_weight: self.penalty_weight,
            diversity_weight: self.diversity_weight,
            page_size: self.page_size,
            max_empty_yields: self.max_empty_yields,
            priority_burst_size: self.priority_burst_size,
            min_content_length: self.min_content_length,
            min_relevance: self.min_relevance,
            min_quality: self.min_quality,
            soft_min_relevance: self.soft_min_relevance,
            soft_min_quality: self.soft_min_quality,
            fetch_timeout_secs: self.fetch_timeout_secs,
            canonicalize_timeout_secs: self.canonicalize_timeout_secs,
            hero_ai_timeout_secs: self.hero_ai_timeout_secs,
            vet_timeout_secs: self.vet_timeout_secs,
            crawl_rate_rps: self.crawl_rate_rps,
            circuit_breaker_enabled: self.circuit_breaker_enabled,
            circuit_breaker_failure_threshold: self.circuit_breaker_failure_threshold,
            circuit_breaker_retry_delay_secs: self.circuit_breaker_retry_delay_secs,
            known_entities: self.known_entities,
            hero_style: self.hero_style,
            user_agent: self.user_agent,
            _phantom: PhantomData,
        }
    }
}

impl DiscoveryConfigBuilder<()> {
    pub fn patch_id(mut self, patch_id: impl Into<String>) -> DiscoveryConfigBuilder<WithPatchId> {
        self.patch_id = Some(patch_id.into().trim().to_string());
        self.advance()
    }
}

impl DiscoveryConfigBuilder<WithPatchId> {
    pub fn topic(mut self, topic: impl Into<String>) -> DiscoveryConfigBuilder<Complete> {
        self.topic = Some(topic.into().trim().to_string());
        self.advance()
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{name} must be within 0.0..=1.0, got {value}");
    }
    Ok(())
}

// Build method only available when all required fields are set
impl DiscoveryConfigBuilder<Complete> {
    pub fn build(self) -> Result<DiscoveryConfig> {
        let patch_id = self.patch_id.unwrap_or_default();
        let topic = self.topic.unwrap_or_default();
        if patch_id.is_empty() {
            bail!("patch_id must not be empty");
        }
        if topic.is_empty() {
            bail!("topic must not be empty");
        }

        for (name, value) in [
            ("min_relevance", self.min_relevance),
            ("min_quality", self.min_quality),
            ("soft_min_relevance", self.soft_min_relevance),
            ("soft_min_quality", self.soft_min_quality),
        ] {
            check_unit_interval(name, value)?;
        }
        if self.soft_min_relevance > self.min_relevance || self.soft_min_quality > self.min_quality {
            bail!("soft thresholds must not exceed the regular thresholds");
        }
        if [self.novelty_weight, self.penalty_weight, self.diversity_weight]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            bail!("frontier weights must be finite and non-negative");
        }
        if !(self.crawl_rate_rps.is_finite() && self.crawl_rate_rps > 0.0) {
            bail!("crawl_rate_rps must be positive, got {}", self.crawl_rate_rps);
        }
        if self.max_items == 0 {
            bail!("max_items must be at least 1");
        }
        if self.frontier_capacity == 0 {
            bail!("frontier_capacity must be at least 1");
        }

        Ok(DiscoveryConfig {
            patch_id,
            topic,
            aliases: self
                .aliases
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            max_items: self.max_items,
            run_timeout_secs: self.run_timeout_secs,
            frontier_capacity: self.frontier_capacity,
            novelty_weight: self.novelty_weight,
            penalty_weight: self.penalty_weight,
            diversity_weight: self.diversity_weight,
            page_size: self.page_size.max(1),
            max_empty_yields: self.max_empty_yields.max(1),
            priority_burst_size: self.priority_burst_size,
            min_content_length: self.min_content_length,
            min_relevance: self.min_relevance,
            min_quality: self.min_quality,
            soft_min_relevance: self.soft_min_relevance,
            soft_min_quality: self.soft_min_quality,
            fetch_timeout_secs: self.fetch_timeout_secs,
            canonicalize_timeout_secs: self.canonicalize_timeout_secs,
            hero_ai_timeout_secs: self.hero_ai_timeout_secs,
            vet_timeout_secs: self.vet_timeout_secs,
            crawl_rate_rps: self.crawl_rate_rps,
            circuit_breaker_enabled: self.circuit_breaker_enabled,
            circuit_breaker_failure_threshold: self.circuit_breaker_failure_threshold.max(1),
            circuit_breaker_retry_delay_secs: self.circuit_breaker_retry_delay_secs,
            known_entities: self.known_entities,
            hero_style: self.hero_style,
            user_agent: self.user_agent,
        })
    }
}
