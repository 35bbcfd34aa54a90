//! Accessors for `DiscoveryConfig`

use std::time::Duration;

use super::types::DiscoveryConfig;
use crate::frontier::FrontierWeights;

impl DiscoveryConfig {
    #[must_use]
    pub fn patch_id(&self) -> &str {
        &self.patch_id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Topic followed by its aliases
    pub fn entity_terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.topic.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    #[must_use]
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    #[must_use]
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    #[must_use]
    pub fn frontier_capacity(&self) -> usize {
        self.frontier_capacity
    }

    #[must_use]
    pub fn frontier_weights(&self) -> FrontierWeights {
        FrontierWeights {
            novelty: self.novelty_weight,
            penalty: self.penalty_weight,
            diversity: self.diversity_weight,
        }
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn max_empty_yields(&self) -> u32 {
        self.max_empty_yields
    }

    #[must_use]
    pub fn priority_burst_size(&self) -> usize {
        self.priority_burst_size
    }

    #[must_use]
    pub fn min_content_length(&self) -> usize {
        self.min_content_length
    }

    #[must_use]
    pub fn min_relevance(&self) -> f64 {
        self.min_relevance
    }

    #[must_use]
    pub fn min_quality(&self) -> f64 {
        self.min_quality
    }

    #[must_use]
    pub fn soft_min_relevance(&self) -> f64 {
        self.soft_min_relevance
    }

    #[must_use]
    pub fn soft_min_quality(&self) -> f64 {
        self.soft_min_quality
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn canonicalize_timeout(&self) -> Duration {
        Duration::from_secs(self.canonicalize_timeout_secs)
    }

    #[must_use]
    pub fn hero_ai_timeout(&self) -> Duration {
        Duration::from_secs(self.hero_ai_timeout_secs)
    }

    #[must_use]
    pub fn vet_timeout(&self) -> Duration {
        Duration::from_secs(self.vet_timeout_secs)
    }

    #[must_use]
    pub fn crawl_rate_rps(&self) -> f64 {
        self.crawl_rate_rps
    }

    #[must_use]
    pub fn circuit_breaker_enabled(&self) -> bool {
        self.circuit_breaker_enabled
    }

    #[must_use]
    pub fn circuit_breaker_failure_threshold(&self) -> u32 {
        self.circuit_breaker_failure_threshold
    }

    #[must_use]
    pub fn circuit_breaker_retry_delay(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_retry_delay_secs)
    }

    #[must_use]
    pub fn known_entities(&self) -> &[String] {
        &self.known_entities
    }

    #[must_use]
    pub fn hero_style(&self) -> &str {
        &self.hero_style
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
