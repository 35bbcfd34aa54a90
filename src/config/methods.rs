//! Builder setters available in every state

use super::builder::DiscoveryConfigBuilder;

impl<State> DiscoveryConfigBuilder<State> {
    #[must_use]
    pub fn aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    #[must_use]
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    #[must_use]
    pub fn run_timeout_secs(mut self, secs: u64) -> Self {
        self.run_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn frontier_capacity(mut self, capacity: usize) -> Self {
        self.frontier_capacity = capacity;
        self
    }

    /// Weights of the frontier priority formula
    /// `novelty·n − penalty·duplicate_rate + diversity·d`.
    #[must_use]
    pub fn frontier_weights(mut self, novelty: f64, penalty: f64, diversity: f64) -> Self {
        self.novelty_weight = novelty;
        self.penalty_weight = penalty;
        self.diversity_weight = diversity;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn max_empty_yields(mut self, max: u32) -> Self {
        self.max_empty_yields = max;
        self
    }

    /// Direct candidates fetched together at run start. 0 disables the burst.
    #[must_use]
    pub fn priority_burst_size(mut self, size: usize) -> Self {
        self.priority_burst_size = size;
        self
    }

    #[must_use]
    pub fn min_content_length(mut self, chars: usize) -> Self {
        self.min_content_length = chars;
        self
    }

    #[must_use]
    pub fn thresholds(mut self, min_relevance: f64, min_quality: f64) -> Self {
        self.min_relevance = min_relevance;
        self.min_quality = min_quality;
        self
    }

    /// Floors applied only until the first item of the run is saved
    #[must_use]
    pub fn soft_thresholds(mut self, min_relevance: f64, min_quality: f64) -> Self {
        self.soft_min_relevance = min_relevance;
        self.soft_min_quality = min_quality;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn canonicalize_timeout_secs(mut self, secs: u64) -> Self {
        self.canonicalize_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn hero_ai_timeout_secs(mut self, secs: u64) -> Self {
        self.hero_ai_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn vet_timeout_secs(mut self, secs: u64) -> Self {
        self.vet_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn crawl_rate_rps(mut self, rps: f64) -> Self {
        self.crawl_rate_rps = rps;
        self
    }

    /// Enable or disable the per-domain circuit breaker
    #[must_use]
    pub fn circuit_breaker(mut self, enabled: bool) -> Self {
        self.circuit_breaker_enabled = enabled;
        self
    }

    #[must_use]
    pub fn circuit_breaker_failure_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker_failure_threshold = threshold;
        self
    }

    #[must_use]
    pub fn circuit_breaker_retry_delay_secs(mut self, secs: u64) -> Self {
        self.circuit_breaker_retry_delay_secs = secs;
        self
    }

    #[must_use]
    pub fn known_entities(mut self, entities: Vec<String>) -> Self {
        self.known_entities = entities;
        self
    }

    #[must_use]
    pub fn hero_style(mut self, style: impl Into<String>) -> Self {
        self.hero_style = style.into();
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
