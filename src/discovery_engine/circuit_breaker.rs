//! Per-domain circuit breaker
//!
//! A domain whose fetches keep failing is skipped until a cooldown passes,
//! then probed again:
//! - Closed: fetches proceed
//! - Open: fetches are skipped
//! - `HalfOpen`: cooldown elapsed, fetches proceed until one succeeds or fails

use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::{debug, info, warn};

use crate::config::DiscoveryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

#[derive(Debug, Clone)]
pub struct DomainHealth {
    pub consecutive_failures: u32,
    pub total_attempts: u32,
    pub total_successes: u32,
    /// When the circuit last opened; the cooldown runs from here
    pub opened_at: Option<Instant>,
    pub state: CircuitState,
}

impl Default for DomainHealth {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            total_attempts: 0,
            total_successes: 0,
            opened_at: None,
            state: CircuitState::Closed,
        }
    }
}

pub struct CircuitBreaker {
    domains: DashMap<String, DomainHealth>,
    failure_threshold: u32,
    retry_delay: Duration,
    enabled: bool,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, retry_delay: Duration) -> Self {
        Self {
            domains: DashMap::new(),
            failure_threshold: failure_threshold.max(1),
            retry_delay,
            enabled: true,
        }
    }

    #[must_use]
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        let mut breaker = Self::new(
            config.circuit_breaker_failure_threshold(),
            config.circuit_breaker_retry_delay(),
        );
        breaker.enabled = config.circuit_breaker_enabled();
        breaker
    }

    /// Whether a fetch to `domain` should go ahead.
    pub fn should_attempt(&self, domain: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let Some(mut health) = self.domains.get_mut(domain) else {
            return true;
        };

        match health.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled = health
                    .opened_at
                    .is_some_and(|opened| opened.elapsed() >= self.retry_delay);
                if cooled {
                    health.state = CircuitState::HalfOpen;
                    info!("Circuit half-open for {domain}, probing again");
                }
                cooled
            }
        }
    }

    pub fn record_success(&self, domain: &str) {
        if !self.enabled {
            return;
        }
        let mut health = self.domains.entry(domain.to_string()).or_default();
        health.consecutive_failures = 0;
        health.total_attempts += 1;
        health.total_successes += 1;
        if health.state != CircuitState::Closed {
            health.state = CircuitState::Closed;
            health.opened_at = None;
            info!("Circuit closed for {domain}");
        }
    }

    pub fn record_failure(&self, domain: &str, error: &str) {
        if !self.enabled {
            return;
        }
        let mut health = self.domains.entry(domain.to_string()).or_default();
        health.consecutive_failures += 1;
        health.total_attempts += 1;

        let reopen = health.state == CircuitState::HalfOpen;
        if reopen || (health.state == CircuitState::Closed
            && health.consecutive_failures >= self.failure_threshold)
        {
            health.state = CircuitState::Open;
            health.opened_at = Some(Instant::now());
            warn!(
                "Circuit open for {domain} after {} consecutive failures: {error}",
                health.consecutive_failures
            );
        } else {
            debug!(
                "Fetch failure for {domain} ({}/{}): {error}",
                health.consecutive_failures, self.failure_threshold
            );
        }
    }

    #[must_use]
    pub fn get_health(&self, domain: &str) -> Option<DomainHealth> {
        self.domains.get(domain).map(|h| h.value().clone())
    }

    #[must_use]
    pub fn open_domains(&self) -> Vec<String> {
        self.domains
            .iter()
            .filter(|entry| entry.value().state == CircuitState::Open)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_closed_on_success() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        assert!(cb.should_attempt("example.com"));
        cb.record_success("example.com");

        let health = cb.get_health("example.com").unwrap();
        assert_eq!(health.state, CircuitState::Closed);
        assert_eq!(health.total_successes, 1);
    }

    #[test]
    fn opens_after_threshold() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            cb.record_failure("example.com", "timeout");
            assert!(cb.should_attempt("example.com"));
        }
        cb.record_failure("example.com", "timeout");

        assert!(!cb.should_attempt("example.com"));
        assert_eq!(cb.open_domains(), vec!["example.com".to_string()]);
        assert!(cb.should_attempt("other.org"));
    }

    #[test]
    fn half_open_after_cooldown_then_closes() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(50));
        cb.record_failure("example.com", "503");
        assert!(!cb.should_attempt("example.com"));

        std::thread::sleep(Duration::from_millis(80));
        assert!(cb.should_attempt("example.com"));
        assert_eq!(cb.get_health("example.com").unwrap().state, CircuitState::HalfOpen);

        cb.record_success("example.com");
        assert_eq!(cb.get_health("example.com").unwrap().state, CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let cb = CircuitBreaker::new(2, Duration::from_millis(20));
        cb.record_failure("example.com", "e");
        cb.record_failure("example.com", "e");
        std::thread::sleep(Duration::from_millis(40));
        assert!(cb.should_attempt("example.com"));

        cb.record_failure("example.com", "still down");
        assert!(!cb.should_attempt("example.com"));
    }

    #[test]
    fn disabled_breaker_always_allows() {
        let config = DiscoveryConfig::builder()
            .patch_id("p")
            .topic("t")
            .circuit_breaker(false)
            .circuit_breaker_failure_threshold(1)
            .build()
            .unwrap();
        let cb = CircuitBreaker::from_config(&config);
        cb.record_failure("example.com", "e");
        assert!(cb.should_attempt("example.com"));
    }
}
