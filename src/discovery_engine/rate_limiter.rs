//! Per-domain fetch rate limiting
//!
//! Token bucket per domain, kept in a bounded LRU so long runs over many
//! domains do not grow without limit. Decisions are immediate; callers
//! decide whether to wait out `retry_after`.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::utils::extract_domain;

/// Most domains tracked at once
const MAX_TRACKED_DOMAINS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    Deny { retry_after: Duration },
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    rate_rps: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(rate_rps: f64) -> Self {
        // Burst of one second's worth, never less than a single request
        let capacity = rate_rps.max(1.0);
        Self {
            tokens: capacity,
            capacity,
            rate_rps,
            last_refill: Instant::now(),
        }
    }

    fn try_take(&mut self) -> RateLimitDecision {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_rps).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            RateLimitDecision::Allow
        } else {
            let missing = 1.0 - self.tokens;
            RateLimitDecision::Deny {
                retry_after: Duration::from_secs_f64(missing / self.rate_rps),
            }
        }
    }
}

/// Rate limiter owned by one run
pub struct FetchRateLimiter {
    buckets: Mutex<LruCache<String, Arc<std::sync::Mutex<TokenBucket>>>>,
}

impl FetchRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_TRACKED_DOMAINS)
    }

    #[must_use]
    pub fn with_capacity(max_domains: usize) -> Self {
        let capacity = NonZeroUsize::new(max_domains).unwrap_or(NonZeroUsize::MIN);
        Self {
            buckets: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Take a token for the URL's domain. Non-positive rates and URLs
    /// without a host are never limited.
    pub async fn check(&self, url: &str, rate_rps: f64) -> RateLimitDecision {
        if rate_rps.is_nan() || rate_rps <= 0.0 {
            return RateLimitDecision::Allow;
        }
        let domain = extract_domain(url);
        if domain.is_empty() {
            return RateLimitDecision::Allow;
        }

        let bucket = {
            let mut buckets = self.buckets.lock().await;
            Arc::clone(buckets.get_or_insert(domain, || {
                Arc::new(std::sync::Mutex::new(TokenBucket::new(rate_rps)))
            }))
        };
        let Ok(mut bucket) = bucket.lock() else {
            return RateLimitDecision::Allow;
        };
        bucket.try_take()
    }

    /// Wait until the URL's domain has a token.
    pub async fn acquire(&self, url: &str, rate_rps: f64) {
        while let RateLimitDecision::Deny { retry_after } = self.check(url, rate_rps).await {
            log::debug!("Rate limited on {url}, waiting {retry_after:?}");
            tokio::time::sleep(retry_after).await;
        }
    }

    pub async fn tracked_domains(&self) -> usize {
        self.buckets.lock().await.len()
    }

    pub async fn clear(&self) {
        self.buckets.lock().await.clear();
    }
}

impl Default for FetchRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
