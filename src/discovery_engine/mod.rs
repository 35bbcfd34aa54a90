//! Discovery runs: frontier-driven search, per-URL gates and persistence
//!
//! [`DiscoveryEngine`] executes one [`RunPlan`] at a time per call;
//! [`RunManager`] runs plans in the background and tracks them by id.

pub mod circuit_breaker;
pub mod engine;
pub mod enrichment;
pub mod errors;
mod processor;
pub mod rate_limiter;
pub mod run_manager;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitState, DomainHealth};
pub use engine::DiscoveryEngine;
pub use enrichment::{enrich, summarize};
pub use errors::DiscoveryError;
pub use rate_limiter::{FetchRateLimiter, RateLimitDecision};
pub use run_manager::{RunManager, RunRecord};
pub use types::{RunPlan, RunStatus, RunSummary, SkipReason, StopHandle};
