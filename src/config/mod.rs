//! Configuration for discovery runs
//!
//! `DiscoveryConfig` and its typestate builder, with validation and defaults.

pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

pub use builder::{Complete, DiscoveryConfigBuilder, WithPatchId};
pub use types::DiscoveryConfig;
