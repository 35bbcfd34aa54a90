use thiserror::Error;

use crate::store::StoreError;

/// Failures that stop a run before or outside per-item processing
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid run plan: {0}")]
    InvalidPlan(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Run setup failed: {0}")]
    Setup(String),
}
