use thiserror::Error;

#[derive(Debug, Error)]
pub enum VetError {
    #[error("Vetter rejected content: {reason}")]
    Rejected { reason: String },

    #[error("Vetter found {found} cited facts, at least two are required")]
    InsufficientFacts { found: usize },

    #[error("Vetting request failed: {0}")]
    Transport(String),

    #[error("Vetting response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("Vetting timed out")]
    Timeout,
}

impl From<reqwest::Error> for VetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VetError::Timeout
        } else {
            VetError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VetError {
    fn from(err: serde_json::Error) -> Self {
        VetError::InvalidResponse(err.to_string())
    }
}
