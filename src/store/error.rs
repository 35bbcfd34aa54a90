use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item with canonical URL {canonical_url} already exists for this patch")]
    Duplicate { canonical_url: String },

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored JSON is invalid: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored row is invalid: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
