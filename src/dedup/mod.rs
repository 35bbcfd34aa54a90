//! Deduplication of discovered pages
//!
//! [`DeduplicationChecker`] holds the tier logic; [`DedupState`] decides where
//! the seen URLs, hash rings and title rings live.

pub mod checker;
pub mod sqlite;
pub mod state;
pub mod types;

pub use checker::DeduplicationChecker;
pub use sqlite::SqliteDedupState;
pub use state::{DedupState, MemoryDedupState};
pub use types::{DeduplicationResult, DuplicateTier, Registration, TitleEntry};
