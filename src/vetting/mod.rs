//! Relevance vetting: the scoring collaborator and its score normalization

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpVetter, Vetter};
pub use error::VetError;
pub use types::{CitedFact, Quote, RawVetResponse, VetRequest, VetVerdict, normalize_score};
