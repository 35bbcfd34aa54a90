//! Content fingerprinting primitives
//!
//! Pure functions used by deduplication: SimHash for near-identical bodies,
//! cosine similarity for lightly edited titles.

pub mod cosine;
pub mod simhash;

pub use cosine::cosine_similarity;
pub use simhash::{hamming_distance, similarity_from_distance, simhash, tokenize};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Comparison-only fingerprint of a fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFingerprint {
    pub canonical_url: String,
    pub sim_hash: u64,
    pub title_hash: u64,
    pub domain: String,
    pub content_length: usize,
    /// Usable SimHash tokens in the body; zero means `sim_hash` carries no signal
    pub token_count: usize,
}

impl ContentFingerprint {
    #[must_use]
    pub fn compute(canonical_url: &str, title: &str, content: &str, domain: &str) -> Self {
        Self {
            canonical_url: canonical_url.to_string(),
            sim_hash: simhash(content),
            title_hash: title_hash(title),
            domain: domain.to_string(),
            content_length: content.chars().count(),
            token_count: tokenize(content).len(),
        }
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.token_count > 0
    }
}

/// Hash of a title after trimming and lower-casing.
#[must_use]
pub fn title_hash(title: &str) -> u64 {
    xxh3_64(title.trim().to_lowercase().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_hash_ignores_case_and_padding() {
        let a = ContentFingerprint::compute("https://a.test/x", "  Big News ", "body text here", "a.test");
        let b = ContentFingerprint::compute("https://a.test/y", "big news", "body text here", "a.test");
        assert_eq!(a.title_hash, b.title_hash);
        assert_eq!(hamming_distance(a.sim_hash, b.sim_hash), 0);
        assert_eq!(a.content_length, 14);
        assert_eq!(a.token_count, 3);
    }

    #[test]
    fn punctuation_only_body_has_no_tokens() {
        let fp = ContentFingerprint::compute("https://a.test/x", "Title", "-- .. !!", "a.test");
        assert!(!fp.has_body());
        assert_eq!(fp.content_length, 8);
    }
}
