//! 64-bit SimHash over word tokens
//!
//! Each token votes +1/-1 on every bit according to its xxh3 hash; a result
//! bit is set when the summed vote is positive. Texts sharing most tokens end
//! up a few bits apart.

use xxhash_rust::xxh3::xxh3_64;

/// Tokens of this many characters or fewer carry no signal.
const MIN_TOKEN_CHARS: usize = 3;

/// Lower-case, turn punctuation into whitespace and drop short tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Compute the SimHash of `text`. Text without usable tokens hashes to 0.
#[must_use]
pub fn simhash(text: &str) -> u64 {
    let mut votes = [0i64; 64];
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0;
    }

    for token in &tokens {
        let h = xxh3_64(token.as_bytes());
        for (bit, vote) in votes.iter_mut().enumerate() {
            if (h >> bit) & 1 == 1 {
                *vote += 1;
            } else {
                *vote -= 1;
            }
        }
    }

    votes
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit))
}

/// Number of differing bits between two fingerprints.
#[inline]
#[must_use]
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// `1 - distance/64`, the similarity reported for tier-B matches.
#[inline]
#[must_use]
pub fn similarity_from_distance(distance: u32) -> f64 {
    1.0 - f64::from(distance) / 64.0
}

/// SimHash values are stored in SQLite as signed integers.
#[inline]
#[must_use]
pub fn to_stored(hash: u64) -> i64 {
    i64::from_ne_bytes(hash.to_ne_bytes())
}

#[inline]
#[must_use]
pub fn from_stored(value: i64) -> u64 {
    u64::from_ne_bytes(value.to_ne_bytes())
}
