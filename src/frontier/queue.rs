//! Priority-ordered frontier of search candidates
//!
//! `priority = w_n * novelty - w_p * duplicate_rate + w_d * diversity`, with
//! `novelty = 1 / (1 + days since last seen)` and
//! `diversity = 1 / (1 + other candidates seen for the domain)`.
//! Priorities are recomputed at every add, pop and reinsert, so a stored
//! priority is never read across a decision point.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::candidate::SearchCandidate;
use super::cursor::advance_cursor;
use crate::utils::{
    DEFAULT_DIVERSITY_WEIGHT, DEFAULT_FRONTIER_CAPACITY, DEFAULT_MAX_EMPTY_YIELDS,
    DEFAULT_NOVELTY_WEIGHT, DEFAULT_PAGE_SIZE, DEFAULT_PENALTY_WEIGHT,
};

/// Starting penalty for a candidate that had none when it first backs off
const INITIAL_BACKOFF_RATE: f64 = 0.1;
const BACKOFF_FACTOR: f64 = 1.5;
const MAX_DUPLICATE_RATE: f64 = 0.9;
const PRIORITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierWeights {
    pub novelty: f64,
    pub penalty: f64,
    pub diversity: f64,
}

impl Default for FrontierWeights {
    fn default() -> Self {
        Self {
            novelty: DEFAULT_NOVELTY_WEIGHT,
            penalty: DEFAULT_PENALTY_WEIGHT,
            diversity: DEFAULT_DIVERSITY_WEIGHT,
        }
    }
}

#[derive(Debug)]
pub struct SearchFrontier {
    candidates: Vec<SearchCandidate>,
    capacity: usize,
    weights: FrontierWeights,
    domain_counts: HashMap<String, usize>,
    page_size: u32,
    max_empty_yields: u32,
}

impl Default for SearchFrontier {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTIER_CAPACITY)
    }
}

impl SearchFrontier {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_weights(capacity, FrontierWeights::default())
    }

    #[must_use]
    pub fn with_weights(capacity: usize, weights: FrontierWeights) -> Self {
        Self {
            candidates: Vec::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
            weights,
            domain_counts: HashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            max_empty_yields: DEFAULT_MAX_EMPTY_YIELDS,
        }
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn max_empty_yields(mut self, max: u32) -> Self {
        self.max_empty_yields = max.max(1);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of candidates ever added for `domain`.
    #[must_use]
    pub fn domain_count(&self, domain: &str) -> usize {
        self.domain_counts.get(domain).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn contains_cursor(&self, cursor: &str) -> bool {
        self.candidates.iter().any(|c| c.cursor == cursor)
    }

    /// Priority of the head as of the last decision point.
    #[must_use]
    pub fn peek_priority(&self) -> Option<f64> {
        self.candidates.first().map(|c| c.priority)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchCandidate> {
        self.candidates.iter()
    }

    #[must_use]
    pub fn novelty(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        match last_seen {
            None => 1.0,
            Some(seen) => {
                let days = (now - seen).num_seconds().max(0) as f64 / 86_400.0;
                1.0 / (1.0 + days)
            }
        }
    }

    /// Diversity a candidate from `domain` would get right now.
    #[must_use]
    pub fn diversity(&self, domain: &str) -> f64 {
        let others = self.domain_count(domain).saturating_sub(1);
        1.0 / (1.0 + others as f64)
    }

    fn compute_priority(&self, candidate: &SearchCandidate, now: DateTime<Utc>) -> f64 {
        self.weights.novelty * Self::novelty(candidate.last_seen, now)
            - self.weights.penalty * candidate.duplicate_rate
            + self.weights.diversity * self.diversity(&candidate.domain)
    }

    /// Recompute every priority, sort descending and evict past capacity.
    fn refresh(&mut self) {
        let now = Utc::now();
        let priorities: Vec<f64> = self
            .candidates
            .iter()
            .map(|c| self.compute_priority(c, now))
            .collect();
        for (candidate, priority) in self.candidates.iter_mut().zip(priorities) {
            candidate.priority = priority;
        }
        self.candidates
            .sort_by(|a, b| b.priority.total_cmp(&a.priority));

        if self.candidates.len() > self.capacity {
            for evicted in self.candidates.drain(self.capacity..) {
                debug!(
                    "Frontier full, evicting {} ({:.3})",
                    evicted.cursor, evicted.priority
                );
            }
        }
    }

    /// Add a new candidate. Returns false when the same cursor is already queued.
    pub fn add_candidate(&mut self, candidate: SearchCandidate) -> bool {
        if self.contains_cursor(&candidate.cursor) {
            debug!("Frontier already holds {}", candidate.cursor);
            return false;
        }
        *self.domain_counts.entry(candidate.domain.clone()).or_insert(0) += 1;
        self.candidates.push(candidate);
        self.refresh();
        true
    }

    /// Remove and return the highest-priority candidate.
    pub fn pop_max(&mut self) -> Option<SearchCandidate> {
        if self.candidates.is_empty() {
            return None;
        }
        self.refresh();
        Some(self.candidates.remove(0))
    }

    /// Pop up to `max` direct candidates that share the head's priority.
    pub fn pop_priority_burst(&mut self, max: usize) -> Vec<SearchCandidate> {
        self.refresh();
        let Some(top) = self.candidates.first().map(|c| c.priority) else {
            return Vec::new();
        };
        let take = self
            .candidates
            .iter()
            .take(max)
            .take_while(|c| c.is_direct() && (c.priority - top).abs() < PRIORITY_EPSILON)
            .count();
        self.candidates.drain(..take).collect()
    }

    /// Put a processed candidate back.
    ///
    /// With `advance_cursor` the cursor moves to the next page and the
    /// candidate counts as freshly seen. Without it the duplicate rate backs
    /// off; after too many consecutive empty attempts the candidate is
    /// dropped and `false` is returned.
    pub fn reinsert(&mut self, mut candidate: SearchCandidate, advance_cursor_flag: bool) -> bool {
        if advance_cursor_flag {
            candidate.cursor = advance_cursor(&candidate.cursor, candidate.method, self.page_size);
            candidate.last_seen = Some(Utc::now());
            candidate.empty_yields = 0;
        } else {
            let base = if candidate.duplicate_rate > 0.0 {
                candidate.duplicate_rate
            } else {
                INITIAL_BACKOFF_RATE
            };
            candidate.duplicate_rate = (base * BACKOFF_FACTOR).min(MAX_DUPLICATE_RATE);
            candidate.empty_yields += 1;
            if candidate.empty_yields >= self.max_empty_yields {
                debug!(
                    "Dropping {} after {} empty attempts",
                    candidate.cursor, candidate.empty_yields
                );
                return false;
            }
        }

        if self.contains_cursor(&candidate.cursor) {
            return false;
        }
        self.candidates.push(candidate);
        self.refresh();
        true
    }
}
