//! Three-tier duplicate detection
//!
//! Tiers run in order and stop at the first hit:
//! A exact canonical URL, B SimHash distance on the body, C cosine similarity
//! of titles on the same domain within the tracking window. A miss registers
//! the URL, hash and title, so checking the same input twice reports a
//! duplicate the second time.

use anyhow::Result;
use chrono::{Duration, Utc};
use log::debug;

use super::state::{DedupState, MemoryDedupState};
use super::types::{DeduplicationResult, DuplicateTier, Registration, TitleEntry};
use crate::canonical::Canonicalizer;
use crate::fingerprint::{
    ContentFingerprint, cosine_similarity, hamming_distance, similarity_from_distance, title_hash,
};
use crate::utils::{
    SIMHASH_DUPLICATE_DISTANCE, TITLE_SIMILARITY_THRESHOLD, TITLE_WINDOW_DAYS, strip_www,
};

pub struct DeduplicationChecker<S: DedupState = MemoryDedupState> {
    state: S,
    canonicalizer: Canonicalizer,
    max_hamming_distance: u32,
    title_threshold: f64,
    title_window: Duration,
}

impl DeduplicationChecker<MemoryDedupState> {
    /// In-memory checker with syntactic canonicalization.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryDedupState::new(), Canonicalizer::syntactic())
    }
}

impl<S: DedupState> DeduplicationChecker<S> {
    #[must_use]
    pub fn new(state: S, canonicalizer: Canonicalizer) -> Self {
        Self {
            state,
            canonicalizer,
            max_hamming_distance: SIMHASH_DUPLICATE_DISTANCE,
            title_threshold: TITLE_SIMILARITY_THRESHOLD,
            title_window: Duration::days(TITLE_WINDOW_DAYS),
        }
    }

    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Tier-A lookup that records nothing.
    pub async fn is_url_seen(&self, url: &str) -> Result<bool> {
        let canonical = self.canonicalizer.canonicalize(url).await;
        self.state.is_url_seen(&canonical.canonical_url).await
    }

    /// Run the three tiers for one candidate page.
    ///
    /// `domain` may be empty, in which case the canonical URL's host is used.
    pub async fn check_duplicate(
        &self,
        group_id: &str,
        url: &str,
        title: &str,
        content: &str,
        domain: &str,
    ) -> Result<DeduplicationResult> {
        let canonical = self.canonicalizer.canonicalize(url).await;
        let domain = if domain.trim().is_empty() {
            canonical.final_domain
        } else {
            strip_www(domain.trim())
        };
        let fingerprint =
            ContentFingerprint::compute(&canonical.canonical_url, title, content, &domain);
        self.check_fingerprint(group_id, title, &fingerprint).await
    }

    /// Tiers over a precomputed fingerprint.
    ///
    /// The fingerprint's URL must already be canonical and its domain
    /// normalized; nothing is re-derived here.
    pub async fn check_fingerprint(
        &self,
        group_id: &str,
        title: &str,
        fingerprint: &ContentFingerprint,
    ) -> Result<DeduplicationResult> {
        let canonical_url = &fingerprint.canonical_url;
        let domain = &fingerprint.domain;

        if self.state.is_url_seen(canonical_url).await? {
            debug!("Tier A duplicate: {canonical_url}");
            return Ok(DeduplicationResult::duplicate(
                DuplicateTier::A,
                format!("canonical URL already seen: {canonical_url}"),
                Some(1.0),
            ));
        }

        if fingerprint.has_body() {
            let closest = self
                .state
                .recent_hashes(group_id)
                .await?
                .into_iter()
                .map(|h| hamming_distance(fingerprint.sim_hash, h))
                .min();
            if let Some(distance) = closest.filter(|d| *d <= self.max_hamming_distance) {
                debug!("Tier B duplicate: {canonical_url} (distance {distance})");
                return Ok(DeduplicationResult::duplicate(
                    DuplicateTier::B,
                    format!("content within {distance} bits of a recent item"),
                    Some(similarity_from_distance(distance)),
                ));
            }
        }

        let now = Utc::now();
        let since = now - self.title_window;
        let best_title = self
            .state
            .recent_titles(group_id, domain, since)
            .await?
            .into_iter()
            .map(|entry| {
                // Same normalized title needs no token vectors
                let similarity = if title_hash(&entry.title) == fingerprint.title_hash {
                    1.0
                } else {
                    cosine_similarity(title, &entry.title)
                };
                (similarity, entry)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((similarity, entry)) =
            best_title.filter(|(similarity, _)| *similarity > self.title_threshold)
        {
            debug!(
                "Tier C duplicate: '{title}' ~ '{}' on {domain} ({similarity:.3})",
                entry.title
            );
            return Ok(DeduplicationResult::duplicate(
                DuplicateTier::C,
                format!("title similar to '{}' on {domain}", entry.title),
                Some(similarity),
            ));
        }

        self.state
            .register(
                group_id,
                Registration {
                    canonical_url: canonical_url.clone(),
                    sim_hash: fingerprint.has_body().then_some(fingerprint.sim_hash),
                    title: TitleEntry {
                        title: title.to_string(),
                        domain: domain.clone(),
                        seen_at: now,
                    },
                },
            )
            .await?;

        Ok(DeduplicationResult::unique())
    }
}
