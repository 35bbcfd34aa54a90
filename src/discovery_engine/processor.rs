//! Per-URL gate pipeline
//!
//! A resolved URL is canonicalized and checked against seen state before
//! any network fetch; the fetched page then runs the content gates, vetting,
//! enrichment, hero assignment and persistence in that order. Every failure
//! becomes a [`SkipReason`]; nothing here aborts the run.

use std::collections::{BTreeMap, HashSet, VecDeque};

use chrono::Utc;
use log::{debug, info, warn};
use tokio::time::{Instant, timeout};

use super::circuit_breaker::CircuitBreaker;
use super::engine::DiscoveryEngine;
use super::enrichment::enrich;
use super::rate_limiter::FetchRateLimiter;
use super::types::{RunStatus, SkipReason, StopHandle};
use crate::config::DiscoveryConfig;
use crate::dedup::{DedupState, DeduplicationChecker, DeduplicationResult, DuplicateTier};
use crate::discovery_events::DiscoveryEvent;
use crate::fingerprint::{ContentFingerprint, hamming_distance};
use crate::frontier::{CandidateSource, SearchFrontier};
use crate::hero::HeroInput;
use crate::page_fetcher::FetchedPage;
use crate::sources::ResolvedUrl;
use crate::store::{ContentType, NewItem, SaveCounters, StoreError};
use crate::utils::{
    SEEN_URL_TTL_DAYS, SIMHASH_DUPLICATE_DISTANCE, contains_ignore_case, safe_truncate_chars,
};
use crate::vetting::{VetError, VetRequest};

/// Everything a single run owns
pub(crate) struct RunState<'a, S: DedupState> {
    pub run_id: String,
    pub config: &'a DiscoveryConfig,
    pub stop: StopHandle,
    pub deadline: Instant,
    pub frontier: SearchFrontier,
    pub dedup: DeduplicationChecker<S>,
    pub limiter: FetchRateLimiter,
    pub breaker: CircuitBreaker,
    pub angles: VecDeque<String>,
    /// Canonical URLs already taken through the pipeline this run
    pub processed_urls: HashSet<String>,
    /// SimHashes of the patch's saved content, including this run's saves
    pub saved_hashes: Vec<u64>,
    pub saved: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub candidates_processed: usize,
    pub urls_processed: usize,
}

impl<S: DedupState> RunState<'_, S> {
    /// Terminal status the run should finish with, if any
    pub fn halt_status(&self) -> Option<RunStatus> {
        if self.stop.is_stopped() {
            Some(RunStatus::Stopped)
        } else if self.saved >= self.config.max_items() || Instant::now() >= self.deadline {
            Some(RunStatus::Completed)
        } else {
            None
        }
    }

    fn thresholds(&self) -> (f64, f64) {
        if self.saved == 0 {
            (self.config.soft_min_relevance(), self.config.soft_min_quality())
        } else {
            (self.config.min_relevance(), self.config.min_quality())
        }
    }
}

/// A URL that passed the pre-fetch checks
#[derive(Debug, Clone)]
pub(crate) struct PreparedUrl {
    pub url: String,
    pub canonical_url: String,
    pub domain: String,
    pub title_hint: Option<String>,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UrlOutcome {
    /// Already handled this run or known duplicate; nothing was fetched
    Unusable,
    /// Went through the fetch and gates, saved or skipped
    Processed,
    /// The run must stop
    Halted,
}

pub(crate) enum Prepared {
    Ready(PreparedUrl),
    Done(UrlOutcome),
}

/// How a fetched page left the gates
enum PageVerdict {
    /// Persisted and announced
    Saved,
    Skipped(SkipReason, String),
    Duplicate(DeduplicationResult),
    Halted,
}

impl DiscoveryEngine {
    /// Canonicalize and run the cheap seen-state checks.
    pub(crate) async fn prepare_url<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        resolved: &ResolvedUrl,
        source: CandidateSource,
    ) -> Prepared {
        if run.halt_status().is_some() {
            return Prepared::Done(UrlOutcome::Halted);
        }

        let canonical = self.canonicalizer.canonicalize(&resolved.url).await;
        if !run.processed_urls.insert(canonical.canonical_url.clone()) {
            debug!("Already processed {} this run", canonical.canonical_url);
            return Prepared::Done(UrlOutcome::Unusable);
        }

        if let Some(result) = self.known_duplicate(run, &canonical.canonical_url).await {
            self.skip_duplicate(run, &resolved.url, &result).await;
            return Prepared::Done(UrlOutcome::Unusable);
        }

        if !run.breaker.should_attempt(&canonical.final_domain) {
            run.urls_processed += 1;
            self.skip(
                run,
                &resolved.url,
                SkipReason::ProcessingError,
                format!("circuit open for {}", canonical.final_domain),
            )
            .await;
            return Prepared::Done(UrlOutcome::Processed);
        }

        Prepared::Ready(PreparedUrl {
            url: resolved.url.clone(),
            canonical_url: canonical.canonical_url,
            domain: canonical.final_domain,
            title_hint: resolved.title_hint.clone(),
            source,
        })
    }

    /// Seen-state lookups, cheapest first: this process's dedup state, the
    /// patch's stored items, then the cross-run seen-URL table. A failed
    /// lookup counts as not seen.
    async fn known_duplicate<S: DedupState>(
        &self,
        run: &RunState<'_, S>,
        canonical_url: &str,
    ) -> Option<DeduplicationResult> {
        match run.dedup.is_url_seen(canonical_url).await {
            Ok(true) => {
                return Some(DeduplicationResult::duplicate(
                    DuplicateTier::A,
                    "canonical URL already seen",
                    Some(1.0),
                ));
            }
            Ok(false) => {}
            Err(e) => warn!("Seen-URL lookup failed for {canonical_url}: {e:#}"),
        }

        match self
            .store
            .find_by_canonical_url(run.config.patch_id(), canonical_url)
            .await
        {
            Ok(Some(item)) => {
                return Some(
                    DeduplicationResult::duplicate(
                        DuplicateTier::A,
                        format!("already saved as {}", item.id),
                        Some(1.0),
                    )
                    .with_existing_item(item.id),
                );
            }
            Ok(None) => {}
            Err(e) => warn!("Store lookup failed for {canonical_url}: {e}"),
        }

        let ttl = chrono::Duration::days(SEEN_URL_TTL_DAYS);
        match self.store.seen_url(canonical_url).await {
            Ok(Some(seen)) if seen.is_fresh(ttl, Utc::now()) => Some(DeduplicationResult::duplicate(
                DuplicateTier::A,
                format!(
                    "seen {} time(s), last at {}",
                    seen.times_seen,
                    seen.last_seen.to_rfc3339()
                ),
                Some(1.0),
            )),
            Ok(_) => None,
            Err(e) => {
                warn!("Seen-URL table lookup failed for {canonical_url}: {e}");
                None
            }
        }
    }

    /// Rate-limited fetch with the run's timeout. Only borrows shared run
    /// state, so several can run at once.
    pub(crate) async fn fetch_page(
        &self,
        config: &DiscoveryConfig,
        limiter: &FetchRateLimiter,
        breaker: &CircuitBreaker,
        prepared: &PreparedUrl,
    ) -> Result<FetchedPage, String> {
        limiter.acquire(&prepared.url, config.crawl_rate_rps()).await;

        let result = match timeout(config.fetch_timeout(), self.fetcher.fetch(&prepared.url)).await {
            Ok(Ok(page)) if page.is_success() => Ok(page),
            Ok(Ok(page)) => Err(format!("HTTP {}", page.status)),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(_) => Err(format!("fetch timed out after {:?}", config.fetch_timeout())),
        };

        match &result {
            Ok(_) => breaker.record_success(&prepared.domain),
            Err(e) => breaker.record_failure(&prepared.domain, e),
        }
        result
    }

    /// Full pipeline for one URL.
    pub(crate) async fn process_url<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        resolved: &ResolvedUrl,
        source: CandidateSource,
    ) -> UrlOutcome {
        let prepared = match self.prepare_url(run, resolved, source).await {
            Prepared::Ready(prepared) => prepared,
            Prepared::Done(outcome) => return outcome,
        };
        if run.halt_status().is_some() {
            return UrlOutcome::Halted;
        }
        let fetched = self
            .fetch_page(run.config, &run.limiter, &run.breaker, &prepared)
            .await;
        self.evaluate(run, prepared, fetched).await
    }

    /// Gates after the fetch, through to the `saved` event.
    ///
    /// Lasting verdicts are recorded in the seen-URL table so later runs
    /// skip the URL before fetching it.
    pub(crate) async fn evaluate<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        prepared: PreparedUrl,
        fetched: Result<FetchedPage, String>,
    ) -> UrlOutcome {
        run.urls_processed += 1;

        let page = match fetched {
            Ok(page) => page,
            Err(detail) => {
                self.skip(run, &prepared.url, SkipReason::ProcessingError, detail)
                    .await;
                return UrlOutcome::Processed;
            }
        };

        let url = prepared.url.clone();
        let canonical_url = prepared.canonical_url.clone();
        let domain = prepared.domain.clone();
        let reason = match self.gate_page(run, prepared, page).await {
            PageVerdict::Saved => return UrlOutcome::Processed,
            PageVerdict::Halted => return UrlOutcome::Halted,
            PageVerdict::Duplicate(result) => {
                self.skip_duplicate(run, &url, &result).await;
                SkipReason::Duplicate
            }
            PageVerdict::Skipped(reason, detail) => {
                self.skip(run, &url, reason, detail).await;
                reason
            }
        };

        if reason.is_lasting() {
            self.remember_url(&canonical_url, &domain).await;
        }
        UrlOutcome::Processed
    }

    async fn gate_page<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        prepared: PreparedUrl,
        page: FetchedPage,
    ) -> PageVerdict {
        let url = prepared.url.as_str();
        let config = run.config;

        let length = page.text.chars().count();
        if length < config.min_content_length() {
            return PageVerdict::Skipped(
                SkipReason::ContentTooShort,
                format!("{length} chars, need {}", config.min_content_length()),
            );
        }

        let title = [Some(page.title.as_str()), prepared.title_hint.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .unwrap_or(url)
            .to_string();

        let mentioned = config
            .entity_terms()
            .any(|term| contains_ignore_case(&title, term) || contains_ignore_case(&page.text, term));
        if !mentioned {
            return PageVerdict::Skipped(
                SkipReason::EntityMissing,
                format!("'{}' not mentioned", config.topic()),
            );
        }

        let fingerprint =
            ContentFingerprint::compute(&prepared.canonical_url, &title, &page.text, &prepared.domain);
        match run
            .dedup
            .check_fingerprint(config.patch_id(), &title, &fingerprint)
            .await
        {
            Ok(result) if result.is_duplicate => return PageVerdict::Duplicate(result),
            Ok(_) => {}
            Err(e) => {
                return PageVerdict::Skipped(
                    SkipReason::ProcessingError,
                    format!("dedup check failed: {e:#}"),
                );
            }
        }

        if let Some(distance) = run
            .saved_hashes
            .iter()
            .map(|saved| hamming_distance(fingerprint.sim_hash, *saved))
            .min()
            .filter(|d| *d <= SIMHASH_DUPLICATE_DISTANCE)
        {
            return PageVerdict::Skipped(
                SkipReason::NearDuplicate,
                format!("within {distance} bits of saved content"),
            );
        }

        if run.halt_status().is_some() {
            return PageVerdict::Halted;
        }
        self.events
            .emit(DiscoveryEvent::vetting(&run.run_id, url, &title))
            .await;

        let request = VetRequest {
            topic: config.topic().to_string(),
            aliases: config.aliases().to_vec(),
            url: url.to_string(),
            title: title.clone(),
            text: page.text.clone(),
        };
        let verdict = match timeout(config.vet_timeout(), self.vetter.vet(request)).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                let reason = match &e {
                    VetError::InsufficientFacts { .. } => SkipReason::VetterInsufficientFacts,
                    VetError::Rejected { .. } => SkipReason::VetterRejected,
                    _ => SkipReason::ProcessingError,
                };
                return PageVerdict::Skipped(reason, e.to_string());
            }
            Err(_) => {
                return PageVerdict::Skipped(
                    SkipReason::ProcessingError,
                    "vetting timed out".to_string(),
                );
            }
        };

        let (min_relevance, min_quality) = run.thresholds();
        if verdict.relevance < min_relevance || verdict.quality < min_quality {
            return PageVerdict::Skipped(
                SkipReason::LowRelevance,
                format!(
                    "relevance {:.2} / quality {:.2} below {min_relevance:.2} / {min_quality:.2}",
                    verdict.relevance, verdict.quality
                ),
            );
        }

        let enriched = enrich(&page.text, &verdict);

        if run.halt_status().is_some() {
            return PageVerdict::Halted;
        }
        self.events
            .emit(DiscoveryEvent::hero(&run.run_id, url, &title))
            .await;
        let hero = self
            .hero
            .assign_hero(&HeroInput {
                title: title.clone(),
                summary: Some(enriched.summary.clone()),
                topic: Some(config.topic().to_string()),
                entity: None,
            })
            .await;

        if run.stop.is_stopped() {
            return PageVerdict::Halted;
        }
        let item = NewItem {
            patch_id: config.patch_id().to_string(),
            title: safe_truncate_chars(&title, 300).to_string(),
            url: url.to_string(),
            canonical_url: prepared.canonical_url.clone(),
            domain: prepared.domain.clone(),
            content: page.text,
            content_type: ContentType::for_source(prepared.source),
            relevance_score: verdict.relevance,
            quality_score: verdict.quality,
            sim_hash: fingerprint.sim_hash,
            contested: verdict.contested,
            enriched,
            hero: Some(hero),
        };
        let saved = match self.store.create(item).await {
            Ok(saved) => saved,
            Err(StoreError::Duplicate { canonical_url }) => {
                let result = DeduplicationResult::duplicate(
                    DuplicateTier::A,
                    format!("{canonical_url} already stored"),
                    Some(1.0),
                );
                let existing = self
                    .store
                    .find_by_canonical_url(config.patch_id(), &canonical_url)
                    .await
                    .ok()
                    .flatten();
                return PageVerdict::Duplicate(match existing {
                    Some(item) => result.with_existing_item(item.id),
                    None => result,
                });
            }
            Err(e) => {
                return PageVerdict::Skipped(SkipReason::ProcessingError, format!("save failed: {e}"));
            }
        };

        self.remember_url(&prepared.canonical_url, &prepared.domain)
            .await;
        let counters = match self
            .store
            .increment_save_counters(config.patch_id(), verdict.contested, verdict.is_historical())
            .await
        {
            Ok(counters) => counters,
            Err(e) => {
                warn!("Failed to update save counters for {}: {e}", config.patch_id());
                SaveCounters::default()
            }
        };

        run.saved += 1;
        run.saved_hashes.push(fingerprint.sim_hash);
        info!(
            "Saved '{}' for {} ({}/{})",
            saved.title,
            config.patch_id(),
            run.saved,
            config.max_items()
        );
        self.events
            .emit(DiscoveryEvent::saved(&run.run_id, &saved, counters))
            .await;
        PageVerdict::Saved
    }

    async fn remember_url(&self, canonical_url: &str, domain: &str) {
        if let Err(e) = self.store.record_seen_url(canonical_url, domain).await {
            warn!("Failed to record seen URL {canonical_url}: {e}");
        }
    }

    async fn skip_duplicate<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        url: &str,
        result: &DeduplicationResult,
    ) {
        *run.skipped.entry(SkipReason::Duplicate).or_insert(0) += 1;
        debug!("Skipping {url}: duplicate ({})", result.reason);
        self.events
            .emit(DiscoveryEvent::duplicate(&run.run_id, url, result))
            .await;
    }

    /// Count a skip and report it. Processing errors go out as `error` events.
    pub(crate) async fn skip<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        url: &str,
        reason: SkipReason,
        detail: impl Into<String>,
    ) {
        let detail = detail.into();
        *run.skipped.entry(reason).or_insert(0) += 1;
        debug!("Skipping {url}: {reason} ({detail})");

        let event = if reason == SkipReason::ProcessingError {
            DiscoveryEvent::error(&run.run_id, Some(url), detail)
        } else {
            DiscoveryEvent::skipped(&run.run_id, url, reason, detail)
        };
        self.events.emit(event).await;
    }
}
