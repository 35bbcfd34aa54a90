//! Discovery run orchestration
//!
//! A run pops the highest-priority candidate from the frontier, resolves it
//! to URLs and hands each URL to the gate pipeline in [`super::processor`].
//! Direct candidates that share the top priority at start are fetched
//! concurrently as a burst before the main loop.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::time::{Instant, timeout};
use uuid::Uuid;

use super::circuit_breaker::CircuitBreaker;
use super::errors::DiscoveryError;
use super::processor::{Prepared, RunState, UrlOutcome};
use super::rate_limiter::FetchRateLimiter;
use super::types::{RunPlan, RunStatus, RunSummary, StopHandle};
use crate::canonical::Canonicalizer;
use crate::dedup::{DedupState, DeduplicationChecker, MemoryDedupState, SqliteDedupState};
use crate::discovery_events::{DiscoveryEvent, DiscoveryEventBus};
use crate::frontier::{SearchCandidate, SearchFrontier};
use crate::hero::{HeroInput, HeroPipeline};
use crate::page_fetcher::PageFetcher;
use crate::sources::{SourceResolver, topic_candidates};
use crate::store::{DiscoveryStore, StoreHeroSink};
use crate::vetting::Vetter;

/// Runs discovery for one patch at a time; share it behind an `Arc` to run
/// several patches concurrently.
pub struct DiscoveryEngine {
    pub(crate) store: Arc<dyn DiscoveryStore>,
    pub(crate) resolver: Arc<dyn SourceResolver>,
    pub(crate) fetcher: Arc<dyn PageFetcher>,
    pub(crate) vetter: Arc<dyn Vetter>,
    pub(crate) hero: Arc<HeroPipeline>,
    pub(crate) events: DiscoveryEventBus,
    pub(crate) canonicalizer: Canonicalizer,
    durable_dedup: Option<SqliteDedupState>,
}

impl DiscoveryEngine {
    /// Engine with a skeleton-only hero pipeline, a fresh event bus and
    /// offline URL canonicalization.
    #[must_use]
    pub fn new(
        store: Arc<dyn DiscoveryStore>,
        resolver: Arc<dyn SourceResolver>,
        fetcher: Arc<dyn PageFetcher>,
        vetter: Arc<dyn Vetter>,
    ) -> Self {
        let hero = HeroPipeline::new().with_sink(Arc::new(StoreHeroSink::new(store.clone())));
        Self {
            store,
            resolver,
            fetcher,
            vetter,
            hero: Arc::new(hero),
            events: DiscoveryEventBus::default(),
            canonicalizer: Canonicalizer::syntactic(),
            durable_dedup: None,
        }
    }

    /// Replace the hero pipeline. Backfilled heroes go to the engine's
    /// store unless the pipeline brings its own sink.
    #[must_use]
    pub fn with_hero_pipeline(mut self, hero: HeroPipeline) -> Self {
        let hero = if hero.has_sink() {
            hero
        } else {
            hero.with_sink(Arc::new(StoreHeroSink::new(self.store.clone())))
        };
        self.hero = Arc::new(hero);
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, events: DiscoveryEventBus) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// Keep dedup state across runs and restarts instead of per run.
    #[must_use]
    pub fn with_durable_dedup(mut self, state: SqliteDedupState) -> Self {
        self.durable_dedup = Some(state);
        self
    }

    #[must_use]
    pub fn events(&self) -> &DiscoveryEventBus {
        &self.events
    }

    /// Run a plan to completion under a fresh run id.
    pub async fn start(&self, plan: RunPlan) -> Result<RunSummary, DiscoveryError> {
        self.run(Uuid::new_v4().to_string(), plan, StopHandle::new())
            .await
    }

    /// Run a plan under a caller-chosen id, stoppable through `stop`.
    pub async fn run(
        &self,
        run_id: String,
        plan: RunPlan,
        stop: StopHandle,
    ) -> Result<RunSummary, DiscoveryError> {
        let started = Instant::now();

        if let Err(e) = plan.validate() {
            error!("Run {run_id} rejected: {e}");
            self.events
                .emit(DiscoveryEvent::error(&run_id, None, e.to_string()))
                .await;
            self.events
                .emit(DiscoveryEvent::run_completed(
                    &run_id,
                    RunStatus::Failed,
                    0,
                    elapsed_ms(started),
                ))
                .await;
            return Err(e);
        }

        let state: Arc<dyn DedupState> = match &self.durable_dedup {
            Some(durable) => Arc::new(durable.clone()),
            None => Arc::new(MemoryDedupState::new()),
        };
        // URLs reaching the checker are already canonical
        let dedup = DeduplicationChecker::new(state, Canonicalizer::syntactic());

        let config = &plan.config;
        let saved_hashes = match self.store.content_hashes(config.patch_id()).await {
            Ok(hashes) => hashes,
            Err(e) => {
                error!("Run {run_id} could not load content hashes: {e}");
                self.events
                    .emit(DiscoveryEvent::error(&run_id, None, e.to_string()))
                    .await;
                self.events
                    .emit(DiscoveryEvent::run_completed(
                        &run_id,
                        RunStatus::Failed,
                        0,
                        elapsed_ms(started),
                    ))
                    .await;
                return Err(e.into());
            }
        };

        let mut frontier = SearchFrontier::with_weights(config.frontier_capacity(), config.frontier_weights())
            .page_size(config.page_size())
            .max_empty_yields(config.max_empty_yields());
        let seeds = plan.seeds.len();
        for seed in plan.seeds.iter().cloned() {
            if !frontier.add_candidate(seed) {
                debug!("Seed rejected by frontier (duplicate cursor or full)");
            }
        }

        let mut run = RunState {
            run_id: run_id.clone(),
            config,
            stop,
            deadline: started + config.run_timeout(),
            frontier,
            dedup,
            limiter: FetchRateLimiter::new(),
            breaker: CircuitBreaker::from_config(config),
            angles: plan
                .angles
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect::<VecDeque<_>>(),
            processed_urls: HashSet::new(),
            saved_hashes,
            saved: 0,
            skipped: BTreeMap::new(),
            candidates_processed: 0,
            urls_processed: 0,
        };

        info!(
            "Run {run_id} started for patch {} ('{}') with {seeds} seeds",
            config.patch_id(),
            config.topic()
        );
        self.events
            .emit(DiscoveryEvent::run_started(
                &run_id,
                config.patch_id(),
                config.topic(),
                seeds,
            ))
            .await;

        self.priority_burst(&mut run).await;
        let status = self.main_loop(&mut run).await;

        let summary = RunSummary {
            run_id: run_id.clone(),
            patch_id: config.patch_id().to_string(),
            status,
            items_saved: run.saved,
            skipped: run.skipped,
            candidates_processed: run.candidates_processed,
            urls_processed: run.urls_processed,
            duration_ms: elapsed_ms(started),
            error: None,
        };
        info!(
            "Run {run_id} finished {status}: {} saved, {} skipped, {} URLs in {}ms",
            summary.items_saved,
            summary.total_skipped(),
            summary.urls_processed,
            summary.duration_ms
        );
        self.events
            .emit(DiscoveryEvent::run_completed(
                &run_id,
                status,
                summary.items_saved,
                summary.duration_ms,
            ))
            .await;
        Ok(summary)
    }

    async fn main_loop<S: DedupState>(&self, run: &mut RunState<'_, S>) -> RunStatus {
        loop {
            if let Some(status) = run.halt_status() {
                return status;
            }

            let Some(candidate) = run.frontier.pop_max() else {
                if let Some(angle) = run.angles.pop_front() {
                    self.expand(run, &angle).await;
                    continue;
                }
                info!("Run {} has nothing left to search", run.run_id);
                self.events.emit(DiscoveryEvent::idle(&run.run_id)).await;
                return RunStatus::Exhausted;
            };

            self.process_candidate(run, candidate).await;
        }
    }

    async fn expand<S: DedupState>(&self, run: &mut RunState<'_, S>, angle: &str) {
        let config = run.config;
        let added = topic_candidates(config.topic(), Some(angle), config.page_size())
            .into_iter()
            .filter(|candidate| run.frontier.add_candidate(candidate.clone()))
            .count();
        info!("Expanded run {} with angle '{angle}': {added} candidates", run.run_id);
        self.events
            .emit(DiscoveryEvent::expanded(&run.run_id, angle, added))
            .await;
    }

    async fn resolve<S: DedupState>(
        &self,
        run: &RunState<'_, S>,
        candidate: &SearchCandidate,
    ) -> Vec<crate::sources::ResolvedUrl> {
        self.events
            .emit(DiscoveryEvent::searching(
                &run.run_id,
                candidate.source,
                &candidate.query,
                &candidate.cursor,
            ))
            .await;

        match timeout(run.config.fetch_timeout(), self.resolver.resolve(candidate)).await {
            Ok(Ok(urls)) => urls,
            Ok(Err(e)) => {
                warn!("Resolving {} failed: {e:#}", candidate.cursor);
                Vec::new()
            }
            Err(_) => {
                warn!("Resolving {} timed out", candidate.cursor);
                Vec::new()
            }
        }
    }

    async fn process_candidate<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        candidate: SearchCandidate,
    ) {
        run.candidates_processed += 1;
        let urls = self.resolve(run, &candidate).await;

        let mut usable = 0usize;
        for resolved in &urls {
            match self.process_url(run, resolved, candidate.source).await {
                UrlOutcome::Unusable => {}
                UrlOutcome::Processed => usable += 1,
                UrlOutcome::Halted => return,
            }
        }

        self.settle_candidate(run, candidate, usable);
    }

    /// Reinsert or drop a candidate after its URLs were handled.
    fn settle_candidate<S: DedupState>(
        &self,
        run: &mut RunState<'_, S>,
        candidate: SearchCandidate,
        usable: usize,
    ) {
        let cursor = candidate.cursor.clone();
        if candidate.is_direct() {
            debug!("Direct candidate {cursor} finished");
        } else if usable == 0 {
            if !run.frontier.reinsert(candidate, false) {
                info!("Dropped {cursor} after repeated empty yields");
            }
        } else if !run.frontier.reinsert(candidate, true) {
            debug!("Could not reinsert {cursor}");
        }
    }

    /// Fetch the top-priority direct candidates concurrently, then run the
    /// gates on each page in order.
    async fn priority_burst<S: DedupState>(&self, run: &mut RunState<'_, S>) {
        let size = run.config.priority_burst_size();
        if size == 0 {
            return;
        }
        let burst = run.frontier.pop_priority_burst(size);
        if burst.is_empty() {
            return;
        }
        info!("Run {} bursting {} direct candidates", run.run_id, burst.len());

        let mut prepared = Vec::new();
        for candidate in &burst {
            run.candidates_processed += 1;
            for resolved in self.resolve(run, candidate).await {
                match self.prepare_url(run, &resolved, candidate.source).await {
                    Prepared::Ready(url) => prepared.push(url),
                    Prepared::Done(UrlOutcome::Halted) => return,
                    Prepared::Done(_) => {}
                }
            }
        }

        if run.halt_status().is_some() {
            return;
        }
        let pages = {
            let run: &RunState<'_, S> = run;
            join_all(
                prepared
                    .iter()
                    .map(|url| self.fetch_page(run.config, &run.limiter, &run.breaker, url)),
            )
            .await
        };

        for (url, page) in prepared.into_iter().zip(pages) {
            if self.evaluate(run, url, page).await == UrlOutcome::Halted {
                return;
            }
        }
    }

    /// Retry hero resolution for a patch's items still on a skeleton hero.
    ///
    /// Returns how many items were upgraded.
    pub async fn backfill_heroes(&self, patch_id: &str, limit: usize) -> Result<usize, DiscoveryError> {
        let items = self.store.skeleton_hero_items(patch_id, limit).await?;
        let mut upgraded = 0;

        for item in items {
            let input = HeroInput {
                title: item.title.clone(),
                summary: Some(item.enriched.summary.clone()).filter(|s| !s.is_empty()),
                topic: None,
                entity: None,
            };
            if let Some(hero) = self.hero.assign_and_save(&item.id, &input).await {
                debug!("Backfilled {:?} hero for {}", hero.source, item.id);
                upgraded += 1;
            }
        }

        info!("Backfilled {upgraded} heroes for patch {patch_id}");
        Ok(upgraded)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
