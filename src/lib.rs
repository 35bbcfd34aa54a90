pub mod canonical;
pub mod config;
pub mod dedup;
pub mod discovery_engine;
pub mod discovery_events;
pub mod fingerprint;
pub mod frontier;
pub mod hero;
pub mod page_fetcher;
pub mod sources;
pub mod store;
pub mod utils;
pub mod vetting;

pub use canonical::{CanonicalUrl, Canonicalizer};
pub use config::DiscoveryConfig;
pub use dedup::{DedupState, DeduplicationChecker, DeduplicationResult, MemoryDedupState, SqliteDedupState};
pub use discovery_engine::{
    DiscoveryEngine, DiscoveryError, RunManager, RunPlan, RunRecord, RunStatus, RunSummary,
    SkipReason, StopHandle,
};
pub use discovery_events::{DiscoveryEvent, DiscoveryEventBus, EventKind};
pub use fingerprint::{ContentFingerprint, cosine_similarity, hamming_distance, simhash};
pub use frontier::{CandidateSource, SearchCandidate, SearchFrontier, SearchMethod};
pub use hero::{HeroImageResult, HeroInput, HeroPipeline, HeroSource};
pub use page_fetcher::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use sources::{HttpSourceResolver, ResolvedUrl, SourceResolver};
pub use store::{DiscoveredItem, DiscoveryStore, SqliteStore, StoreError};
pub use vetting::{HttpVetter, VetError, VetVerdict, Vetter};
