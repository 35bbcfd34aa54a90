//! Shared defaults for discovery runs
//!
//! Values here back `DiscoveryConfig` defaults and the thresholds used by the
//! deduplication, frontier and vetting stages.

/// Default fetch rate per domain: 2 requests per second
pub const DEFAULT_CRAWL_RATE_RPS: f64 = 2.0;

/// Items saved before a run completes
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// Wall-clock budget for a single run
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Frontier capacity; lowest-priority candidates are evicted past this
pub const DEFAULT_FRONTIER_CAPACITY: usize = 50;

pub const DEFAULT_NOVELTY_WEIGHT: f64 = 0.4;
pub const DEFAULT_PENALTY_WEIGHT: f64 = 0.2;
pub const DEFAULT_DIVERSITY_WEIGHT: f64 = 0.4;

/// Extracted body text shorter than this is skipped as `content_too_short`
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 500;

/// Relevance and quality floors on the 0-1 scale
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.6;
pub const DEFAULT_MIN_QUALITY: f64 = 0.5;

/// Relaxed floors applied while a run has not saved anything yet
pub const DEFAULT_SOFT_MIN_RELEVANCE: f64 = 0.35;
pub const DEFAULT_SOFT_MIN_QUALITY: f64 = 0.3;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CANONICALIZE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_HERO_AI_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_VET_TIMEOUT_SECS: u64 = 30;

/// Direct candidates fetched concurrently at run start
pub const DEFAULT_PRIORITY_BURST_SIZE: usize = 3;

/// Consecutive empty resolutions before a candidate is dropped
pub const DEFAULT_MAX_EMPTY_YIELDS: u32 = 3;

/// Pagination step for `api` offsets and `search` start indexes
pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 3;
pub const DEFAULT_CIRCUIT_BREAKER_RETRY_SECS: u64 = 120;

/// SimHash near-duplicate cutoff (bits out of 64)
pub const SIMHASH_DUPLICATE_DISTANCE: u32 = 7;

/// Title cosine similarity above which two same-domain titles collide
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.92;

/// Per-group ring sizes for the in-memory dedup state
pub const RECENT_HASH_CAPACITY: usize = 1000;
pub const RECENT_TITLE_CAPACITY: usize = 100;

/// Tier C only compares titles seen within this window
pub const TITLE_WINDOW_DAYS: i64 = 14;

/// Expiry for rows in the durable dedup tables
pub const DURABLE_DEDUP_TTL_DAYS: i64 = 30;

/// A seen-URL row suppresses the URL in later runs for this long
pub const SEEN_URL_TTL_DAYS: i64 = 30;

/// Vetting must return at least this many cited facts
pub const MIN_CITED_FACTS: usize = 2;

pub const SUMMARY_MAX_CHARS: usize = 400;
pub const MAX_KEY_POINTS: usize = 5;

/// Redirect hops followed while canonicalizing
pub const MAX_REDIRECTS: usize = 10;

pub const USER_AGENT: &str = concat!("carrot-discovery/", env!("CARGO_PKG_VERSION"));
