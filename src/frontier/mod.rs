//! Search frontier: explore/exploit scheduling of search candidates

pub mod candidate;
pub mod cursor;
pub mod queue;

pub use candidate::{CandidateSource, SearchCandidate, SearchMethod};
pub use cursor::{advance_cursor, cursor_position};
pub use queue::{FrontierWeights, SearchFrontier};
