//! External sources that turn a search candidate into article URLs

pub mod resolver;
pub mod seeds;

pub use resolver::{HttpSourceResolver, ResolvedUrl, SourceResolver};
pub use seeds::{
    arxiv_candidate, news_candidate, rss_candidate, topic_candidates, wikipedia_candidate,
};
