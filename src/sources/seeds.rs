//! Seed candidates for a topic

use crate::frontier::{CandidateSource, SearchCandidate, SearchMethod};

pub const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
pub const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";
pub const ARXIV_API: &str = "https://export.arxiv.org/api/query";

#[must_use]
pub fn wikipedia_candidate(query: &str, page_size: u32) -> SearchCandidate {
    wikipedia_candidate_at(WIKIPEDIA_API, query, page_size)
}

/// Wikipedia full-text search; `offset` is translated to `sroffset` on fetch.
#[must_use]
pub fn wikipedia_candidate_at(api_url: &str, query: &str, page_size: u32) -> SearchCandidate {
    let cursor = format!(
        "{api_url}?action=query&list=search&format=json&srsearch={}&srlimit={page_size}&offset=0",
        urlencoding::encode(query)
    );
    SearchCandidate::new(CandidateSource::Wikipedia, SearchMethod::Api, cursor, query)
}

#[must_use]
pub fn news_candidate(query: &str) -> SearchCandidate {
    news_candidate_at(GOOGLE_NEWS_RSS, query)
}

#[must_use]
pub fn news_candidate_at(feed_url: &str, query: &str) -> SearchCandidate {
    let cursor = format!(
        "{feed_url}?q={}&hl=en-US&gl=US&ceid=US:en&page=1",
        urlencoding::encode(query)
    );
    SearchCandidate::new(CandidateSource::News, SearchMethod::Rss, cursor, query)
}

#[must_use]
pub fn arxiv_candidate(query: &str, page_size: u32) -> SearchCandidate {
    arxiv_candidate_at(ARXIV_API, query, page_size)
}

#[must_use]
pub fn arxiv_candidate_at(api_url: &str, query: &str, page_size: u32) -> SearchCandidate {
    let cursor = format!(
        "{api_url}?search_query=all:{}&max_results={page_size}&start=0",
        urlencoding::encode(query)
    );
    SearchCandidate::new(CandidateSource::Arxiv, SearchMethod::Search, cursor, query)
}

/// A feed the caller already knows about.
#[must_use]
pub fn rss_candidate(feed_url: &str) -> SearchCandidate {
    SearchCandidate::new(CandidateSource::Rss, SearchMethod::Rss, feed_url, feed_url)
}

/// Wikipedia, news and arXiv searches for `topic`, narrowed by `angle`.
#[must_use]
pub fn topic_candidates(topic: &str, angle: Option<&str>, page_size: u32) -> Vec<SearchCandidate> {
    let query = match angle.map(str::trim).filter(|a| !a.is_empty()) {
        Some(angle) => format!("{} {angle}", topic.trim()),
        None => topic.trim().to_string(),
    };
    vec![
        wikipedia_candidate(&query, page_size),
        news_candidate(&query),
        arxiv_candidate(&query, page_size),
    ]
}
