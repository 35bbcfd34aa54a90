use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a candidate's URLs come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Wikipedia,
    News,
    Arxiv,
    Rss,
    Direct,
}

impl CandidateSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wikipedia => "wikipedia",
            Self::News => "news",
            Self::Arxiv => "arxiv",
            Self::Rss => "rss",
            Self::Direct => "direct",
        }
    }
}

/// How the cursor paginates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// `page` query parameter, +1 per advance
    Rss,
    /// `offset` query parameter, +page size per advance
    Api,
    /// `start` query parameter, +page size per advance
    Search,
    /// Single URL, never advances
    Direct,
}

impl SearchMethod {
    #[must_use]
    pub fn pagination_param(&self) -> Option<&'static str> {
        match self {
            Self::Rss => Some("page"),
            Self::Api => Some("offset"),
            Self::Search => Some("start"),
            Self::Direct => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub source: CandidateSource,
    pub method: SearchMethod,
    /// URL whose pagination parameter encodes the position
    pub cursor: String,
    /// Human-readable query, carried into events
    pub query: String,
    pub priority: f64,
    pub last_seen: Option<DateTime<Utc>>,
    pub duplicate_rate: f64,
    pub domain: String,
    /// Consecutive attempts that resolved no usable URL
    pub empty_yields: u32,
}

impl SearchCandidate {
    #[must_use]
    pub fn new(
        source: CandidateSource,
        method: SearchMethod,
        cursor: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        let cursor = cursor.into();
        let domain = crate::utils::extract_domain(&cursor);
        Self {
            source,
            method,
            cursor,
            query: query.into(),
            priority: 0.0,
            last_seen: None,
            duplicate_rate: 0.0,
            domain,
            empty_yields: 0,
        }
    }

    /// A single citation URL.
    #[must_use]
    pub fn direct(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(CandidateSource::Direct, SearchMethod::Direct, url.clone(), url)
    }

    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.method == SearchMethod::Direct
    }
}
