//! Resolve a search candidate into article URLs

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::frontier::{CandidateSource, SearchCandidate};
use crate::utils::USER_AGENT;

/// Article URL found by a search, with the title the source reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUrl {
    pub url: String,
    pub title_hint: Option<String>,
}

impl ResolvedUrl {
    #[must_use]
    pub fn new(url: impl Into<String>, title_hint: Option<String>) -> Self {
        Self {
            url: url.into(),
            title_hint,
        }
    }
}

#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, candidate: &SearchCandidate) -> Result<Vec<ResolvedUrl>>;
}

#[derive(Debug, Deserialize)]
struct WikiResponse {
    query: Option<WikiQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiHit>,
}

#[derive(Debug, Deserialize)]
struct WikiHit {
    title: String,
}

pub struct HttpSourceResolver {
    client: reqwest::Client,
    max_results: usize,
}

impl HttpSourceResolver {
    pub fn new(timeout: Duration, max_results: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build source resolver client")?;
        Ok(Self {
            client,
            max_results: max_results.max(1),
        })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Source request failed: {url}"))?;
        if !response.status().is_success() {
            bail!("Source {url} returned HTTP {}", response.status());
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read source body: {url}"))?;
        Ok(bytes.to_vec())
    }

    async fn resolve_wikipedia(&self, cursor: &str) -> Result<Vec<ResolvedUrl>> {
        let request_url = wikipedia_request_url(cursor)?;
        let bytes = self.get_bytes(request_url.as_str()).await?;
        let body: WikiResponse =
            serde_json::from_slice(&bytes).context("Failed to parse Wikipedia search response")?;

        let hits = body.query.map(|q| q.search).unwrap_or_default();
        Ok(hits
            .into_iter()
            .map(|hit| {
                let url = wikipedia_article_url(&request_url, &hit.title);
                ResolvedUrl::new(url, Some(hit.title))
            })
            .collect())
    }

    async fn resolve_feed(&self, cursor: &str) -> Result<Vec<ResolvedUrl>> {
        let bytes = self.get_bytes(cursor).await?;
        let feed = feed_rs::parser::parse(&bytes[..]).context("Failed to parse RSS/Atom feed")?;

        Ok(feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let url = entry
                    .links
                    .iter()
                    .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
                    .or_else(|| entry.links.first())
                    .map(|l| l.href.clone())
                    .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
                Some(ResolvedUrl::new(url, entry.title.map(|t| t.content.trim().to_string())))
            })
            .collect())
    }
}

/// Search API request for a Wikipedia cursor; the generic `offset` becomes `sroffset`.
fn wikipedia_request_url(cursor: &str) -> Result<Url> {
    let mut url = Url::parse(cursor).with_context(|| format!("Invalid Wikipedia cursor: {cursor}"))?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let key = if k == "offset" { "sroffset".to_string() } else { k.into_owned() };
            (key, v.into_owned())
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(&pairs);
    Ok(url)
}

fn wikipedia_article_url(api_url: &Url, title: &str) -> String {
    let slug = title.trim().replace(' ', "_");
    let origin = api_url.origin().ascii_serialization();
    format!("{origin}/wiki/{}", urlencoding::encode(&slug))
}

#[async_trait]
impl SourceResolver for HttpSourceResolver {
    async fn resolve(&self, candidate: &SearchCandidate) -> Result<Vec<ResolvedUrl>> {
        debug!(source = candidate.source.as_str(), cursor = %candidate.cursor, "Resolving candidate");

        let mut urls = match candidate.source {
            CandidateSource::Direct => vec![ResolvedUrl::new(candidate.cursor.clone(), None)],
            CandidateSource::Wikipedia => self.resolve_wikipedia(&candidate.cursor).await?,
            CandidateSource::News | CandidateSource::Arxiv | CandidateSource::Rss => {
                self.resolve_feed(&candidate.cursor).await?
            }
        };
        urls.truncate(self.max_results);

        info!(
            source = candidate.source.as_str(),
            query = %candidate.query,
            count = urls.len(),
            "Resolved candidate"
        );
        Ok(urls)
    }
}
