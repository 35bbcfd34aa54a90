//! Page fetch and extraction

pub mod extract;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use extract::{ExtractedContent, extract_content};

use crate::utils::USER_AGENT;

/// Largest body read from a page; the rest is dropped
pub const MAX_PAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub status: u16,
    pub final_url: String,
    pub title: String,
    pub headings: Vec<String>,
    pub text: String,
}

impl FetchedPage {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch and extract `url`. Non-2xx responses come back as a page with
    /// that status and no text; only transport failures are errors.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build page fetcher client")?;
        Ok(Self { client })
    }
}

fn is_html(content_type: Option<&str>) -> bool {
    content_type.is_none_or(|ct| {
        let ct = ct.to_ascii_lowercase();
        ct.contains("html") || ct.contains("xml") || ct.starts_with("text/")
    })
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !response.status().is_success() {
            warn!(url, status, "Page returned non-success status");
            return Ok(FetchedPage {
                status,
                final_url,
                ..Default::default()
            });
        }
        if !is_html(content_type.as_deref()) {
            debug!(url, content_type = ?content_type, "Skipping non-HTML body");
            return Ok(FetchedPage {
                status,
                final_url,
                ..Default::default()
            });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("Failed reading body of {url}"))?;
            let room = MAX_PAGE_BYTES.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= MAX_PAGE_BYTES {
                warn!(url, "Page body exceeds {MAX_PAGE_BYTES} bytes, truncating");
                break;
            }
        }

        let html = String::from_utf8_lossy(&body);
        let content = extract_content(&html);
        debug!(url, chars = content.text.chars().count(), "Extracted page");

        Ok(FetchedPage {
            status,
            final_url,
            title: content.title,
            headings: content.headings,
            text: content.text,
        })
    }
}
