//! URL canonicalization
//!
//! A canonical URL is the dedup identity of a page: redirects resolved,
//! tracking parameters removed, host lower-cased, fragment and default port
//! dropped, trailing slash trimmed, remaining query pairs sorted.
//!
//! Canonicalization never fails. When redirect resolution errors or times
//! out, the input is normalized syntactically instead.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::{MAX_REDIRECTS, USER_AGENT, strip_www};

/// Exact query keys that only carry attribution
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "yclid", "mc_cid", "mc_eid", "igshid", "ref",
    "ref_src", "_ga", "_hsenc", "_hsmi", "spm", "cmpid", "ocid", "smid",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalUrl {
    pub canonical_url: String,
    /// Host of the canonical URL without `www.`
    pub final_domain: String,
    pub original_url: String,
}

/// Resolves redirects (when a client is configured) and normalizes URLs
#[derive(Clone)]
pub struct Canonicalizer {
    client: Option<reqwest::Client>,
}

impl Canonicalizer {
    /// Canonicalizer that follows redirects with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build canonicalizer HTTP client")?;
        Ok(Self {
            client: Some(client),
        })
    }

    /// Offline canonicalizer: syntactic normalization only.
    #[must_use]
    pub fn syntactic() -> Self {
        Self { client: None }
    }

    pub async fn canonicalize(&self, url: &str) -> CanonicalUrl {
        let resolved = match &self.client {
            Some(client) => match resolve_redirects(client, url.trim()).await {
                Ok(final_url) => final_url,
                Err(e) => {
                    log::debug!("Redirect resolution failed for {url}, normalizing as-is: {e:#}");
                    url.trim().to_string()
                }
            },
            None => url.trim().to_string(),
        };

        build(url, &resolved)
    }

    /// Normalization without touching the network.
    #[must_use]
    pub fn canonicalize_offline(url: &str) -> CanonicalUrl {
        build(url, url.trim())
    }
}

fn build(original: &str, resolved: &str) -> CanonicalUrl {
    let canonical_url = normalize_syntactic(resolved);
    let final_domain = Url::parse(&canonical_url)
        .ok()
        .and_then(|u| u.host_str().map(strip_www))
        .unwrap_or_default();
    CanonicalUrl {
        canonical_url,
        final_domain,
        original_url: original.to_string(),
    }
}

async fn resolve_redirects(client: &reqwest::Client, url: &str) -> Result<String> {
    Url::parse(url).with_context(|| format!("Not an absolute URL: {url}"))?;

    let response = client
        .head(url)
        .send()
        .await
        .context("HEAD request failed")?;

    if matches!(
        response.status(),
        StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    ) {
        let response = client.get(url).send().await.context("GET request failed")?;
        return Ok(response.url().to_string());
    }

    Ok(response.url().to_string())
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Syntactic normalization of a URL string.
///
/// Unparseable input comes back trimmed and lower-cased.
#[must_use]
pub fn normalize_syntactic(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_lowercase();
    };

    parsed.set_fragment(None);

    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(&kept);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed_path = path.trim_end_matches('/');
        parsed.set_path(if trimmed_path.is_empty() { "/" } else { trimmed_path });
    }

    parsed.to_string()
}
