//! Wikimedia Commons image search over the MediaWiki API

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::types::{WikimediaImage, WikimediaSearch};
use crate::utils::USER_AGENT;

pub const COMMONS_API: &str = "https://commons.wikimedia.org/w/api.php";
const THUMB_WIDTH: u32 = 1200;

/// Extensions the hero card can display
const DISPLAYABLE: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: HashMap<String, ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    index: u32,
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    thumburl: Option<String>,
}

pub struct CommonsClient {
    client: reqwest::Client,
    api_url: String,
}

impl CommonsClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_api_url(COMMONS_API, timeout)
    }

    /// Point the client at another MediaWiki endpoint.
    pub fn with_api_url(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build Commons client")?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }
}

fn is_displayable(url: &str) -> bool {
    let lower = url.to_lowercase();
    DISPLAYABLE.iter().any(|ext| lower.ends_with(ext))
}

#[async_trait]
impl WikimediaSearch for CommonsClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WikimediaImage>> {
        if query.trim().is_empty() {
            bail!("Empty Commons query");
        }
        let limit = limit.max(1).to_string();
        let thumb = THUMB_WIDTH.to_string();

        debug!(query, "Searching Wikimedia Commons");
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("generator", "search"),
                ("gsrnamespace", "6"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "imageinfo"),
                ("iiprop", "url|size"),
                ("iiurlwidth", thumb.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .context("Commons search request failed")?;

        if !response.status().is_success() {
            bail!("Commons search returned HTTP {}", response.status());
        }

        let body: ApiResponse = response
            .json()
            .await
            .context("Commons search response was not valid JSON")?;

        let mut pages: Vec<ApiPage> = body
            .query
            .map(|q| q.pages.into_values().collect())
            .unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        let images = pages
            .into_iter()
            .filter_map(|page| {
                let info = page.imageinfo.into_iter().next()?;
                if !is_displayable(&info.url) {
                    return None;
                }
                Some(WikimediaImage {
                    url: info.url,
                    thumbnail: info.thumburl,
                    width: info.width,
                    height: info.height,
                    title: page.title,
                })
            })
            .collect();
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn parses_pages_in_search_order() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("gsrsearch".into(), "Golden Gate Bridge".into()),
                Matcher::UrlEncoded("gsrnamespace".into(), "6".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"query":{"pages":{
                    "20":{"index":2,"title":"File:Second.png","imageinfo":[{"url":"https://upload.example/Second.png","width":800,"height":600}]},
                    "10":{"index":1,"title":"File:First.jpg","imageinfo":[{"url":"https://upload.example/First.jpg","width":4000,"height":3000,"thumburl":"https://upload.example/thumb/First.jpg"}]},
                    "30":{"index":3,"title":"File:Map.pdf","imageinfo":[{"url":"https://upload.example/Map.pdf","width":1,"height":1}]}
                }}}"#,
            )
            .create_async()
            .await;

        let client = CommonsClient::with_api_url(&format!("{}/w/api.php", server.url()), Duration::from_secs(5))?;
        let images = client.search("Golden Gate Bridge", 3).await?;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].title, "File:First.jpg");
        assert_eq!(images[0].thumbnail.as_deref(), Some("https://upload.example/thumb/First.jpg"));
        assert_eq!(images[1].width, 800);
        Ok(())
    }

    #[tokio::test]
    async fn no_results_is_empty() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"batchcomplete":""}"#)
            .create_async()
            .await;

        let client = CommonsClient::with_api_url(&format!("{}/w/api.php", server.url()), Duration::from_secs(5))?;
        assert!(client.search("nothing here", 3).await?.is_empty());
        Ok(())
    }
}
