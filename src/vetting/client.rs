//! HTTP client for the relevance/vetting service

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::VetError;
use super::types::{RawVetResponse, VetRequest, VetVerdict};
use crate::utils::USER_AGENT;
use crate::utils::string_utils::safe_truncate_chars;

/// Upper bound on body text sent for scoring
const MAX_VET_TEXT_CHARS: usize = 12_000;

/// Scores content against a topic
#[async_trait]
pub trait Vetter: Send + Sync {
    async fn vet(&self, request: VetRequest) -> Result<VetVerdict, VetError>;
}

pub struct HttpVetter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpVetter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, VetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[async_trait]
impl Vetter for HttpVetter {
    async fn vet(&self, mut request: VetRequest) -> Result<VetVerdict, VetError> {
        let original_len = request.text.chars().count();
        if original_len > MAX_VET_TEXT_CHARS {
            request.text = safe_truncate_chars(&request.text, MAX_VET_TEXT_CHARS).to_string();
        }

        debug!(url = %request.url, chars = original_len, "Submitting content for vetting");
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %request.url, %status, "Vetting service returned an error status");
            return Err(VetError::Transport(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await?;
        let raw: RawVetResponse = serde_json::from_slice(&bytes)?;
        VetVerdict::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request() -> VetRequest {
        VetRequest {
            topic: "Tidal energy".to_string(),
            aliases: vec!["tidal power".to_string()],
            url: "https://news.example/tidal".to_string(),
            title: "Tidal energy pilot expands".to_string(),
            text: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn scores_are_normalized_from_percentages() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/vet")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(serde_json::json!({"topic": "Tidal energy"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"is_relevant":true,"relevance_score":82,"quality_score":64,
                    "facts":[{"text":"Output doubled","citation":"https://a.example"},
                             {"text":"Six turbines","url":"https://b.example"}],
                    "quotes":[{"text":"A turning point","speaker":"Engineer"}],
                    "contested":true,"tags":["energy"]}"#,
            )
            .create_async()
            .await;

        let vetter = HttpVetter::new(format!("{}/vet", server.url()), Duration::from_secs(5))
            .expect("client")
            .with_api_key("secret");
        let verdict = vetter.vet(request()).await.expect("verdict");
        assert!((verdict.relevance - 0.82).abs() < 1e-9);
        assert!((verdict.quality - 0.64).abs() < 1e-9);
        assert_eq!(verdict.facts.len(), 2);
        assert!(verdict.contested);
        assert_eq!(verdict.quotes[0].speaker.as_deref(), Some("Engineer"));
    }

    #[tokio::test]
    async fn insufficient_facts_surface_as_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/vet")
            .with_status(200)
            .with_body(r#"{"relevance_score":0.9,"facts":[{"text":"Only one","citation":"https://a.example"}]}"#)
            .create_async()
            .await;

        let vetter = HttpVetter::new(format!("{}/vet", server.url()), Duration::from_secs(5)).expect("client");
        assert!(matches!(
            vetter.vet(request()).await,
            Err(VetError::InsufficientFacts { found: 1 })
        ));
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("POST", "/vet").with_status(503).create_async().await;

        let vetter = HttpVetter::new(format!("{}/vet", server.url()), Duration::from_secs(5)).expect("client");
        assert!(matches!(vetter.vet(request()).await, Err(VetError::Transport(_))));
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/vet")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let vetter = HttpVetter::new(format!("{}/vet", server.url()), Duration::from_secs(5)).expect("client");
        assert!(matches!(vetter.vet(request()).await, Err(VetError::InvalidResponse(_))));
    }
}
