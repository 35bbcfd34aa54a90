//! HTTP client for the image generation service
//!
//! The service takes `{prompt, seed, style}` on `POST /generate` and answers
//! with a base64 PNG, an optional public URL and generation metadata.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use super::types::{GeneratedImage, ImageGenerator, ImageRequest};
use crate::utils::USER_AGENT;

/// Style presets the generator understands, with their native output size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    PhotorealPortrait,
    Cinematic,
    Editorial,
    Street,
    Neon,
    Watercolor,
    ArtDecoPoster,
    Anime,
}

impl StylePreset {
    /// Unknown names fall back to the portrait preset, as the service does.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "cinematic" => Self::Cinematic,
            "editorial" => Self::Editorial,
            "street" => Self::Street,
            "neon" => Self::Neon,
            "watercolor" => Self::Watercolor,
            "art_deco_poster" => Self::ArtDecoPoster,
            "anime" => Self::Anime,
            _ => Self::PhotorealPortrait,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PhotorealPortrait => "photoreal_portrait",
            Self::Cinematic => "cinematic",
            Self::Editorial => "editorial",
            Self::Street => "street",
            Self::Neon => "neon",
            Self::Watercolor => "watercolor",
            Self::ArtDecoPoster => "art_deco_poster",
            Self::Anime => "anime",
        }
    }

    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            Self::Editorial => (1024, 1280),
            Self::ArtDecoPoster => (1024, 1536),
            _ => (1024, 1024),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    seed: u32,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateMeta {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    image_base64: Option<String>,
    public_url: Option<String>,
    meta: Option<GenerateMeta>,
}

pub struct HttpImageGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpImageGenerator {
    /// `base_url` is the service root; requests go to `{base_url}/generate`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build image generator client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/generate", base_url.trim_end_matches('/')),
        })
    }
}

/// Prompt text sent to the generator.
#[must_use]
pub fn build_prompt(request: &ImageRequest) -> String {
    let description = request.description.trim();
    if description.is_empty() {
        format!("Editorial illustration: {}", request.title.trim())
    } else {
        format!("Editorial illustration: {}. {}", request.title.trim(), description)
    }
}

/// Stable seed so a title regenerates the same image.
#[must_use]
pub fn seed_for(title: &str) -> u32 {
    (xxh3_64(title.as_bytes()) % u64::from(u32::MAX)) as u32
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage> {
        let preset = StylePreset::from_name(&request.style);
        let prompt = build_prompt(&request);
        let body = GenerateBody {
            prompt: &prompt,
            seed: seed_for(&request.title),
            style: preset.name(),
        };

        debug!(endpoint = %self.endpoint, style = preset.name(), "Requesting generated hero");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("Image generation request failed")?;

        if !response.status().is_success() {
            bail!("Image generation returned HTTP {}", response.status());
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Image generation response was not valid JSON")?;

        let image_url = match (parsed.public_url, parsed.image_base64) {
            (Some(url), _) if !url.trim().is_empty() => url,
            (_, Some(b64)) if !b64.is_empty() => format!("data:image/png;base64,{b64}"),
            _ => bail!("Image generation response carried no image"),
        };

        let (default_w, default_h) = preset.resolution();
        let meta = parsed.meta.unwrap_or(GenerateMeta {
            width: None,
            height: None,
        });

        Ok(GeneratedImage {
            success: true,
            image_url: Some(image_url),
            width: meta.width.unwrap_or(default_w),
            height: meta.height.unwrap_or(default_h),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ImageRequest {
        ImageRequest {
            title: "Harbour festival returns".to_string(),
            description: "Boats and lanterns".to_string(),
            style: "editorial".to_string(),
        }
    }

    #[test]
    fn unknown_style_falls_back() {
        assert_eq!(StylePreset::from_name("vaporwave"), StylePreset::PhotorealPortrait);
        assert_eq!(StylePreset::from_name("art_deco_poster").resolution(), (1024, 1536));
    }

    #[tokio::test]
    async fn prefers_public_url() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/generate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({"style": "editorial"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"image_base64":"AAAA","public_url":"https://cdn.example/h.png","meta":{"width":1024,"height":1280}}"#)
            .create_async()
            .await;

        let generator = HttpImageGenerator::new(&server.url(), Duration::from_secs(5))?;
        let image = generator.generate(request()).await?;
        assert_eq!(image.image_url.as_deref(), Some("https://cdn.example/h.png"));
        assert_eq!((image.width, image.height), (1024, 1280));
        Ok(())
    }

    #[tokio::test]
    async fn base64_only_becomes_data_url() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"image_base64":"iVBORw0K","public_url":null,"meta":{}}"#)
            .create_async()
            .await;

        let generator = HttpImageGenerator::new(&server.url(), Duration::from_secs(5))?;
        let image = generator.generate(request()).await?;
        assert_eq!(image.image_url.as_deref(), Some("data:image/png;base64,iVBORw0K"));
        assert_eq!(image.height, 1280);
        Ok(())
    }

    #[tokio::test]
    async fn server_error_is_an_error() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/generate")
            .with_status(500)
            .create_async()
            .await;
        let generator = HttpImageGenerator::new(&server.url(), Duration::from_secs(5))?;
        assert!(generator.generate(request()).await.is_err());
        Ok(())
    }
}
