use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroSource {
    Ai,
    Wikimedia,
    Skeleton,
}

impl HeroSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Wikimedia => "wikimedia",
            Self::Skeleton => "skeleton",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ai" => Some(Self::Ai),
            "wikimedia" => Some(Self::Wikimedia),
            "skeleton" => Some(Self::Skeleton),
            _ => None,
        }
    }
}

/// Displayable image descriptor attached to a discovered item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroImageResult {
    pub url: String,
    pub source: HeroSource,
    pub width: u32,
    pub height: u32,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroInput {
    pub title: String,
    pub summary: Option<String>,
    pub topic: Option<String>,
    pub entity: Option<String>,
}

impl HeroInput {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub title: String,
    pub description: String,
    pub style: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub success: bool,
    pub image_url: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikimediaImage {
    pub url: String,
    pub thumbnail: Option<String>,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

/// Image generation service
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage>;
}

/// Wikimedia Commons image search
#[async_trait]
pub trait WikimediaSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WikimediaImage>>;
}

/// Receives the chosen hero for an item
#[async_trait]
pub trait HeroSink: Send + Sync {
    async fn save_hero(&self, item_id: &str, hero: &HeroImageResult) -> Result<()>;
}
