//! Three-stage hero resolution: generated image, Commons photo, skeleton

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::entity::extract_entity;
use super::skeleton::skeleton_hero;
use super::types::{HeroImageResult, HeroInput, HeroSink, HeroSource, ImageGenerator, ImageRequest, WikimediaSearch};
use crate::utils::DEFAULT_HERO_AI_TIMEOUT_SECS;

const WIKIMEDIA_RESULT_LIMIT: usize = 3;
const DEFAULT_STYLE: &str = "editorial";

pub struct HeroPipeline {
    generator: Option<Arc<dyn ImageGenerator>>,
    wikimedia: Option<Arc<dyn WikimediaSearch>>,
    sink: Option<Arc<dyn HeroSink>>,
    known_entities: Vec<String>,
    ai_timeout: Duration,
    style: String,
}

impl Default for HeroPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl HeroPipeline {
    /// Pipeline with no collaborators: every hero is a skeleton.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generator: None,
            wikimedia: None,
            sink: None,
            known_entities: Vec::new(),
            ai_timeout: Duration::from_secs(DEFAULT_HERO_AI_TIMEOUT_SECS),
            style: DEFAULT_STYLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn with_wikimedia(mut self, wikimedia: Arc<dyn WikimediaSearch>) -> Self {
        self.wikimedia = Some(wikimedia);
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn HeroSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn known_entities(mut self, entities: Vec<String>) -> Self {
        self.known_entities = entities;
        self
    }

    #[must_use]
    pub fn ai_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = timeout;
        self
    }

    #[must_use]
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Resolve a hero for `input`. Always yields an image.
    pub async fn assign_hero(&self, input: &HeroInput) -> HeroImageResult {
        if let Some(hero) = self.try_generated(input).await {
            return hero;
        }
        if let Some(hero) = self.try_wikimedia(input).await {
            return hero;
        }
        debug!("Falling back to skeleton hero for '{}'", input.title);
        skeleton_hero(&input.title)
    }

    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Resolve a hero for a stored item and hand it to the sink when it
    /// beats a skeleton.
    ///
    /// Returns the saved hero. `None` means only a skeleton was found, no
    /// sink is configured, or the sink failed; failures are logged.
    pub async fn assign_and_save(&self, item_id: &str, input: &HeroInput) -> Option<HeroImageResult> {
        let sink = self.sink.as_ref()?;
        let hero = self.assign_hero(input).await;
        if hero.source == HeroSource::Skeleton {
            debug!("No upgrade over skeleton hero for item {item_id}");
            return None;
        }
        match sink.save_hero(item_id, &hero).await {
            Ok(()) => Some(hero),
            Err(e) => {
                warn!("Failed to save hero for item {item_id}: {e:#}");
                None
            }
        }
    }

    async fn try_generated(&self, input: &HeroInput) -> Option<HeroImageResult> {
        let generator = self.generator.as_ref()?;
        let request = ImageRequest {
            title: input.title.clone(),
            description: input.summary.clone().unwrap_or_default(),
            style: self.style.clone(),
        };

        match tokio::time::timeout(self.ai_timeout, generator.generate(request)).await {
            Ok(Ok(image)) if image.success => {
                let url = image.image_url.filter(|u| !u.trim().is_empty())?;
                info!("Generated hero for '{}'", input.title);
                Some(HeroImageResult {
                    url,
                    source: HeroSource::Ai,
                    width: image.width,
                    height: image.height,
                    alt: input.title.clone(),
                    dominant_color: None,
                })
            }
            Ok(Ok(_)) => {
                debug!("Image generator reported no image for '{}'", input.title);
                None
            }
            Ok(Err(e)) => {
                warn!("Image generation failed for '{}': {e:#}", input.title);
                None
            }
            Err(_) => {
                warn!(
                    "Image generation timed out after {:?} for '{}'",
                    self.ai_timeout, input.title
                );
                None
            }
        }
    }

    fn search_query(&self, input: &HeroInput) -> Option<String> {
        input
            .entity
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| extract_entity(&input.title, &self.known_entities))
            .or_else(|| input.topic.clone().filter(|t| !t.trim().is_empty()))
    }

    async fn try_wikimedia(&self, input: &HeroInput) -> Option<HeroImageResult> {
        let wikimedia = self.wikimedia.as_ref()?;
        let query = self.search_query(input)?;

        match wikimedia.search(&query, WIKIMEDIA_RESULT_LIMIT).await {
            Ok(images) => {
                let image = images.into_iter().next()?;
                info!("Using Commons image '{}' for '{}'", image.title, input.title);
                Some(HeroImageResult {
                    url: image.thumbnail.unwrap_or(image.url),
                    source: HeroSource::Wikimedia,
                    width: image.width,
                    height: image.height,
                    alt: format!("{query}: {}", input.title),
                    dominant_color: None,
                })
            }
            Err(e) => {
                warn!("Commons search for '{query}' failed: {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::types::{GeneratedImage, WikimediaImage};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FailingGenerator;

    #[async_trait]
    impl ImageGenerator for FailingGenerator {
        async fn generate(&self, _request: ImageRequest) -> Result<GeneratedImage> {
            Err(anyhow!("service unavailable"))
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl ImageGenerator for SlowGenerator {
        async fn generate(&self, _request: ImageRequest) -> Result<GeneratedImage> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(anyhow!("unreachable"))
        }
    }

    struct WorkingGenerator;

    #[async_trait]
    impl ImageGenerator for WorkingGenerator {
        async fn generate(&self, _request: ImageRequest) -> Result<GeneratedImage> {
            Ok(GeneratedImage {
                success: true,
                image_url: Some("https://img.example/gen.png".to_string()),
                width: 1024,
                height: 1024,
            })
        }
    }

    #[derive(Default)]
    struct RecordingCommons {
        queries: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl WikimediaSearch for RecordingCommons {
        async fn search(&self, query: &str, _limit: usize) -> Result<Vec<WikimediaImage>> {
            self.queries.lock().expect("lock").push(query.to_string());
            if self.fail {
                return Err(anyhow!("commons down"));
            }
            Ok(vec![WikimediaImage {
                url: "https://upload.example/full.jpg".to_string(),
                thumbnail: Some("https://upload.example/thumb.jpg".to_string()),
                width: 1200,
                height: 800,
                title: "File:Bridge.jpg".to_string(),
            }])
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl HeroSink for BrokenSink {
        async fn save_hero(&self, _item_id: &str, _hero: &HeroImageResult) -> Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    #[tokio::test]
    async fn all_collaborators_failing_gives_skeleton() {
        let pipeline = HeroPipeline::new()
            .with_generator(Arc::new(FailingGenerator))
            .with_wikimedia(Arc::new(RecordingCommons {
                fail: true,
                ..Default::default()
            }));
        let hero = pipeline.assign_hero(&HeroInput::new("Golden Gate Bridge reopens")).await;
        assert_eq!(hero.source, HeroSource::Skeleton);
        assert!(hero.url.starts_with("data:image/svg+xml;base64,"));
        assert_eq!((hero.width, hero.height), (1200, 630));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generator_times_out() {
        let pipeline = HeroPipeline::new().with_generator(Arc::new(SlowGenerator));
        let hero = pipeline.assign_hero(&HeroInput::new("Slow news day")).await;
        assert_eq!(hero.source, HeroSource::Skeleton);
    }

    #[tokio::test]
    async fn generated_image_wins() {
        let commons = Arc::new(RecordingCommons::default());
        let pipeline = HeroPipeline::new()
            .with_generator(Arc::new(WorkingGenerator))
            .with_wikimedia(commons.clone());
        let hero = pipeline.assign_hero(&HeroInput::new("Golden Gate Bridge reopens")).await;
        assert_eq!(hero.source, HeroSource::Ai);
        assert_eq!(hero.url, "https://img.example/gen.png");
        assert!(commons.queries.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn commons_used_with_extracted_entity() {
        let commons = Arc::new(RecordingCommons::default());
        let pipeline = HeroPipeline::new()
            .with_generator(Arc::new(FailingGenerator))
            .with_wikimedia(commons.clone());
        let hero = pipeline
            .assign_hero(&HeroInput::new("The Golden Gate Bridge closes for repairs"))
            .await;
        assert_eq!(hero.source, HeroSource::Wikimedia);
        assert_eq!(hero.url, "https://upload.example/thumb.jpg");
        assert_eq!(
            commons.queries.lock().expect("lock").as_slice(),
            ["Golden Gate Bridge".to_string()]
        );
    }

    #[tokio::test]
    async fn topic_is_last_resort_query() {
        let commons = Arc::new(RecordingCommons::default());
        let pipeline = HeroPipeline::new().with_wikimedia(commons.clone());
        let mut input = HeroInput::new("quiet day at the market");
        input.topic = Some("farmers markets".to_string());
        pipeline.assign_hero(&input).await;
        assert_eq!(
            commons.queries.lock().expect("lock").as_slice(),
            ["farmers markets".to_string()]
        );
    }

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<(String, HeroSource)>>,
    }

    #[async_trait]
    impl HeroSink for RecordingSink {
        async fn save_hero(&self, item_id: &str, hero: &HeroImageResult) -> Result<()> {
            self.saved
                .lock()
                .expect("lock")
                .push((item_id.to_string(), hero.source));
            Ok(())
        }
    }

    #[tokio::test]
    async fn sink_failure_is_not_fatal() {
        let pipeline = HeroPipeline::new()
            .with_generator(Arc::new(WorkingGenerator))
            .with_sink(Arc::new(BrokenSink));
        assert!(pipeline.assign_and_save("item-1", &HeroInput::new("Anything")).await.is_none());
    }

    #[tokio::test]
    async fn only_upgrades_reach_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let skeleton_only = HeroPipeline::new().with_sink(sink.clone());
        assert!(skeleton_only.assign_and_save("item-1", &HeroInput::new("Anything")).await.is_none());
        assert!(sink.saved.lock().expect("lock").is_empty());

        let generating = HeroPipeline::new()
            .with_generator(Arc::new(WorkingGenerator))
            .with_sink(sink.clone());
        let hero = generating.assign_and_save("item-2", &HeroInput::new("Anything")).await;
        assert_eq!(hero.map(|h| h.source), Some(HeroSource::Ai));
        assert_eq!(
            sink.saved.lock().expect("lock").as_slice(),
            [("item-2".to_string(), HeroSource::Ai)]
        );
    }
}
