//! Hero image resolution for discovered items

pub mod ai;
pub mod entity;
pub mod pipeline;
pub mod skeleton;
pub mod types;
pub mod wikimedia;

pub use ai::{HttpImageGenerator, StylePreset};
pub use entity::extract_entity;
pub use pipeline::HeroPipeline;
pub use skeleton::skeleton_hero;
pub use types::{
    GeneratedImage, HeroImageResult, HeroInput, HeroSink, HeroSource, ImageGenerator, ImageRequest,
    WikimediaImage, WikimediaSearch,
};
pub use wikimedia::CommonsClient;
