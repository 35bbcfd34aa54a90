//! Deterministic placeholder hero: gradient SVG with the title overlaid

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use xxhash_rust::xxh3::xxh3_64;

use super::types::{HeroImageResult, HeroSource};
use crate::utils::string_utils::truncate_with_ellipsis;

pub const SKELETON_WIDTH: u32 = 1200;
pub const SKELETON_HEIGHT: u32 = 630;
const MAX_TITLE_CHARS: usize = 80;

/// Two-stop gradients; a title always maps to the same entry
pub const PALETTES: &[(&str, &str)] = &[
    ("#FF6B35", "#F7C59F"),
    ("#2E86AB", "#A23B72"),
    ("#1B998B", "#2D3047"),
    ("#E84855", "#403F4C"),
    ("#3A86FF", "#8338EC"),
    ("#FB5607", "#FFBE0B"),
    ("#06D6A0", "#118AB2"),
    ("#EF476F", "#073B4C"),
];

#[must_use]
pub fn palette_for(title: &str) -> (&'static str, &'static str) {
    let index = (xxh3_64(title.as_bytes()) % PALETTES.len() as u64) as usize;
    PALETTES[index]
}

#[must_use]
pub fn render_svg(title: &str) -> String {
    let (start, end) = palette_for(title);
    let label = html_escape::encode_text(&truncate_with_ellipsis(title.trim(), MAX_TITLE_CHARS)).to_string();
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><defs><linearGradient id="g" x1="0" y1="0" x2="1" y2="1"><stop offset="0%" stop-color="{start}"/><stop offset="100%" stop-color="{end}"/></linearGradient></defs><rect width="100%" height="100%" fill="url(#g)"/><text x="60" y="{y}" font-family="Helvetica, Arial, sans-serif" font-size="48" font-weight="700" fill="#FFFFFF">{label}</text></svg>"##,
        w = SKELETON_WIDTH,
        h = SKELETON_HEIGHT,
        y = SKELETON_HEIGHT / 2,
    )
}

/// Build the skeleton hero. Has no failure path.
#[must_use]
pub fn skeleton_hero(title: &str) -> HeroImageResult {
    let (start, _) = palette_for(title);
    let svg = render_svg(title);
    HeroImageResult {
        url: format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes())),
        source: HeroSource::Skeleton,
        width: SKELETON_WIDTH,
        height: SKELETON_HEIGHT,
        alt: title.trim().to_string(),
        dominant_color: Some(start.to_string()),
    }
}
