//! Card text for accepted items: summary, key points, quotes

use std::sync::LazyLock;

use regex::Regex;

use crate::store::EnrichedContent;
use crate::utils::{MAX_KEY_POINTS, SUMMARY_MAX_CHARS, collapse_whitespace, truncate_with_ellipsis};
use crate::vetting::VetVerdict;

/// Sentence end: terminal punctuation, optional closing quote or bracket, whitespace
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?]["'\)\]”’]?\s+"#).expect("BUG: hardcoded sentence regex is invalid")
});

/// Leading whole sentences of `text` within `max_chars`.
///
/// A first sentence that is already too long is cut at a word boundary.
#[must_use]
pub fn summarize(text: &str, max_chars: usize) -> String {
    let text = collapse_whitespace(text);
    if text.chars().count() <= max_chars {
        return text;
    }

    let mut end = 0;
    for boundary in SENTENCE_END.find_iter(&text) {
        let candidate = text[..boundary.end()].trim_end();
        if candidate.chars().count() > max_chars {
            break;
        }
        end = candidate.len();
    }

    if end == 0 {
        truncate_with_ellipsis(&text, max_chars)
    } else {
        text[..end].to_string()
    }
}

#[must_use]
pub fn enrich(text: &str, verdict: &VetVerdict) -> EnrichedContent {
    let key_points = verdict
        .facts
        .iter()
        .map(|fact| collapse_whitespace(&fact.text))
        .filter(|fact| !fact.is_empty())
        .take(MAX_KEY_POINTS)
        .collect();

    EnrichedContent {
        summary: summarize(text, SUMMARY_MAX_CHARS),
        key_points,
        quotes: verdict.quotes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vetting::{CitedFact, Quote};

    fn verdict(facts: usize) -> VetVerdict {
        VetVerdict {
            relevance: 0.8,
            quality: 0.7,
            facts: (0..facts)
                .map(|i| CitedFact {
                    text: format!("Fact number {i}"),
                    citation: Some("https://example.com".to_string()),
                })
                .collect(),
            quotes: vec![Quote {
                text: "It was a long day.".to_string(),
                speaker: Some("A. Person".to_string()),
                citation: None,
            }],
            contested: false,
            tags: Vec::new(),
            reason: None,
        }
    }

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(summarize("  One.   Two.  ", 400), "One. Two.");
    }

    #[test]
    fn stops_at_last_sentence_that_fits() {
        let text = "The bridge opened in 1937. It spans the strait. \
                    Engineers still study its design today.";
        assert_eq!(summarize(text, 50), "The bridge opened in 1937. It spans the strait.");
    }

    #[test]
    fn long_first_sentence_is_cut_at_a_word() {
        let text = "word ".repeat(200);
        let summary = summarize(&text, 40);
        assert!(summary.chars().count() <= 40);
        assert!(summary.ends_with('…'));
        assert!(!summary.contains("wor…"));
    }

    #[test]
    fn unbroken_text_stays_within_summary_limit() {
        let summary = summarize(&"x".repeat(600), SUMMARY_MAX_CHARS);
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn key_points_capped_and_quotes_carried() {
        let enriched = enrich("Body text. More body.", &verdict(8));
        assert_eq!(enriched.key_points.len(), MAX_KEY_POINTS);
        assert_eq!(enriched.key_points[0], "Fact number 0");
        assert_eq!(enriched.quotes.len(), 1);
        assert_eq!(enriched.summary, "Body text. More body.");
    }
}
