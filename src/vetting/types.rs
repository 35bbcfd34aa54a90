use serde::{Deserialize, Serialize};

use super::error::VetError;
use crate::utils::MIN_CITED_FACTS;

/// Content handed to the vetting service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VetRequest {
    pub topic: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub url: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedFact {
    pub text: String,
    #[serde(default, alias = "url", alias = "source")]
    pub citation: Option<String>,
}

impl CitedFact {
    #[must_use]
    pub fn is_cited(&self) -> bool {
        !self.text.trim().is_empty() && self.citation.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
}

/// Response as the service sends it; scores may be on 0-1, 0-10 or 0-100.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVetResponse {
    #[serde(default)]
    pub is_relevant: Option<bool>,
    #[serde(default, alias = "relevance")]
    pub relevance_score: f64,
    #[serde(default, alias = "quality")]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub facts: Vec<CitedFact>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default)]
    pub contested: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Normalized vetting outcome; scores are on 0-1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetVerdict {
    pub relevance: f64,
    pub quality: f64,
    pub facts: Vec<CitedFact>,
    pub quotes: Vec<Quote>,
    pub contested: bool,
    pub tags: Vec<String>,
    pub reason: Option<String>,
}

impl VetVerdict {
    /// Normalize a raw response.
    ///
    /// An explicit `is_relevant: false` is a rejection. Fewer than two cited
    /// facts means the service could not ground the content. A missing
    /// quality score takes the relevance score.
    pub fn from_raw(raw: RawVetResponse) -> Result<Self, VetError> {
        if raw.is_relevant == Some(false) {
            return Err(VetError::Rejected {
                reason: raw.reason.unwrap_or_else(|| "not relevant".to_string()),
            });
        }

        let cited: Vec<CitedFact> = raw.facts.into_iter().filter(CitedFact::is_cited).collect();
        if cited.len() < MIN_CITED_FACTS {
            return Err(VetError::InsufficientFacts { found: cited.len() });
        }

        let relevance = normalize_score(raw.relevance_score);
        let quality = raw.quality_score.map_or(relevance, normalize_score);

        Ok(Self {
            relevance,
            quality,
            facts: cited,
            quotes: raw.quotes,
            contested: raw.contested,
            tags: raw.tags,
            reason: raw.reason,
        })
    }

    #[must_use]
    pub fn is_historical(&self) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case("history"))
    }
}

/// Map a score on any of the service's scales onto 0-1.
///
/// Values above 10 are percentages, values above 1 are out of ten.
#[must_use]
pub fn normalize_score(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let scaled = if raw > 10.0 {
        raw / 100.0
    } else if raw > 1.0 {
        raw / 10.0
    } else {
        raw
    };
    scaled.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(text: &str, citation: Option<&str>) -> CitedFact {
        CitedFact {
            text: text.to_string(),
            citation: citation.map(str::to_string),
        }
    }

    #[test]
    fn scales_are_normalized() {
        assert!((normalize_score(0.72) - 0.72).abs() < 1e-9);
        assert!((normalize_score(7.0) - 0.7).abs() < 1e-9);
        assert!((normalize_score(85.0) - 0.85).abs() < 1e-9);
        assert!((normalize_score(10.0) - 1.0).abs() < 1e-9);
        assert_eq!(normalize_score(250.0), 1.0);
        assert_eq!(normalize_score(-3.0), 0.0);
        assert_eq!(normalize_score(f64::NAN), 0.0);
    }

    #[test]
    fn uncited_facts_do_not_count() {
        let raw = RawVetResponse {
            relevance_score: 8.0,
            facts: vec![fact("one", Some("https://a.example")), fact("two", None), fact("three", Some(" "))],
            ..Default::default()
        };
        assert!(matches!(
            VetVerdict::from_raw(raw),
            Err(VetError::InsufficientFacts { found: 1 })
        ));
    }

    #[test]
    fn explicit_rejection() {
        let raw = RawVetResponse {
            is_relevant: Some(false),
            reason: Some("off topic".to_string()),
            ..Default::default()
        };
        match VetVerdict::from_raw(raw) {
            Err(VetError::Rejected { reason }) => assert_eq!(reason, "off topic"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn quality_defaults_to_relevance() {
        let raw = RawVetResponse {
            relevance_score: 72.0,
            facts: vec![fact("one", Some("https://a.example")), fact("two", Some("https://b.example"))],
            tags: vec!["History".to_string()],
            ..Default::default()
        };
        let verdict = VetVerdict::from_raw(raw).expect("valid verdict");
        assert!((verdict.relevance - 0.72).abs() < 1e-9);
        assert_eq!(verdict.quality, verdict.relevance);
        assert!(verdict.is_historical());
    }
}
