//! Tests for the type-safe discovery configuration builder

use std::time::Duration;

use carrot_discovery::config::DiscoveryConfig;

#[test]
fn test_builder_requires_patch_id_and_topic() {
    // Does not compile without both required fields:
    // let config = DiscoveryConfig::builder().build();
    // let config = DiscoveryConfig::builder().patch_id("p1").build();

    let config = DiscoveryConfig::builder()
        .patch_id("patch-1")
        .topic("Golden Gate Bridge")
        .build()
        .unwrap();

    assert_eq!(config.patch_id(), "patch-1");
    assert_eq!(config.topic(), "Golden Gate Bridge");
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let config = DiscoveryConfig::builder()
        .patch_id("p")
        .topic("t")
        .build()
        .unwrap();

    assert!(config.aliases().is_empty());
    assert_eq!(config.max_items(), 10);
    assert_eq!(config.run_timeout(), Duration::from_secs(300));
    assert_eq!(config.frontier_capacity(), 50);
    let weights = config.frontier_weights();
    assert!((weights.novelty - 0.4).abs() < f64::EPSILON);
    assert!((weights.penalty - 0.2).abs() < f64::EPSILON);
    assert!((weights.diversity - 0.4).abs() < f64::EPSILON);
    assert_eq!(config.min_content_length(), 500);
    assert!((config.min_relevance() - 0.6).abs() < f64::EPSILON);
    assert!((config.min_quality() - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
    assert_eq!(config.canonicalize_timeout(), Duration::from_secs(5));
    assert_eq!(config.hero_ai_timeout(), Duration::from_secs(5));
    assert_eq!(config.priority_burst_size(), 3);
    assert_eq!(config.max_empty_yields(), 3);
    assert!(config.circuit_breaker_enabled());
    assert_eq!(config.hero_style(), "editorial");
    assert!(config.user_agent().starts_with("carrot-discovery/"));
}

#[test]
fn test_builder_with_optional_fields() {
    let config = DiscoveryConfig::builder()
        .patch_id("p")
        .topic("Apollo 11")
        .aliases(vec!["Apollo XI".to_string(), "  ".to_string()])
        .max_items(3)
        .max_items(4)
        .thresholds(0.7, 0.6)
        .soft_thresholds(0.4, 0.3)
        .circuit_breaker(false)
        .hero_style("vintage_film")
        .build()
        .unwrap();

    assert_eq!(config.aliases(), ["Apollo XI".to_string()]);
    assert_eq!(config.max_items(), 4);
    assert!((config.min_relevance() - 0.7).abs() < f64::EPSILON);
    assert!(!config.circuit_breaker_enabled());
    assert_eq!(config.hero_style(), "vintage_film");

    let terms: Vec<&str> = config.entity_terms().collect();
    assert_eq!(terms, vec!["Apollo 11", "Apollo XI"]);
}

#[test]
fn test_validation_rejects_bad_values() {
    let blank = DiscoveryConfig::builder().patch_id("  ").topic("t").build();
    assert!(blank.is_err());

    let out_of_range = DiscoveryConfig::builder()
        .patch_id("p")
        .topic("t")
        .thresholds(1.5, 0.5)
        .build();
    assert!(out_of_range.is_err());

    let soft_above_hard = DiscoveryConfig::builder()
        .patch_id("p")
        .topic("t")
        .thresholds(0.5, 0.5)
        .soft_thresholds(0.8, 0.2)
        .build();
    assert!(soft_above_hard.is_err());

    let zero_rate = DiscoveryConfig::builder()
        .patch_id("p")
        .topic("t")
        .crawl_rate_rps(0.0)
        .build();
    assert!(zero_rate.is_err());

    let no_items = DiscoveryConfig::builder()
        .patch_id("p")
        .topic("t")
        .max_items(0)
        .build();
    assert!(no_items.is_err());
}

#[test]
fn test_config_serialization() {
    let config = DiscoveryConfig::builder()
        .patch_id("patch-9")
        .topic("Hubble")
        .max_items(7)
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("patch-9"));

    let restored: DiscoveryConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn test_config_debug_trait() {
    let config = DiscoveryConfig::builder()
        .patch_id("p")
        .topic("t")
        .build()
        .unwrap();

    let debug_str = format!("{config:?}");
    assert!(debug_str.contains("DiscoveryConfig"));
    assert!(debug_str.contains("patch_id"));
}
