use std::time::Duration;

use carrot_discovery::dedup::{DeduplicationResult, DuplicateTier};
use carrot_discovery::discovery_engine::{RunStatus, SkipReason};
use carrot_discovery::discovery_events::*;
use carrot_discovery::frontier::CandidateSource;
use tokio::time::timeout;

#[tokio::test]
async fn test_event_bus_creation() {
    let bus = DiscoveryEventBus::new(100);
    assert_eq!(bus.subscriber_count(), 0);
    assert!(!bus.has_subscribers());
    assert_eq!(bus.remaining_capacity(), 100);
}

#[tokio::test]
async fn test_publish_with_no_subscribers() {
    let bus = DiscoveryEventBus::new(10);
    let event = DiscoveryEvent::run_started("run-1", "patch-1", "Example", 1);

    match bus.publish(event).await {
        Err(EventBusError::NoSubscribers) => {}
        other => panic!("Expected EventBusError::NoSubscribers, got: {other:?}"),
    }
    assert_eq!(bus.metrics().snapshot().events_dropped, 1);
}

#[tokio::test]
async fn test_emit_without_subscribers_is_silent() {
    let bus = DiscoveryEventBus::new(10);
    bus.emit(DiscoveryEvent::idle("run-1")).await;
    assert_eq!(bus.metrics().snapshot().events_published, 0);
}

#[tokio::test]
async fn test_subscribe_and_publish() {
    let bus = DiscoveryEventBus::new(10);
    let mut receiver = bus.subscribe();

    assert_eq!(bus.subscriber_count(), 1);

    let event = DiscoveryEvent::searching(
        "run-1",
        CandidateSource::Wikipedia,
        "Example",
        "https://en.wikipedia.org/w/api.php?offset=0",
    );
    assert_eq!(bus.publish(event.clone()).await.unwrap(), 1);

    let received = match timeout(Duration::from_millis(100), receiver.recv()).await {
        Ok(Ok(event)) => event,
        Ok(Err(e)) => panic!("Failed to receive event: {e}"),
        Err(_) => panic!("Timeout waiting for event"),
    };
    assert_eq!(received, event);
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let bus = DiscoveryEventBus::new(10);
    let mut receiver1 = bus.subscribe();
    let mut receiver2 = bus.subscribe();

    let event = DiscoveryEvent::skipped(
        "run-1",
        "https://example.com/a",
        SkipReason::ContentTooShort,
        "120 chars",
    );
    assert_eq!(bus.publish(event).await.unwrap(), 2);

    for receiver in [&mut receiver1, &mut receiver2] {
        match timeout(Duration::from_millis(100), receiver.recv()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => panic!("Receiver failed: {e}"),
            Err(_) => panic!("Receiver timed out"),
        }
    }
}

#[test]
fn test_event_serialization_shape() {
    let event = DiscoveryEvent::skipped(
        "run-7",
        "https://example.com/a",
        SkipReason::EntityMissing,
        "topic not mentioned",
    );
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["run_id"], "run-7");
    assert_eq!(json["type"], "skipped");
    assert_eq!(json["data"]["reason"], "entity_missing");
    assert_eq!(json["data"]["url"], "https://example.com/a");
    assert!(json["message"].as_str().unwrap().contains("entity_missing"));
    assert!(json["timestamp"].is_string());

    assert!(json["data"].get("existing_item").is_none());

    let idle = serde_json::to_value(DiscoveryEvent::idle("run-7")).unwrap();
    assert_eq!(idle["type"], "idle");

    let done = serde_json::to_value(DiscoveryEvent::run_completed(
        "run-7",
        RunStatus::Exhausted,
        0,
        12,
    ))
    .unwrap();
    assert_eq!(done["type"], "run_completed");
    assert_eq!(done["data"]["status"], "exhausted");
}

#[tokio::test]
async fn test_filtered_receiver() {
    let bus = DiscoveryEventBus::new(10);
    let mut filtered =
        bus.subscribe_filtered(|event| matches!(event.kind, EventKind::Skipped { .. }));

    let _ = bus
        .publish(DiscoveryEvent::run_started("run-1", "p", "Example", 1))
        .await;
    let skipped = DiscoveryEvent::skipped(
        "run-1",
        "https://example.com/b",
        SkipReason::Duplicate,
        "seen",
    );
    let _ = bus.publish(skipped.clone()).await;

    let received = match timeout(Duration::from_millis(100), filtered.recv()).await {
        Ok(Ok(event)) => event,
        Ok(Err(e)) => panic!("Failed to receive filtered event: {e}"),
        Err(_) => panic!("Timeout waiting for filtered event"),
    };
    assert_eq!(received, skipped);
    assert!(filtered.try_recv().unwrap().is_none());
}

#[tokio::test]
async fn test_run_filter_ignores_other_runs() {
    let bus = DiscoveryEventBus::new(10);
    let receiver = bus.subscribe_run("run-a");

    assert!(receiver.would_receive(&DiscoveryEvent::idle("run-a")));
    assert!(!receiver.would_receive(&DiscoveryEvent::idle("run-b")));
    assert!(receiver.would_receive(&DiscoveryEvent::shutdown(ShutdownReason::RunFinished)));
}

#[tokio::test]
async fn test_error_backpressure_reports_full_channel() {
    let bus = DiscoveryEventBus::with_config(EventBusConfig {
        capacity: 2,
        backpressure_mode: BackpressureMode::Error,
        ..Default::default()
    });
    let _receiver = bus.subscribe();

    bus.publish_with_backpressure(DiscoveryEvent::idle("r")).await.unwrap();
    bus.publish_with_backpressure(DiscoveryEvent::idle("r")).await.unwrap();
    assert!(bus.is_overloaded());

    match bus.publish_with_backpressure(DiscoveryEvent::idle("r")).await {
        Err(EventBusError::ChannelFull) => {}
        other => panic!("Expected ChannelFull, got: {other:?}"),
    }
    assert_eq!(bus.metrics().snapshot().events_failed, 1);
}

#[tokio::test]
async fn test_graceful_shutdown_publishes_event() {
    let bus = DiscoveryEventBus::new(10);
    let mut receiver = bus.subscribe();

    bus.shutdown_gracefully(ShutdownReason::RunFinished).await;
    assert!(bus.is_shutdown());

    let event = receiver.recv().await.unwrap();
    assert_eq!(
        event.kind,
        EventKind::Shutdown {
            reason: ShutdownReason::RunFinished
        }
    );
}

#[test]
fn test_metrics_report() {
    let bus = DiscoveryEventBus::new(10);
    let report = bus.get_metrics_report();
    assert!(report.contains("Event Bus Metrics:"));
    assert!(report.contains("Events Published: 0"));
    assert!(report.contains("Success Rate: 100.00%"));

    let bus_no_metrics = DiscoveryEventBus::with_config(EventBusConfig {
        enable_metrics: false,
        ..Default::default()
    });
    assert_eq!(bus_no_metrics.get_metrics_report(), "Metrics disabled");
}

#[test]
fn test_duplicate_skip_names_existing_item() {
    let verdict = DeduplicationResult::duplicate(DuplicateTier::A, "already saved", Some(1.0))
        .with_existing_item("item-42");
    let event = DiscoveryEvent::duplicate("run-8", "https://example.com/a", &verdict);
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["type"], "skipped");
    assert_eq!(json["data"]["reason"], "duplicate");
    assert_eq!(json["data"]["tier"], "A");
    assert_eq!(json["data"]["existing_item"], "item-42");
    assert!(json["message"].as_str().unwrap().contains("item-42"));
}
