//! Delivery counters for the discovery event bus

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    undelivered: AtomicU64,
    refused: AtomicU64,
    saved: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
    subscribers: AtomicUsize,
    peak_subscribers: AtomicUsize,
}

/// Counters shared by every clone of a bus
#[derive(Debug, Clone, Default)]
pub struct EventBusMetrics {
    counters: Arc<Counters>,
}

impl EventBusMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An event of type `kind` reached `subscribers` receivers.
    pub fn record_delivered(&self, kind: &str, subscribers: usize) {
        let c = &self.counters;
        c.delivered.fetch_add(1, Ordering::Relaxed);
        let per_kind = match kind {
            "saved" => Some(&c.saved),
            "skipped" => Some(&c.skipped),
            "error" => Some(&c.errors),
            _ => None,
        };
        if let Some(counter) = per_kind {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        self.observe_subscribers(subscribers);
    }

    /// An event was published while nobody was listening.
    pub fn record_undelivered(&self) {
        self.counters.undelivered.fetch_add(1, Ordering::Relaxed);
        self.observe_subscribers(0);
    }

    /// An event was refused because the buffer was full.
    pub fn record_refused(&self) {
        self.counters.refused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_subscribers(&self, count: usize) {
        self.counters.subscribers.store(count, Ordering::Relaxed);
        self.counters.peak_subscribers.fetch_max(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.counters;
        MetricsSnapshot {
            events_published: c.delivered.load(Ordering::Relaxed),
            events_dropped: c.undelivered.load(Ordering::Relaxed),
            events_failed: c.refused.load(Ordering::Relaxed),
            saved_events: c.saved.load(Ordering::Relaxed),
            skipped_events: c.skipped.load(Ordering::Relaxed),
            error_events: c.errors.load(Ordering::Relaxed),
            active_subscribers: c.subscribers.load(Ordering::Relaxed),
            peak_subscribers: c.peak_subscribers.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Delivered to at least one receiver
    pub events_published: u64,
    /// Published with no receivers
    pub events_dropped: u64,
    /// Refused under `BackpressureMode::Error`
    pub events_failed: u64,
    pub saved_events: u64,
    pub skipped_events: u64,
    pub error_events: u64,
    pub active_subscribers: usize,
    pub peak_subscribers: usize,
}

impl MetricsSnapshot {
    /// Percentage of accepted publishes among those that were not refused
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let attempts = self.events_published + self.events_failed;
        if attempts == 0 {
            100.0
        } else {
            self.events_published as f64 * 100.0 / attempts as f64
        }
    }
}
