//! Progress events for discovery runs
//!
//! A broadcast bus with metrics, filtered receivers and graceful shutdown.
//! Events are informational: a run behaves the same with or without
//! subscribers.

pub mod bus;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod streaming;
pub mod types;

pub use bus::DiscoveryEventBus;
pub use config::{BackpressureMode, EventBusConfig};
pub use errors::EventBusError;
pub use metrics::{EventBusMetrics, MetricsSnapshot};
pub use streaming::FilteredReceiver;
pub use types::{DiscoveryEvent, EventKind, ItemCard, ShutdownReason};
