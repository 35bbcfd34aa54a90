//! Event bus for publishing and subscribing to discovery events

mod core;

mod impls;
mod metrics_reporting;
mod publishing;
mod shutdown;
mod subscription;

pub use self::core::DiscoveryEventBus;
