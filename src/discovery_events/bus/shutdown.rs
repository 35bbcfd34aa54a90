//! Shutdown operations

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::discovery_events::types::{DiscoveryEvent, ShutdownReason};

use super::core::DiscoveryEventBus;

/// Time given to subscribers to drain before the final signal
const SHUTDOWN_DRAIN: Duration = Duration::from_millis(500);

impl DiscoveryEventBus {
    /// Signal shutdown to all subscribers. Idempotent; shared by every clone.
    pub fn shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
        log::debug!("Event bus shutdown signalled");
    }

    /// Resolves on the next shutdown signal. Use inside `tokio::select!`
    /// next to `recv()`.
    pub async fn wait_for_shutdown(&self) {
        self.shutdown.notified().await;
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Publish a `shutdown` event, give subscribers time to drain, then signal.
    pub async fn shutdown_gracefully(&self, reason: ShutdownReason) {
        log::info!("Shutting down event bus: {reason:?}");

        // The shutdown event goes out before the flag blocks further publishes
        if let Err(e) = self.publish(DiscoveryEvent::shutdown(reason)).await {
            log::debug!("Shutdown event not delivered: {e}");
        }
        self.shutdown_flag.store(true, Ordering::SeqCst);

        tokio::time::sleep(SHUTDOWN_DRAIN).await;
        self.shutdown.notify_waiters();

        log::info!("Event bus shutdown complete");
    }
}
