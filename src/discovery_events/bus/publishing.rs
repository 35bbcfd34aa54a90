//! Publishing operations

use crate::discovery_events::config::BackpressureMode;
use crate::discovery_events::errors::EventBusError;
use crate::discovery_events::types::DiscoveryEvent;

use super::core::DiscoveryEventBus;

impl DiscoveryEventBus {
    /// Publish an event to all subscribers.
    ///
    /// Returns the number of subscribers reached, or `NoSubscribers` when
    /// nobody is listening.
    pub async fn publish(&self, event: DiscoveryEvent) -> Result<usize, EventBusError> {
        let kind = event.kind_name();
        let sent = self.sender.send(event);
        if self.config.enable_metrics {
            match &sent {
                Ok(reached) => self.metrics.record_delivered(kind, *reached),
                Err(_) => self.metrics.record_undelivered(),
            }
        }
        sent.map_err(|_| EventBusError::NoSubscribers)
    }

    /// Publish honoring the configured backpressure mode.
    ///
    /// `DropOldest` behaves like [`publish`](Self::publish); `Error` refuses
    /// the event with `ChannelFull` while the buffer is at capacity.
    pub async fn publish_with_backpressure(
        &self,
        event: DiscoveryEvent,
    ) -> Result<usize, EventBusError> {
        if self.is_shutdown() {
            return Err(EventBusError::Shutdown);
        }
        match self.config.backpressure_mode {
            BackpressureMode::DropOldest => self.publish(event).await,
            BackpressureMode::Error => {
                if self.sender.len() >= self.config.capacity {
                    if self.config.enable_metrics {
                        self.metrics.record_refused();
                    }
                    return Err(EventBusError::ChannelFull);
                }
                self.publish(event).await
            }
        }
    }

    /// Fire-and-forget publish for the engine. Events never gate a run, so
    /// failures are only logged.
    pub async fn emit(&self, event: DiscoveryEvent) {
        let kind = event.kind_name();
        match self.publish_with_backpressure(event).await {
            Ok(_) => {}
            Err(EventBusError::NoSubscribers) => {
                log::debug!("No subscribers for {kind} event");
            }
            Err(e) => log::warn!("Failed to publish {kind} event: {e}"),
        }
    }
}
