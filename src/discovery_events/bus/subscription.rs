//! Subscription operations

use tokio::sync::broadcast;

use crate::discovery_events::streaming::FilteredReceiver;
use crate::discovery_events::types::DiscoveryEvent;

use super::core::DiscoveryEventBus;

impl DiscoveryEventBus {
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let count = self.sender.receiver_count();
        if self.config.enable_metrics {
            self.metrics.observe_subscribers(count);
        }
        count
    }

    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Subscribe to the events for which `filter` returns true
    pub fn subscribe_filtered<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&DiscoveryEvent) -> bool + Send + Sync + 'static,
    {
        FilteredReceiver::new(self.subscribe(), filter)
    }

    /// Events of a single run only
    pub fn subscribe_run(
        &self,
        run_id: impl Into<String>,
    ) -> FilteredReceiver<impl Fn(&DiscoveryEvent) -> bool + Send + Sync + 'static> {
        let run_id = run_id.into();
        self.subscribe_filtered(move |event| event.run_id == run_id || event.run_id.is_empty())
    }
}
