use super::core::DiscoveryEventBus;

impl DiscoveryEventBus {
    /// One-snapshot text summary for logs
    #[must_use]
    pub fn get_metrics_report(&self) -> String {
        if !self.config.enable_metrics {
            return "Metrics disabled".to_string();
        }

        let s = self.metrics.snapshot();
        format!(
            "Event Bus Metrics:\n  Events Published: {} ({} saved, {} skipped, {} errors)\n  \
             Unheard: {}, refused: {}\n  Subscribers: {} now, {} peak\n  Success Rate: {:.2}%",
            s.events_published,
            s.saved_events,
            s.skipped_events,
            s.error_events,
            s.events_dropped,
            s.events_failed,
            s.active_subscribers,
            s.peak_subscribers,
            s.success_rate()
        )
    }
}
