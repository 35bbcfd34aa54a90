use std::sync::atomic::Ordering;

use crate::discovery_events::config::EventBusConfig;

use super::core::DiscoveryEventBus;

impl Default for DiscoveryEventBus {
    fn default() -> Self {
        Self::with_config(EventBusConfig::default())
    }
}

impl Clone for DiscoveryEventBus {
    fn clone(&self) -> Self {
        self.num_instances.fetch_add(1, Ordering::Relaxed);
        Self {
            sender: self.sender.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            shutdown: self.shutdown.clone(),
            shutdown_flag: self.shutdown_flag.clone(),
            num_instances: self.num_instances.clone(),
        }
    }
}

impl Drop for DiscoveryEventBus {
    fn drop(&mut self) {
        // fetch_sub returns the count before decrementing
        if self.num_instances.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shutdown_flag.store(true, Ordering::SeqCst);
            self.shutdown.notify_waiters();
            log::trace!("Last event bus handle dropped, shutdown signalled");
        }
    }
}
