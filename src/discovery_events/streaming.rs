//! Filtered event receivers

use std::sync::Arc;
use tokio::sync::broadcast;

use super::errors::EventBusError;
use super::types::DiscoveryEvent;

/// Receiver that only yields events passing `filter`
pub struct FilteredReceiver<F>
where
    F: Fn(&DiscoveryEvent) -> bool + Send + Sync + 'static,
{
    receiver: broadcast::Receiver<DiscoveryEvent>,
    filter: Arc<F>,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&DiscoveryEvent) -> bool + Send + Sync + 'static,
{
    pub fn new(receiver: broadcast::Receiver<DiscoveryEvent>, filter: F) -> Self {
        Self {
            receiver,
            filter: Arc::new(filter),
        }
    }

    /// Wait for the next matching event. Non-matching events are consumed.
    pub async fn recv(&mut self) -> Result<DiscoveryEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if (self.filter)(&event) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Closed) => return Err(EventBusError::Shutdown),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Err(EventBusError::ReceiverLagged(skipped));
                }
            }
        }
    }

    /// Drain buffered events until one matches; `Ok(None)` when the buffer is empty.
    pub fn try_recv(&mut self) -> Result<Option<DiscoveryEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if (self.filter)(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(EventBusError::Shutdown),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    return Err(EventBusError::ReceiverLagged(skipped));
                }
            }
        }
    }

    #[must_use]
    pub fn would_receive(&self, event: &DiscoveryEvent) -> bool {
        (self.filter)(event)
    }
}
