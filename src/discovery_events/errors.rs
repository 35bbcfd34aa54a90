use thiserror::Error;

/// Why a discovery event could not be published or received
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("no one is listening for discovery events")]
    NoSubscribers,

    /// The receiver fell behind the buffer and lost this many events
    #[error("receiver lost {0} discovery events")]
    ReceiverLagged(u64),

    #[error("discovery event bus is shut down")]
    Shutdown,

    #[error("discovery event buffer is full")]
    ChannelFull,
}
