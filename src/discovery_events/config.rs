//! Event bus settings

/// What publishing does once the buffer is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpressureMode {
    /// Overwrite the oldest buffered event; slow receivers get `Lagged`
    #[default]
    DropOldest,
    /// Refuse new events with `EventBusError::ChannelFull`
    Error,
}

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Events buffered per receiver before the oldest are overwritten
    pub capacity: usize,
    pub backpressure_mode: BackpressureMode,
    /// Buffer fill ratio at which the bus reports itself overloaded
    pub overload_threshold: f64,
    pub enable_metrics: bool,
}

/// A run emits a handful of events per URL; this covers a few hundred URLs
/// of backlog for a stalled consumer.
const DEFAULT_EVENT_CAPACITY: usize = 1000;

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
            backpressure_mode: BackpressureMode::DropOldest,
            overload_threshold: 0.8,
            enable_metrics: true,
        }
    }
}
