//! Event Bus implementation.
//!
//! A thin typed wrapper over a tokio broadcast channel. Each editor session
//! owns its own bus; there is no process-wide instance.

use tokio::sync::broadcast;

/// Events buffered per receiver before a slow receiver starts lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Error types for event bus operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    /// No receivers are listening
    #[error("No active subscribers")]
    NoSubscribers,
}

/// Typed broadcast bus.
///
/// Every receiver sees every event published after it was created. A
/// receiver that falls more than the channel capacity behind skips the
/// oldest events and is told how many it missed.
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone + Send + 'static> EventBus<E> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all receivers
    ///
    /// Returns the number of receivers that will see the event, or
    /// [`EventBusError::NoSubscribers`] when nobody is listening.
    pub fn publish(&self, event: E) -> Result<usize, EventBusError> {
        self.sender.send(event).map_err(|_| {
            tracing::trace!("Event dropped: no receivers");
            EventBusError::NoSubscribers
        })
    }

    /// Get a receiver for async event polling
    pub fn receiver(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Number of live receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}
