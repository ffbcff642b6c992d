//! Error channel of a gated client.
//!
//! Backed by tokio's broadcast channel. Every subscriber receives each blocked
//! command reported after the setup phase.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::gate::BlockedCommandError;
use crate::observability::GateEvent;

/// Default channel capacity.
pub const DEFAULT_ERROR_CHANNEL_CAPACITY: usize = 64;

/// A guarded command that was used before auth, outside the setup phase.
#[derive(Debug, Clone)]
pub struct GateErrorEvent {
    /// Blocked command name.
    pub command: String,
    /// The gate's pre-built error for this kind of command.
    pub error: Arc<BlockedCommandError>,
}

/// Typed error notifications for one client.
#[derive(Debug, Clone)]
pub struct ErrorChannel {
    tx: broadcast::Sender<GateErrorEvent>,
    capacity: usize,
}

impl ErrorChannel {
    /// Create a channel with the given capacity, raised to at least 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Receive every event emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GateErrorEvent> {
        self.tx.subscribe()
    }

    /// Current subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Emit an event. Returns the number of subscribers reached.
    ///
    /// With nobody listening the event is logged at error level instead.
    pub fn emit(&self, event: GateErrorEvent) -> usize {
        match self.tx.send(event) {
            Ok(reached) => reached,
            Err(broadcast::error::SendError(dropped)) => {
                tracing::error!(
                    event = GateEvent::CommandBlockedUnobserved.as_str(),
                    command = %dropped.command,
                    error = %dropped.error,
                    created_at = %dropped.error.origin(),
                    "command issued before auth and no error subscriber is attached"
                );
                0
            }
        }
    }
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_ERROR_CHANNEL_CAPACITY, ErrorChannel};

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let channel = ErrorChannel::new(0);
        assert_eq!(channel.capacity(), 1);
        assert_eq!(channel.subscriber_count(), 0);
        let _rx = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 1);
    }

    #[test]
    fn default_capacity() {
        assert_eq!(
            ErrorChannel::default().capacity(),
            DEFAULT_ERROR_CHANNEL_CAPACITY
        );
    }
}
