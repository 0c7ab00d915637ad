//! Store event broadcasting.
//!
//! Fans store events out to any number of subscribers (UI bridges, the CLI
//! printer, tests) over a tokio broadcast channel.

use printdest_core::{StoreEvent, StoreEventEmitter};
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcaster for store events.
#[derive(Debug, Clone)]
pub struct StoreEventBroadcaster {
    sender: broadcast::Sender<StoreEvent>,
}

impl StoreEventBroadcaster {
    /// Create a broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcast an event to all subscribers.
    pub fn broadcast(&self, event: StoreEvent) {
        // Events with no subscribers are dropped
        if self.sender.receiver_count() > 0 {
            debug!(
                target: "printdest.runtime",
                event = event.event_name(),
                destination_id = %event.destination_id(),
                "Broadcasting store event"
            );
            let _ = self.sender.send(event);
        }
    }

    /// Subscribe to store events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StoreEventBroadcaster {
    fn default() -> Self {
        Self::new(printdest_core::DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

impl StoreEventEmitter for StoreEventBroadcaster {
    fn emit(&self, event: StoreEvent) {
        self.broadcast(event);
    }

    fn clone_box(&self) -> Box<dyn StoreEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printdest_core::DestinationId;

    fn cleared(raw: &str) -> StoreEvent {
        StoreEvent::SelectionCleared {
            destination_id: DestinationId::new(raw),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = StoreEventBroadcaster::default();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.emit(cleared("p1"));
        assert_eq!(rx.recv().await.unwrap(), cleared("p1"));
    }

    #[test]
    fn test_events_without_subscribers_are_dropped() {
        let broadcaster = StoreEventBroadcaster::new(4);
        broadcaster.broadcast(cleared("p1"));

        let mut rx = broadcaster.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_boxed_clone_shares_channel() {
        let broadcaster = StoreEventBroadcaster::new(4);
        let mut rx = broadcaster.subscribe();
        broadcaster.clone_box().emit(cleared("p2"));
        assert_eq!(rx.try_recv().unwrap(), cleared("p2"));
    }
}
