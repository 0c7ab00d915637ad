//! Transport event pump.
//!
//! A single task reads transport events and applies them to the store in
//! arrival order, so the store never races against itself on terminal
//! events.

use std::sync::Arc;

use printdest_core::{DestinationStore, TransportEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Spawn the task forwarding transport events to `store`.
///
/// The task ends when the channel closes or `cancel` fires.
pub fn spawn_event_pump(
    store: Arc<DestinationStore>,
    mut events: mpsc::Receiver<TransportEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!(target: "printdest.runtime", "Event pump cancelled");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!(target: "printdest.runtime", "Transport channel closed");
                        break;
                    };
                    let destination_id = event.destination_id().cloned();
                    if !store.handle_transport_event(event).await {
                        trace!(
                            target: "printdest.runtime",
                            destination_id = ?destination_id,
                            "Transport event had no effect"
                        );
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use printdest_core::{
        DestinationId, NativeTransport, NoopEmitter, SelectionPolicy, SetupRejection,
        SetupResponse,
    };

    struct Unused;

    #[async_trait]
    impl NativeTransport for Unused {
        fn start_discovery(&self) {}

        fn start_capability_fetch(&self, _destination_id: &DestinationId) {}

        async fn setup_destination(
            &self,
            destination_id: &DestinationId,
        ) -> Result<SetupResponse, SetupRejection> {
            Err(SetupRejection::new(destination_id.as_str()))
        }
    }

    fn store() -> Arc<DestinationStore> {
        Arc::new(DestinationStore::new(
            SelectionPolicy::Direct,
            Arc::new(Unused),
            Arc::new(NoopEmitter::new()),
        ))
    }

    #[tokio::test]
    async fn test_pump_stops_when_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_event_pump(store(), rx, CancellationToken::new());
        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_pump_stops_on_cancel() {
        let (_tx, rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let handle = spawn_event_pump(store(), rx, cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_pump_applies_destination_lists() {
        let store = store();
        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_event_pump(Arc::clone(&store), rx, CancellationToken::new());

        tx.send(TransportEvent::DestinationsSet {
            destinations: vec![printdest_core::Destination::new(
                "p1",
                printdest_core::DestinationType::Local,
                printdest_core::DestinationOrigin::Local,
                "Office",
                printdest_core::ConnectionStatus::Online,
            )],
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(store.destinations().await.len(), 1);
    }
}
