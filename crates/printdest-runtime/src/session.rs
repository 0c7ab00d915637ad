//! Session composition root.
//!
//! Builds the store, search controller, broadcaster and event pump from
//! settings and a transport, and tears them down together.

use std::sync::Arc;

use printdest_core::{
    DestinationSearch, DestinationStore, NativeTransport, SettingsError, StoreEvent,
    StoreSettings, TransportEvent, validate_settings,
};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::broadcaster::StoreEventBroadcaster;
use crate::pump::spawn_event_pump;

/// Errors starting or stopping a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error("Event pump task failed: {0}")]
    Pump(#[from] tokio::task::JoinError),
}

/// Create the channel a transport uses to deliver events, sized from settings.
pub fn transport_channel(
    settings: &StoreSettings,
) -> (mpsc::Sender<TransportEvent>, mpsc::Receiver<TransportEvent>) {
    mpsc::channel(settings.effective_transport_event_buffer())
}

/// A running destination store with its event pump.
pub struct PrintSession {
    store: Arc<DestinationStore>,
    search: DestinationSearch,
    broadcaster: StoreEventBroadcaster,
    cancel: CancellationToken,
    pump: JoinHandle<()>,
}

impl PrintSession {
    /// Validate settings and start the session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        settings: &StoreSettings,
        transport: Arc<dyn NativeTransport>,
        events: mpsc::Receiver<TransportEvent>,
    ) -> Result<Self, SessionError> {
        validate_settings(settings)?;

        let policy = settings.effective_policy();
        let broadcaster = StoreEventBroadcaster::new(settings.effective_event_channel_capacity());
        let store = Arc::new(DestinationStore::new(
            policy,
            transport,
            Arc::new(broadcaster.clone()),
        ));
        let cancel = CancellationToken::new();
        let pump = spawn_event_pump(Arc::clone(&store), events, cancel.clone());

        info!(
            target: "printdest.runtime",
            policy = policy.as_str(),
            "Print session started"
        );
        Ok(Self {
            search: DestinationSearch::new(Arc::clone(&store)),
            store,
            broadcaster,
            cancel,
            pump,
        })
    }

    pub const fn store(&self) -> &Arc<DestinationStore> {
        &self.store
    }

    pub const fn search(&self) -> &DestinationSearch {
        &self.search
    }

    /// Subscribe to store events. Only events emitted after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.broadcaster.subscribe()
    }

    /// Stop the event pump and wait for it to finish.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        debug!(target: "printdest.runtime", "Shutting down print session");
        self.cancel.cancel();
        self.pump.await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedTransport;
    use printdest_core::SelectionPolicy;

    #[tokio::test]
    async fn test_start_rejects_invalid_settings() {
        let settings = StoreSettings {
            event_channel_capacity: Some(0),
            ..StoreSettings::default()
        };
        let (tx, rx) = transport_channel(&settings);
        let result = PrintSession::start(&settings, Arc::new(ScriptedTransport::new(tx)), rx);
        assert!(matches!(
            result,
            Err(SessionError::InvalidSettings(SettingsError::InvalidEventCapacity(0)))
        ));
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let settings = StoreSettings {
            selection_policy: Some(SelectionPolicy::Gated),
            ..StoreSettings::with_defaults()
        };
        let (tx, rx) = transport_channel(&settings);
        let session =
            PrintSession::start(&settings, Arc::new(ScriptedTransport::new(tx)), rx).unwrap();

        assert_eq!(session.store().policy(), SelectionPolicy::Gated);
        session.shutdown().await.unwrap();
    }
}
