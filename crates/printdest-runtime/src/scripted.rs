//! Scripted in-process transport.
//!
//! Stands in for the out-of-process print service in simulations and tests.
//! Replies are scripted per destination id, every call is recorded, and
//! capability results are delivered through the same event channel a real
//! transport would use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use printdest_core::{
    Destination, DestinationId, NativeTransport, SetupRejection, SetupResponse, TransportEvent,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

/// Scripted reply to a capability fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchScript {
    /// Deliver this document as `CapabilitiesSet`.
    Respond(serde_json::Value),
    /// Deliver `CapabilitiesFetchFailed`.
    Fail,
    /// Deliver nothing; the caller injects the result with [`ScriptedTransport::emit`].
    Hold,
}

/// Scripted reply to a setup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupScript {
    Resolve(SetupResponse),
    Reject(serde_json::Value),
}

#[derive(Debug, Default)]
struct ScriptState {
    discovery: Vec<Destination>,
    fetches: HashMap<DestinationId, FetchScript>,
    setups: HashMap<DestinationId, SetupScript>,
    fetch_calls: Vec<DestinationId>,
    setup_calls: Vec<DestinationId>,
    discovery_calls: usize,
}

/// Transport whose behavior is fixed up front.
///
/// Unscripted fetches fail and unscripted setups are rejected with the bare
/// destination id as payload.
pub struct ScriptedTransport {
    events: mpsc::Sender<TransportEvent>,
    state: Mutex<ScriptState>,
    setup_gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    pub fn new(events: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            events,
            state: Mutex::new(ScriptState::default()),
            setup_gate: None,
        }
    }

    /// Destinations reported by discovery.
    #[must_use]
    pub fn with_discovery(self, destinations: Vec<Destination>) -> Self {
        self.lock().discovery = destinations;
        self
    }

    /// Hold every setup call until `gate` is notified.
    #[must_use]
    pub fn with_setup_gate(mut self, gate: Arc<Notify>) -> Self {
        self.setup_gate = Some(gate);
        self
    }

    pub fn script_fetch(&self, id: impl Into<DestinationId>, script: FetchScript) {
        self.lock().fetches.insert(id.into(), script);
    }

    pub fn script_setup(&self, id: impl Into<DestinationId>, script: SetupScript) {
        self.lock().setups.insert(id.into(), script);
    }

    /// Inject a transport event as if the service had sent it.
    pub async fn emit(&self, event: TransportEvent) {
        if self.events.send(event).await.is_err() {
            warn!(target: "printdest.runtime", "Transport event channel closed");
        }
    }

    /// Fetch calls in the order they were made.
    pub fn fetch_calls(&self) -> Vec<DestinationId> {
        self.lock().fetch_calls.clone()
    }

    pub fn fetch_count(&self, id: &DestinationId) -> usize {
        self.lock().fetch_calls.iter().filter(|c| *c == id).count()
    }

    /// Setup calls in the order they were made.
    pub fn setup_calls(&self) -> Vec<DestinationId> {
        self.lock().setup_calls.clone()
    }

    pub fn discovery_calls(&self) -> usize {
        self.lock().discovery_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an event without blocking the caller.
    ///
    /// Every fetch must end in exactly one terminal event, so a full channel
    /// hands the event to a task that waits for room instead of dropping it.
    fn deliver(&self, event: TransportEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(
                    target: "printdest.runtime",
                    "Transport event channel full, deferring delivery"
                );
                let events = self.events.clone();
                tokio::spawn(async move {
                    if events.send(event).await.is_err() {
                        warn!(target: "printdest.runtime", "Transport event channel closed");
                    }
                });
            }
            Err(TrySendError::Closed(_)) => {
                warn!(target: "printdest.runtime", "Transport event channel closed");
            }
        }
    }
}

#[async_trait]
impl NativeTransport for ScriptedTransport {
    fn start_discovery(&self) {
        let destinations = {
            let mut state = self.lock();
            state.discovery_calls += 1;
            state.discovery.clone()
        };
        self.deliver(TransportEvent::DestinationsSet { destinations });
    }

    fn start_capability_fetch(&self, destination_id: &DestinationId) {
        let script = {
            let mut state = self.lock();
            state.fetch_calls.push(destination_id.clone());
            state
                .fetches
                .get(destination_id)
                .cloned()
                .unwrap_or(FetchScript::Fail)
        };

        debug!(
            target: "printdest.runtime",
            destination_id = %destination_id,
            script = ?script,
            "Scripted capability fetch"
        );
        match script {
            FetchScript::Respond(capabilities) => self.deliver(TransportEvent::CapabilitiesSet {
                destination_id: destination_id.clone(),
                capabilities,
            }),
            FetchScript::Fail => self.deliver(TransportEvent::CapabilitiesFetchFailed {
                destination_id: destination_id.clone(),
            }),
            FetchScript::Hold => {}
        }
    }

    async fn setup_destination(
        &self,
        destination_id: &DestinationId,
    ) -> Result<SetupResponse, SetupRejection> {
        self.lock().setup_calls.push(destination_id.clone());

        if let Some(gate) = &self.setup_gate {
            gate.notified().await;
        }

        let script = self.lock().setups.get(destination_id).cloned();
        match script {
            Some(SetupScript::Resolve(response)) => Ok(response),
            Some(SetupScript::Reject(payload)) => Err(SetupRejection::new(payload)),
            None => Err(SetupRejection::new(destination_id.as_str())),
        }
    }
}
