//! Destination store - the selection state machine.
//!
//! The store owns the known destinations, the selected destination and the
//! capability resolver. It is the only component that changes the selection.
//!
//! # Flows
//!
//! - **Direct** ([`DestinationStore::select_destination`]): the selection
//!   follows user intent at once. When capabilities are missing a fetch is
//!   started and `SelectionChanged` is deferred until it resolves. A failed
//!   fetch leaves the destination selected.
//! - **Gated** ([`DestinationStore::configure_destination`]): the selection
//!   is untouched until the setup handshake for the destination succeeds.
//!
//! # Locking
//!
//! All state sits behind one async mutex. It is never held across a
//! transport await, and events are emitted after it is released.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Destination, DestinationId};
use crate::events::StoreEvent;
use crate::ports::{NativeTransport, StoreError, StoreEventEmitter, TransportEvent};
use crate::settings::SelectionPolicy;

use super::capability_resolver::{CapabilityResolution, CapabilityResolver, FetchDecision};
use super::setup_coordinator::{SetupCoordinator, SetupFailure, SetupOutcome, SetupTicket};

/// What a selection request led to.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// The destination is selected and `SelectionChanged` was emitted.
    Selected(Destination),
    /// The destination is selected; `SelectionChanged` follows once its
    /// capabilities resolve.
    AwaitingCapabilities(DestinationId),
    /// The setup handshake failed; the previous selection is kept.
    NotSelected(SetupFailure),
    /// The destination was removed before the handshake finished.
    Discarded(DestinationId),
}

impl SelectionOutcome {
    pub const fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_) | Self::AwaitingCapabilities(_))
    }

    pub const fn destination_id(&self) -> &DestinationId {
        match self {
            Self::Selected(destination) => destination.id(),
            Self::AwaitingCapabilities(id) | Self::Discarded(id) => id,
            Self::NotSelected(failure) => failure.destination_id(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    known: IndexMap<DestinationId, Destination>,
    selected: Option<DestinationId>,
    /// Selected destination whose `SelectionChanged` waits on a fetch.
    awaiting_capabilities: Option<DestinationId>,
    resolver: CapabilityResolver,
}

impl StoreState {
    /// Insert or merge a destination, returning the stored copy.
    fn upsert(&mut self, destination: Destination) -> &mut Destination {
        let id = destination.id().clone();
        match self.known.entry(id) {
            indexmap::map::Entry::Occupied(entry) => {
                let known = entry.into_mut();
                known.absorb(destination);
                known
            }
            indexmap::map::Entry::Vacant(entry) => entry.insert(destination),
        }
    }

    /// Select `id` and wait for its capabilities.
    ///
    /// Returns true when a transport fetch must be started.
    fn select_pending(&mut self, id: &DestinationId) -> bool {
        self.selected = Some(id.clone());
        self.awaiting_capabilities = Some(id.clone());
        self.resolver.begin(id) == FetchDecision::Issue
    }

    fn select_now(&mut self, id: &DestinationId) {
        self.selected = Some(id.clone());
        self.awaiting_capabilities = None;
    }
}

/// Owns destination state and drives the selection flows.
pub struct DestinationStore {
    policy: SelectionPolicy,
    transport: Arc<dyn NativeTransport>,
    emitter: Arc<dyn StoreEventEmitter>,
    setup: SetupCoordinator,
    state: Mutex<StoreState>,
}

impl DestinationStore {
    pub fn new(
        policy: SelectionPolicy,
        transport: Arc<dyn NativeTransport>,
        emitter: Arc<dyn StoreEventEmitter>,
    ) -> Self {
        Self {
            policy,
            setup: SetupCoordinator::new(Arc::clone(&transport)),
            transport,
            emitter,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub const fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    fn emit_all(&self, events: Vec<StoreEvent>) {
        for event in events {
            self.emitter.emit(event);
        }
    }

    fn start_fetch(&self, id: &DestinationId) {
        debug!(
            target: "printdest.store",
            destination_id = %id,
            "Starting capability fetch"
        );
        self.transport.start_capability_fetch(id);
    }

    // =========================================================================
    // Known destinations
    // =========================================================================

    /// Merge a batch of destinations by id. The selection is not changed.
    pub async fn update_destinations(&self, destinations: Vec<Destination>) {
        let mut state = self.state.lock().await;
        let count = destinations.len();
        for destination in destinations {
            state.upsert(destination);
        }
        debug!(
            target: "printdest.store",
            received = count,
            known = state.known.len(),
            "Merged destination list"
        );
    }

    /// Evict a destination.
    ///
    /// Its pending capability fetch is forgotten, so the terminal event for
    /// it becomes a no-op. A selection pointing at it is cleared.
    pub async fn remove_destination(&self, id: &DestinationId) -> Result<Destination, StoreError> {
        let mut state = self.state.lock().await;
        let removed = state
            .known
            .shift_remove(id)
            .ok_or_else(|| StoreError::UnknownDestination(id.clone()))?;

        state.resolver.cancel(id);
        state.resolver.stop_watch(id);
        if state.awaiting_capabilities.as_ref() == Some(id) {
            state.awaiting_capabilities = None;
        }
        let cleared = state.selected.as_ref() == Some(id);
        if cleared {
            state.selected = None;
        }
        drop(state);

        debug!(target: "printdest.store", destination_id = %id, cleared, "Removed destination");
        if cleared {
            self.emitter.emit(StoreEvent::SelectionCleared {
                destination_id: id.clone(),
            });
        }
        Ok(removed)
    }

    /// Ask the transport to enumerate destinations.
    pub fn start_discovery(&self) {
        debug!(target: "printdest.store", "Starting destination discovery");
        self.transport.start_discovery();
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Request the capability document for a known destination.
    ///
    /// A request for a destination with an outstanding fetch does not reach
    /// the transport. The result arrives as a transport event.
    pub async fn request_capabilities(
        &self,
        id: &DestinationId,
    ) -> Result<FetchDecision, StoreError> {
        let mut state = self.state.lock().await;
        if !state.known.contains_key(id) {
            return Err(StoreError::UnknownDestination(id.clone()));
        }
        let decision = state.resolver.begin(id);
        drop(state);

        if decision == FetchDecision::Issue {
            self.start_fetch(id);
        }
        Ok(decision)
    }

    /// Apply one transport event.
    ///
    /// Returns false when the event was stale and changed nothing.
    pub async fn handle_transport_event(&self, event: TransportEvent) -> bool {
        if let TransportEvent::DestinationsSet { destinations } = event {
            self.update_destinations(destinations).await;
            return true;
        }

        let mut state = self.state.lock().await;
        let Some(resolution) = state.resolver.on_transport_event(event) else {
            return false;
        };

        let mut events = Vec::new();
        match resolution {
            CapabilityResolution::Resolved {
                destination_id,
                capabilities,
            } => {
                let Some(destination) = state.known.get_mut(&destination_id) else {
                    debug!(
                        target: "printdest.store",
                        destination_id = %destination_id,
                        "Dropping capabilities for unknown destination"
                    );
                    return false;
                };
                destination.set_capabilities(capabilities);
                let snapshot = destination.clone();

                events.push(StoreEvent::CapabilitiesResolved {
                    destination_id: destination_id.clone(),
                });
                if state.awaiting_capabilities.as_ref() == Some(&destination_id) {
                    state.awaiting_capabilities = None;
                    if state.selected.as_ref() == Some(&destination_id) {
                        info!(
                            target: "printdest.store",
                            destination_id = %destination_id,
                            "Selection completed after capability fetch"
                        );
                        events.push(StoreEvent::selection_changed(snapshot));
                    }
                }
            }
            CapabilityResolution::Failed {
                destination_id,
                failure,
            } => {
                if state.awaiting_capabilities.as_ref() == Some(&destination_id) {
                    state.awaiting_capabilities = None;
                }
                warn!(
                    target: "printdest.store",
                    destination_id = %destination_id,
                    error = %failure,
                    "Capability fetch failed"
                );
                events.push(StoreEvent::CapabilitiesFailed {
                    destination_id,
                    reason: failure.to_string(),
                });
            }
        }
        drop(state);

        self.emit_all(events);
        true
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select a destination following the store's policy.
    ///
    /// Under [`SelectionPolicy::Gated`] a destination without capabilities
    /// goes through [`configure_destination`](Self::configure_destination).
    /// Re-selecting the current destination with unchanged capabilities
    /// emits nothing.
    pub async fn select_destination(&self, destination: Destination) -> SelectionOutcome {
        let mut state = self.state.lock().await;
        let current = state.selected.as_ref() == Some(destination.id())
            && state.awaiting_capabilities.is_none();
        let previous = state
            .known
            .get(destination.id())
            .and_then(|known| known.capabilities().cloned());
        let stored = state.upsert(destination);
        let id = stored.id().clone();

        if stored.has_capabilities() {
            let snapshot = stored.clone();
            if current && snapshot.capabilities() == previous.as_ref() {
                debug!(target: "printdest.store", destination_id = %id, "Destination already selected");
                return SelectionOutcome::Selected(snapshot);
            }
            state.select_now(&id);
            drop(state);

            info!(target: "printdest.store", destination_id = %id, "Destination selected");
            self.emitter
                .emit(StoreEvent::selection_changed(snapshot.clone()));
            return SelectionOutcome::Selected(snapshot);
        }

        if self.policy == SelectionPolicy::Gated {
            drop(state);
            return self.run_setup(&id).await;
        }

        let issue = state.select_pending(&id);
        drop(state);

        debug!(
            target: "printdest.store",
            destination_id = %id,
            "Destination selected, waiting for capabilities"
        );
        if issue {
            self.start_fetch(&id);
        }
        SelectionOutcome::AwaitingCapabilities(id)
    }

    /// Select a destination only after its setup handshake succeeds.
    ///
    /// Concurrent calls for the same destination share one handshake. The
    /// first call applies the outcome and emits events; the others report
    /// the same outcome.
    pub async fn configure_destination(&self, destination: Destination) -> SelectionOutcome {
        let id = destination.id().clone();
        self.state.lock().await.upsert(destination);
        self.run_setup(&id).await
    }

    async fn run_setup(&self, id: &DestinationId) -> SelectionOutcome {
        match self.setup.acquire(id) {
            SetupTicket::Leader(lease) => {
                let outcome = self.setup.perform(&lease).await;
                let result = self.apply_setup_outcome(&outcome).await;
                lease.publish(outcome);
                result
            }
            SetupTicket::Follower(follower) => {
                let outcome = follower.wait().await;
                self.follow_setup_outcome(outcome).await
            }
        }
    }

    async fn apply_setup_outcome(&self, outcome: &SetupOutcome) -> SelectionOutcome {
        let (id, capabilities) = match outcome {
            SetupOutcome::Succeeded {
                destination_id,
                capabilities,
            } => (destination_id, capabilities),
            SetupOutcome::Failed(failure) => return self.report_setup_failure(failure.clone()),
        };

        let mut state = self.state.lock().await;
        let Some(stored) = state.known.get_mut(id) else {
            debug!(
                target: "printdest.store",
                destination_id = %id,
                "Destination removed during setup"
            );
            return SelectionOutcome::Discarded(id.clone());
        };
        if let Some(capabilities) = capabilities {
            stored.set_capabilities(capabilities.clone());
        }

        if stored.has_capabilities() {
            let snapshot = stored.clone();
            state.select_now(id);
            drop(state);

            info!(target: "printdest.store", destination_id = %id, "Destination configured and selected");
            self.emitter
                .emit(StoreEvent::selection_changed(snapshot.clone()));
            return SelectionOutcome::Selected(snapshot);
        }

        let issue = state.select_pending(id);
        drop(state);
        debug!(
            target: "printdest.store",
            destination_id = %id,
            "Setup returned no capabilities, fetching"
        );
        if issue {
            self.start_fetch(id);
        }
        SelectionOutcome::AwaitingCapabilities(id.clone())
    }

    async fn follow_setup_outcome(&self, outcome: SetupOutcome) -> SelectionOutcome {
        match outcome {
            SetupOutcome::Succeeded { destination_id, .. } => {
                let state = self.state.lock().await;
                match state.known.get(&destination_id) {
                    None => SelectionOutcome::Discarded(destination_id),
                    Some(stored) if stored.has_capabilities() => {
                        SelectionOutcome::Selected(stored.clone())
                    }
                    Some(_) => SelectionOutcome::AwaitingCapabilities(destination_id),
                }
            }
            // Nobody reported an abandoned handshake yet.
            SetupOutcome::Failed(failure @ SetupFailure::Abandoned { .. }) => {
                self.report_setup_failure(failure)
            }
            SetupOutcome::Failed(failure) => SelectionOutcome::NotSelected(failure),
        }
    }

    fn report_setup_failure(&self, failure: SetupFailure) -> SelectionOutcome {
        warn!(
            target: "printdest.setup",
            destination_id = %failure.destination_id(),
            error = %failure,
            "Setup failed, selection unchanged"
        );
        self.emitter.emit(StoreEvent::SetupFailed {
            destination_id: failure.destination_id().clone(),
            reason: failure.to_string(),
        });
        SelectionOutcome::NotSelected(failure)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn selected_destination(&self) -> Option<Destination> {
        let state = self.state.lock().await;
        state
            .selected
            .as_ref()
            .and_then(|id| state.known.get(id))
            .cloned()
    }

    pub async fn destination(&self, id: &DestinationId) -> Option<Destination> {
        self.state.lock().await.known.get(id).cloned()
    }

    /// Known destinations in discovery order.
    pub async fn destinations(&self) -> Vec<Destination> {
        self.state.lock().await.known.values().cloned().collect()
    }

    pub async fn is_capability_request_pending(&self, id: &DestinationId) -> bool {
        self.state.lock().await.resolver.is_pending(id)
    }

    /// Start counting transport fetches for a destination.
    pub async fn start_capability_watch(&self, id: &DestinationId) {
        self.state.lock().await.resolver.start_watch(id);
    }

    /// Transport fetches issued since [`start_capability_watch`](Self::start_capability_watch).
    pub async fn capability_fetch_count(&self, id: &DestinationId) -> Option<u32> {
        self.state.lock().await.resolver.fetch_count(id)
    }

    pub fn is_setup_pending(&self, id: &DestinationId) -> bool {
        self.setup.is_pending(id)
    }
}
