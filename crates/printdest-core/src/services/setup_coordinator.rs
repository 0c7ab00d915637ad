//! Setup coordinator - drives the device setup handshake.
//!
//! Managed destinations must be activated by the transport before they can
//! be selected. The coordinator guarantees one transport setup call per
//! logical request and coalesces concurrent requests for the same
//! destination onto the outstanding one.
//!
//! # Ticket lifecycle
//!
//! - [`SetupCoordinator::acquire`] hands out a [`SetupTicket`]: the first
//!   caller for an id becomes the leader, later callers become followers
//! - The leader runs [`SetupCoordinator::perform`], applies the outcome,
//!   then publishes it with [`SetupLease::publish`]
//! - Followers wait for the published outcome; a leader dropped without
//!   publishing releases them with [`SetupFailure::Abandoned`]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::{Capabilities, DestinationId};
use crate::ports::NativeTransport;

type OutcomeReceiver = watch::Receiver<Option<SetupOutcome>>;
type TicketMap = Arc<Mutex<HashMap<DestinationId, OutcomeReceiver>>>;

/// Why a setup handshake did not make the destination usable.
///
/// Every variant carries the id of the destination that triggered the
/// request, regardless of what the transport sent back.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SetupFailure {
    /// The transport answered with `success: false`.
    #[error("Setup of '{destination_id}' was refused by the transport")]
    Reported { destination_id: DestinationId },

    /// The transport failed before answering.
    #[error("Setup of '{destination_id}' was rejected: {payload}")]
    Rejected {
        destination_id: DestinationId,
        payload: serde_json::Value,
    },

    /// The request driving the handshake went away before it finished.
    #[error("Setup of '{destination_id}' was abandoned before completing")]
    Abandoned { destination_id: DestinationId },
}

impl SetupFailure {
    /// Destination whose setup failed.
    pub const fn destination_id(&self) -> &DestinationId {
        match self {
            Self::Reported { destination_id }
            | Self::Rejected { destination_id, .. }
            | Self::Abandoned { destination_id } => destination_id,
        }
    }

    /// Whether the transport failed before answering.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Result of one setup handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    Succeeded {
        destination_id: DestinationId,
        capabilities: Option<Capabilities>,
    },
    Failed(SetupFailure),
}

impl SetupOutcome {
    /// Whether the destination may now be selected.
    pub const fn should_select(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub const fn destination_id(&self) -> &DestinationId {
        match self {
            Self::Succeeded { destination_id, .. } => destination_id,
            Self::Failed(failure) => failure.destination_id(),
        }
    }
}

/// Handle returned by [`SetupCoordinator::acquire`].
#[derive(Debug)]
pub enum SetupTicket {
    /// No handshake was outstanding; the holder drives it.
    Leader(SetupLease),
    /// A handshake is outstanding; the holder waits for its outcome.
    Follower(SetupFollower),
}

/// Exclusive right to run the handshake for one destination.
#[derive(Debug)]
pub struct SetupLease {
    destination_id: DestinationId,
    sender: watch::Sender<Option<SetupOutcome>>,
    tickets: TicketMap,
    published: bool,
}

impl SetupLease {
    pub const fn destination_id(&self) -> &DestinationId {
        &self.destination_id
    }

    /// Release the ticket and hand the outcome to every follower.
    pub fn publish(mut self, outcome: SetupOutcome) {
        self.release();
        self.sender.send_replace(Some(outcome));
        self.published = true;
    }

    fn release(&self) {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.destination_id);
    }
}

impl Drop for SetupLease {
    fn drop(&mut self) {
        if !self.published {
            debug!(
                target: "printdest.setup",
                destination_id = %self.destination_id,
                "Setup lease dropped before publishing"
            );
            self.release();
        }
    }
}

/// Waits on a handshake another caller is driving.
#[derive(Debug)]
pub struct SetupFollower {
    destination_id: DestinationId,
    receiver: OutcomeReceiver,
}

impl SetupFollower {
    pub const fn destination_id(&self) -> &DestinationId {
        &self.destination_id
    }

    /// Wait for the leader's outcome.
    pub async fn wait(mut self) -> SetupOutcome {
        match self.receiver.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or_else(|| {
                SetupOutcome::Failed(SetupFailure::Abandoned {
                    destination_id: self.destination_id.clone(),
                })
            }),
            Err(_) => SetupOutcome::Failed(SetupFailure::Abandoned {
                destination_id: self.destination_id,
            }),
        }
    }
}

/// Coordinates setup handshakes, one outstanding ticket per destination.
pub struct SetupCoordinator {
    transport: Arc<dyn NativeTransport>,
    tickets: TicketMap,
}

impl SetupCoordinator {
    pub fn new(transport: Arc<dyn NativeTransport>) -> Self {
        Self {
            transport,
            tickets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a handshake for the destination is outstanding.
    pub fn is_pending(&self, destination_id: &DestinationId) -> bool {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(destination_id)
    }

    /// Claim the handshake for a destination, or join the outstanding one.
    pub fn acquire(&self, destination_id: &DestinationId) -> SetupTicket {
        let mut tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(receiver) = tickets.get(destination_id) {
            debug!(
                target: "printdest.setup",
                destination_id = %destination_id,
                "Coalescing setup request onto outstanding handshake"
            );
            return SetupTicket::Follower(SetupFollower {
                destination_id: destination_id.clone(),
                receiver: receiver.clone(),
            });
        }

        let (sender, receiver) = watch::channel(None);
        tickets.insert(destination_id.clone(), receiver);
        SetupTicket::Leader(SetupLease {
            destination_id: destination_id.clone(),
            sender,
            tickets: Arc::clone(&self.tickets),
            published: false,
        })
    }

    /// Run the transport handshake for a lease. Issues exactly one call.
    pub async fn perform(&self, lease: &SetupLease) -> SetupOutcome {
        let destination_id = lease.destination_id().clone();
        debug!(
            target: "printdest.setup",
            destination_id = %destination_id,
            "Starting setup handshake"
        );

        match self.transport.setup_destination(&destination_id).await {
            Ok(response) if response.success => {
                if response.printer_id != destination_id.as_str() {
                    warn!(
                        target: "printdest.setup",
                        destination_id = %destination_id,
                        printer_id = %response.printer_id,
                        "Setup response names a different printer"
                    );
                }
                let capabilities = response.capabilities.filter(|caps| match caps.validate() {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(
                            target: "printdest.setup",
                            destination_id = %destination_id,
                            error = %err,
                            "Dropping invalid capabilities from setup response"
                        );
                        false
                    }
                });
                SetupOutcome::Succeeded {
                    destination_id,
                    capabilities,
                }
            }
            Ok(_) => SetupOutcome::Failed(SetupFailure::Reported { destination_id }),
            Err(rejection) => SetupOutcome::Failed(SetupFailure::Rejected {
                destination_id,
                payload: rejection.payload,
            }),
        }
    }

    /// Acquire, run and publish in one step.
    ///
    /// Callers that must act on the outcome before followers observe it use
    /// [`acquire`](Self::acquire) and [`perform`](Self::perform) directly.
    pub async fn request_setup(&self, destination_id: &DestinationId) -> SetupOutcome {
        match self.acquire(destination_id) {
            SetupTicket::Leader(lease) => {
                let outcome = self.perform(&lease).await;
                lease.publish(outcome.clone());
                outcome
            }
            SetupTicket::Follower(follower) => follower.wait().await,
        }
    }
}
