//! Capability resolver - de-duplicates capability fetches per destination.
//!
//! The resolver is plain state owned by the destination store. It decides
//! whether a fetch must be issued to the transport, and turns terminal
//! transport events into resolved/failed outcomes. Events for destinations
//! with no outstanding fetch are stale and produce nothing.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::domain::{Capabilities, CapabilitiesError, DestinationId};
use crate::ports::TransportEvent;

/// Whether a capability request has to reach the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// No fetch was outstanding; the caller must start one.
    Issue,
    /// A fetch is already outstanding; this request rides along.
    Coalesced,
}

/// Why a capability fetch produced no document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("Transport could not fetch capabilities")]
    Transport,

    #[error("Invalid capability document: {0}")]
    InvalidCapabilities(#[from] CapabilitiesError),
}

/// Terminal outcome of one outstanding fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityResolution {
    Resolved {
        destination_id: DestinationId,
        capabilities: Capabilities,
    },
    Failed {
        destination_id: DestinationId,
        failure: FetchFailure,
    },
}

impl CapabilityResolution {
    pub const fn destination_id(&self) -> &DestinationId {
        match self {
            Self::Resolved { destination_id, .. } | Self::Failed { destination_id, .. } => {
                destination_id
            }
        }
    }
}

#[derive(Debug, Default)]
struct PendingFetch {
    /// Requests that arrived while this fetch was outstanding.
    coalesced: u32,
}

/// Tracks outstanding capability fetches keyed by destination id.
#[derive(Debug, Default)]
pub struct CapabilityResolver {
    pending: HashMap<DestinationId, PendingFetch>,
    /// Transport fetch calls counted per watched destination.
    watches: HashMap<DestinationId, u32>,
}

impl CapabilityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) counting transport fetches for a destination.
    pub fn start_watch(&mut self, destination_id: &DestinationId) {
        self.watches.insert(destination_id.clone(), 0);
    }

    pub fn stop_watch(&mut self, destination_id: &DestinationId) {
        self.watches.remove(destination_id);
    }

    /// Number of transport fetches issued since the watch started.
    ///
    /// `None` when the destination is not watched.
    pub fn fetch_count(&self, destination_id: &DestinationId) -> Option<u32> {
        self.watches.get(destination_id).copied()
    }

    /// Whether exactly one transport fetch was issued for a watched destination.
    pub fn fetched_once(&self, destination_id: &DestinationId) -> bool {
        self.fetch_count(destination_id) == Some(1)
    }

    /// Register a capability request.
    ///
    /// Returns [`FetchDecision::Issue`] only when no fetch for the id is
    /// outstanding; the caller then owns starting the transport fetch.
    pub fn begin(&mut self, destination_id: &DestinationId) -> FetchDecision {
        if let Some(pending) = self.pending.get_mut(destination_id) {
            pending.coalesced += 1;
            debug!(
                target: "printdest.resolver",
                destination_id = %destination_id,
                coalesced = pending.coalesced,
                "Capability fetch already outstanding"
            );
            return FetchDecision::Coalesced;
        }

        self.pending
            .insert(destination_id.clone(), PendingFetch::default());
        if let Some(count) = self.watches.get_mut(destination_id) {
            *count += 1;
        }
        FetchDecision::Issue
    }

    pub fn is_pending(&self, destination_id: &DestinationId) -> bool {
        self.pending.contains_key(destination_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Forget an outstanding fetch; its terminal event will be ignored.
    pub fn cancel(&mut self, destination_id: &DestinationId) -> bool {
        self.pending.remove(destination_id).is_some()
    }

    /// Demultiplex a transport event into a fetch outcome.
    ///
    /// Returns `None` for events that are not fetch results and for results
    /// whose destination has no outstanding fetch.
    pub fn on_transport_event(&mut self, event: TransportEvent) -> Option<CapabilityResolution> {
        let (destination_id, document) = match event {
            TransportEvent::DestinationsSet { .. } => return None,
            TransportEvent::CapabilitiesSet {
                destination_id,
                capabilities,
            } => (destination_id, Some(capabilities)),
            TransportEvent::CapabilitiesFetchFailed { destination_id } => (destination_id, None),
        };

        if self.pending.remove(&destination_id).is_none() {
            debug!(
                target: "printdest.resolver",
                destination_id = %destination_id,
                "Ignoring capability event with no outstanding fetch"
            );
            return None;
        }

        let resolution = match document.map(Capabilities::from_json) {
            Some(Ok(capabilities)) => CapabilityResolution::Resolved {
                destination_id,
                capabilities,
            },
            Some(Err(err)) => CapabilityResolution::Failed {
                destination_id,
                failure: FetchFailure::InvalidCapabilities(err),
            },
            None => CapabilityResolution::Failed {
                destination_id,
                failure: FetchFailure::Transport,
            },
        };
        Some(resolution)
    }
}
