//! Selection services.
//!
//! Services own the selection state machine and depend only on ports.

mod capability_resolver;
mod destination_search;
mod destination_store;
mod setup_coordinator;

pub use capability_resolver::{
    CapabilityResolution, CapabilityResolver, FetchDecision, FetchFailure,
};
pub use destination_search::DestinationSearch;
pub use destination_store::{DestinationStore, SelectionOutcome};
pub use setup_coordinator::{
    SetupCoordinator, SetupFailure, SetupFollower, SetupLease, SetupOutcome, SetupTicket,
};
