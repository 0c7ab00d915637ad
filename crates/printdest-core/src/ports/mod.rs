//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No channel or runtime types in any signature
//! - Transport requests are intent-based (fetch, setup, discover)
//! - Responses are opaque beyond the fields the core relies on

pub mod event_emitter;
pub mod transport;

use thiserror::Error;

use crate::domain::DestinationId;

pub use event_emitter::{NoopEmitter, StoreEventEmitter};
pub use transport::{NativeTransport, SetupRejection, SetupResponse, TransportEvent};

#[cfg(any(test, feature = "test-utils"))]
pub use event_emitter::RecordingEmitter;
#[cfg(test)]
pub use transport::MockNativeTransport;

/// Errors returned by store operations.
///
/// Asynchronous failures (fetch or setup) are not errors of the calling
/// operation; they are reported through outcomes and store events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The destination id is not in the known set.
    #[error("Unknown destination: {0}")]
    UnknownDestination(DestinationId),
}
