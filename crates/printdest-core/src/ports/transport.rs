//! Native transport port.
//!
//! The transport is the out-of-process print service that enumerates
//! destinations, fetches capability documents and performs device setup.
//! Only its request/response/event contract lives here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Capabilities, Destination, DestinationId};

/// Answer to a setup request.
///
/// `success == false` is the transport explicitly refusing the destination,
/// which is distinct from the request being rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub printer_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
}

impl SetupResponse {
    /// Successful setup carrying the resolved capabilities.
    pub fn succeeded(printer_id: impl Into<String>, capabilities: Option<Capabilities>) -> Self {
        Self {
            printer_id: printer_id.into(),
            success: true,
            capabilities,
        }
    }

    /// Answer reporting that setup did not succeed.
    pub fn refused(printer_id: impl Into<String>) -> Self {
        Self {
            printer_id: printer_id.into(),
            success: false,
            capabilities: None,
        }
    }
}

/// The transport failed before answering a setup request.
///
/// The payload is opaque; it is often nothing more than the raw destination id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("setup request rejected: {payload}")]
pub struct SetupRejection {
    pub payload: serde_json::Value,
}

impl SetupRejection {
    pub fn new(payload: impl Into<serde_json::Value>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Events the transport emits asynchronously.
///
/// Every capability fetch ends in exactly one `CapabilitiesSet` or
/// `CapabilitiesFetchFailed` for its destination id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// Result of a discovery pass.
    DestinationsSet { destinations: Vec<Destination> },

    /// A capability fetch finished. The document is forwarded untouched.
    CapabilitiesSet {
        destination_id: DestinationId,
        capabilities: serde_json::Value,
    },

    /// A capability fetch could not produce a document.
    CapabilitiesFetchFailed { destination_id: DestinationId },
}

impl TransportEvent {
    /// Destination the event is about, for per-destination events.
    pub const fn destination_id(&self) -> Option<&DestinationId> {
        match self {
            Self::DestinationsSet { .. } => None,
            Self::CapabilitiesSet { destination_id, .. }
            | Self::CapabilitiesFetchFailed { destination_id } => Some(destination_id),
        }
    }
}

/// Port for the native print transport.
///
/// # Design
///
/// - **Fire-and-forget fetches**: `start_capability_fetch` returns at once;
///   the outcome arrives as a [`TransportEvent`] on the transport's channel
/// - **Future-based setup**: `setup_destination` resolves to a response or
///   an opaque rejection
/// - **Object-safe**: stored as `Arc<dyn NativeTransport>`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NativeTransport: Send + Sync {
    /// Ask the transport to enumerate destinations.
    ///
    /// Results arrive as [`TransportEvent::DestinationsSet`].
    fn start_discovery(&self);

    /// Start fetching the capability document for a destination.
    fn start_capability_fetch(&self, destination_id: &DestinationId);

    /// Run the setup handshake for a managed destination.
    async fn setup_destination(
        &self,
        destination_id: &DestinationId,
    ) -> Result<SetupResponse, SetupRejection>;
}
