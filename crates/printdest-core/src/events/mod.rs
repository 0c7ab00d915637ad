//! Events emitted by the destination store.
//!
//! `SelectionChanged` is the only event that reflects a selection
//! transition; the rest are diagnostics a UI may use to report progress or
//! attribute failures to a destination.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "setup_failed", "destinationId": "00112233DEADBEEF", "reason": "..." }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{Destination, DestinationId};

/// Canonical store event union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A destination became the selected destination.
    ///
    /// Fired once per successful transition, carrying the destination as it
    /// stood when the selection completed.
    SelectionChanged { destination: Destination },

    /// The selected destination was evicted from the known set.
    SelectionCleared {
        #[serde(rename = "destinationId")]
        destination_id: DestinationId,
    },

    /// A capability document was stored for a destination.
    CapabilitiesResolved {
        #[serde(rename = "destinationId")]
        destination_id: DestinationId,
    },

    /// A capability fetch ended without a usable document.
    CapabilitiesFailed {
        #[serde(rename = "destinationId")]
        destination_id: DestinationId,
        reason: String,
    },

    /// The setup handshake did not succeed; the selection was left alone.
    SetupFailed {
        #[serde(rename = "destinationId")]
        destination_id: DestinationId,
        reason: String,
    },
}

impl StoreEvent {
    pub fn selection_changed(destination: Destination) -> Self {
        Self::SelectionChanged { destination }
    }

    /// Get the event name for wire protocols.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SelectionChanged { .. } => "destination:selected",
            Self::SelectionCleared { .. } => "destination:selection_cleared",
            Self::CapabilitiesResolved { .. } => "destination:capabilities_resolved",
            Self::CapabilitiesFailed { .. } => "destination:capabilities_failed",
            Self::SetupFailed { .. } => "destination:setup_failed",
        }
    }

    /// Destination the event refers to.
    pub const fn destination_id(&self) -> &DestinationId {
        match self {
            Self::SelectionChanged { destination } => destination.id(),
            Self::SelectionCleared { destination_id }
            | Self::CapabilitiesResolved { destination_id }
            | Self::CapabilitiesFailed { destination_id, .. }
            | Self::SetupFailed { destination_id, .. } => destination_id,
        }
    }

    pub const fn is_selection_change(&self) -> bool {
        matches!(self, Self::SelectionChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionStatus, DestinationOrigin, DestinationType};

    #[test]
    fn test_event_serialization() {
        let event = StoreEvent::SetupFailed {
            destination_id: DestinationId::new("00112233DEADBEEF"),
            reason: "transport refused".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"setup_failed\""));
        assert!(json.contains("\"destinationId\":\"00112233DEADBEEF\""));
    }

    #[test]
    fn test_event_names_are_stable() {
        let dest = Destination::new(
            "p1",
            DestinationType::Local,
            DestinationOrigin::Local,
            "Office",
            ConnectionStatus::Online,
        );
        let id = DestinationId::new("p1");
        let cases = vec![
            (StoreEvent::selection_changed(dest), "destination:selected"),
            (
                StoreEvent::SelectionCleared {
                    destination_id: id.clone(),
                },
                "destination:selection_cleared",
            ),
            (
                StoreEvent::CapabilitiesResolved {
                    destination_id: id.clone(),
                },
                "destination:capabilities_resolved",
            ),
            (
                StoreEvent::CapabilitiesFailed {
                    destination_id: id.clone(),
                    reason: String::new(),
                },
                "destination:capabilities_failed",
            ),
            (
                StoreEvent::SetupFailed {
                    destination_id: id,
                    reason: String::new(),
                },
                "destination:setup_failed",
            ),
        ];

        for (event, expected) in cases {
            assert_eq!(event.event_name(), expected);
            assert_eq!(event.destination_id().as_str(), "p1");
        }
    }
}
