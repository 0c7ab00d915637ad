//! Destination entity and its identity enums.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::capabilities::Capabilities;

/// Opaque destination identifier, stable and unique within one transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DestinationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DestinationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of printable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationType {
    /// Cloud print destination.
    Google,
    /// Printer reachable through the local print system.
    Local,
    /// Mobile device acting as a print target.
    Mobile,
}

/// Where a destination was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationOrigin {
    /// Local print system.
    Local,
    /// Cloud account (cookie authenticated).
    Cookies,
    /// Device-attached cloud destination (kiosk style).
    Device,
    /// Zero-config network printer.
    Privet,
    /// Provided by a printer-provider extension.
    Extension,
    /// Managed by the operating system's printer configuration.
    Cros,
}

impl DestinationOrigin {
    /// Whether destinations of this origin need an explicit setup handshake
    /// before they can be used.
    pub const fn requires_setup(self) -> bool {
        matches!(self, Self::Cros)
    }
}

/// Last known reachability of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Online,
    Offline,
    Dormant,
    Unregistered,
    #[default]
    Unknown,
}

/// One printable target.
///
/// `id`, `kind` and `origin` are fixed at construction. Display name,
/// connection status and capabilities are the only mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    id: DestinationId,
    #[serde(rename = "type")]
    kind: DestinationType,
    origin: DestinationOrigin,
    display_name: String,
    #[serde(default)]
    connection_status: ConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capabilities: Option<Capabilities>,
}

impl Destination {
    /// Create a destination with no resolved capabilities.
    pub fn new(
        id: impl Into<DestinationId>,
        kind: DestinationType,
        origin: DestinationOrigin,
        display_name: impl Into<String>,
        connection_status: ConnectionStatus,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            origin,
            display_name: display_name.into(),
            connection_status,
            capabilities: None,
        }
    }

    /// Builder-style helper attaching an already-known capability document.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub const fn id(&self) -> &DestinationId {
        &self.id
    }

    pub const fn kind(&self) -> DestinationType {
        self.kind
    }

    pub const fn origin(&self) -> DestinationOrigin {
        self.origin
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub const fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    pub const fn capabilities(&self) -> Option<&Capabilities> {
        self.capabilities.as_ref()
    }

    /// Whether a capability document has been resolved for this destination.
    pub const fn has_capabilities(&self) -> bool {
        self.capabilities.is_some()
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }

    pub const fn set_connection_status(&mut self, status: ConnectionStatus) {
        self.connection_status = status;
    }

    pub fn set_capabilities(&mut self, capabilities: Capabilities) {
        self.capabilities = Some(capabilities);
    }

    /// Whether destinations of this kind must complete the setup handshake
    /// before they are usable.
    pub const fn requires_setup(&self) -> bool {
        self.origin.requires_setup()
    }

    /// Whether `other` has the same immutable identity.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind && self.origin == other.origin
    }

    /// Fold a newer observation of this id into the entry (last write wins).
    ///
    /// Mutable fields are taken from `newer`; resolved capabilities survive
    /// when `newer` carries none. A value with a different identity replaces
    /// the entry outright.
    pub fn absorb(&mut self, newer: Self) {
        if !self.same_identity(&newer) {
            *self = newer;
            return;
        }
        self.display_name = newer.display_name;
        self.connection_status = newer.connection_status;
        if newer.capabilities.is_some() {
            self.capabilities = newer.capabilities;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capabilities::test_fixtures::letter_printer_caps;

    fn local(id: &str) -> Destination {
        Destination::new(
            id,
            DestinationType::Local,
            DestinationOrigin::Local,
            "Office",
            ConnectionStatus::Online,
        )
    }

    #[test]
    fn test_new_destination_has_no_capabilities() {
        let dest = local("001122DEADBEEF");
        assert_eq!(dest.id().as_str(), "001122DEADBEEF");
        assert!(!dest.has_capabilities());
        assert!(!dest.requires_setup());
    }

    #[test]
    fn test_cros_origin_requires_setup() {
        let dest = Destination::new(
            "cros-1",
            DestinationType::Local,
            DestinationOrigin::Cros,
            "Managed",
            ConnectionStatus::Online,
        );
        assert!(dest.requires_setup());
    }

    #[test]
    fn test_absorb_keeps_resolved_capabilities() {
        let mut known = local("p1").with_capabilities(letter_printer_caps());
        let mut update = local("p1");
        update.set_display_name("Office (2nd floor)");
        update.set_connection_status(ConnectionStatus::Offline);

        known.absorb(update);
        assert_eq!(known.display_name(), "Office (2nd floor)");
        assert_eq!(known.connection_status(), ConnectionStatus::Offline);
        assert!(known.has_capabilities());
    }

    #[test]
    fn test_absorb_replaces_different_identity() {
        let mut known = local("p1").with_capabilities(letter_printer_caps());
        let other = Destination::new(
            "p1",
            DestinationType::Google,
            DestinationOrigin::Cookies,
            "Cloud",
            ConnectionStatus::Online,
        );
        assert!(!known.same_identity(&other));
        known.absorb(other);
        assert_eq!(known.kind(), DestinationType::Google);
        assert_eq!(known.display_name(), "Cloud");
        assert!(!known.has_capabilities());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(local("p1")).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["type"], "local");
        assert_eq!(json["displayName"], "Office");
        assert_eq!(json["connectionStatus"], "online");
        assert!(json.get("capabilities").is_none());
    }
}
