//! Store configuration and validation.
//!
//! All fields are optional to support partial configuration files and
//! graceful defaults.

use serde::{Deserialize, Serialize};

/// Default capacity of the store event broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Default buffer for transport events waiting to reach the store.
pub const DEFAULT_TRANSPORT_EVENT_BUFFER: usize = 32;

const CHANNEL_RANGE: std::ops::RangeInclusive<usize> = 1..=4096;

/// How the store treats a selection whose destination has no capabilities yet.
///
/// Chosen once when the store is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Selection reflects user intent immediately; the capability fetch is a
    /// background refinement.
    #[default]
    Direct,
    /// Selection is only committed once the setup handshake for the
    /// destination reports success.
    Gated,
}

impl SelectionPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Gated => "gated",
        }
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "gated" | "managed" => Ok(Self::Gated),
            other => Err(SettingsError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreSettings {
    /// Selection policy; defaults to `direct`.
    pub selection_policy: Option<SelectionPolicy>,

    /// Capacity of the store event broadcast channel (1-4096).
    pub event_channel_capacity: Option<usize>,

    /// Buffer for pending transport events (1-4096).
    pub transport_event_buffer: Option<usize>,
}

impl StoreSettings {
    /// Create settings with explicit defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            selection_policy: Some(SelectionPolicy::Direct),
            event_channel_capacity: Some(DEFAULT_EVENT_CHANNEL_CAPACITY),
            transport_event_buffer: Some(DEFAULT_TRANSPORT_EVENT_BUFFER),
        }
    }

    #[must_use]
    pub const fn effective_policy(&self) -> SelectionPolicy {
        match self.selection_policy {
            Some(policy) => policy,
            None => SelectionPolicy::Direct,
        }
    }

    #[must_use]
    pub const fn effective_event_channel_capacity(&self) -> usize {
        match self.event_channel_capacity {
            Some(capacity) => capacity,
            None => DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }

    #[must_use]
    pub const fn effective_transport_event_buffer(&self) -> usize {
        match self.transport_event_buffer {
            Some(buffer) => buffer,
            None => DEFAULT_TRANSPORT_EVENT_BUFFER,
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Event channel capacity must be between 1 and 4096, got {0}")]
    InvalidEventCapacity(usize),

    #[error("Transport event buffer must be between 1 and 4096, got {0}")]
    InvalidTransportBuffer(usize),

    #[error("Unknown selection policy '{0}' (expected 'direct' or 'gated')")]
    UnknownPolicy(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &StoreSettings) -> Result<(), SettingsError> {
    if let Some(capacity) = settings.event_channel_capacity {
        if !CHANNEL_RANGE.contains(&capacity) {
            return Err(SettingsError::InvalidEventCapacity(capacity));
        }
    }

    if let Some(buffer) = settings.transport_event_buffer {
        if !CHANNEL_RANGE.contains(&buffer) {
            return Err(SettingsError::InvalidTransportBuffer(buffer));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = StoreSettings::with_defaults();
        assert_eq!(settings.effective_policy(), SelectionPolicy::Direct);
        assert_eq!(settings.effective_event_channel_capacity(), 64);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_empty_settings_fall_back() {
        let settings = StoreSettings::default();
        assert_eq!(settings.effective_policy(), SelectionPolicy::Direct);
        assert_eq!(
            settings.effective_transport_event_buffer(),
            DEFAULT_TRANSPORT_EVENT_BUFFER
        );
    }

    #[test]
    fn test_invalid_capacity() {
        let settings = StoreSettings {
            event_channel_capacity: Some(0),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidEventCapacity(0))
        );

        let settings = StoreSettings {
            transport_event_buffer: Some(10_000),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidTransportBuffer(10_000))
        );
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("gated".parse::<SelectionPolicy>(), Ok(SelectionPolicy::Gated));
        assert_eq!("Managed".parse::<SelectionPolicy>(), Ok(SelectionPolicy::Gated));
        assert_eq!(" direct ".parse::<SelectionPolicy>(), Ok(SelectionPolicy::Direct));
        assert!(matches!(
            "kiosk".parse::<SelectionPolicy>(),
            Err(SettingsError::UnknownPolicy(p)) if p == "kiosk"
        ));
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: StoreSettings =
            serde_json::from_str(r#"{ "selection_policy": "gated" }"#).unwrap();
        assert_eq!(settings.effective_policy(), SelectionPolicy::Gated);
        assert_eq!(settings.event_channel_capacity, None);
    }
}
