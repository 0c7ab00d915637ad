//! Capability document attached to a destination.
//!
//! The document is a nested description of the options a printer supports.
//! This crate stores and forwards it; only structural validity is checked
//! here; translating options into print settings happens elsewhere.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "printer": {
//!     "color": { "option": [{ "type": "STANDARD_MONOCHROME", "is_default": true }] },
//!     "duplex": { "option": [{ "type": "NO_DUPLEX" }, { "type": "LONG_EDGE", "is_default": true }] },
//!     "media_size": { "option": [{ "name": "NA_LETTER", "width_microns": 215900, "height_microns": 279400 }] },
//!     "page_orientation": { "option": [{ "type": "PORTRAIT", "is_default": true }] },
//!     "supported_content_type": [{ "content_type": "application/pdf" }]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A capability document as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub version: String,
    pub printer: PrinterDescription,
}

/// Printer section of the capability document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<OptionList<ColorOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<CopiesCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex: Option<OptionList<DuplexOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_size: Option<OptionList<MediaSizeOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_orientation: Option<OptionList<OrientationOption>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supported_content_type: Vec<ContentType>,
}

/// A list of options, at most one of which is marked default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct OptionList<T> {
    #[serde(default)]
    pub option: Vec<T>,
}

impl<T: DefaultMarker> OptionList<T> {
    /// The option flagged as default, if any.
    pub fn default_option(&self) -> Option<&T> {
        self.option.iter().find(|o| o.is_default())
    }

    fn default_count(&self) -> usize {
        self.option.iter().filter(|o| o.is_default()).count()
    }
}

/// Implemented by every option type carrying an `is_default` flag.
pub trait DefaultMarker {
    fn is_default(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    /// Option type, e.g. `STANDARD_COLOR` or `STANDARD_MONOCHROME`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiesCapability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplexOption {
    /// Option type, e.g. `NO_DUPLEX`, `LONG_EDGE`, `SHORT_EDGE`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSizeOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub width_microns: u32,
    pub height_microns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationOption {
    /// Option type, e.g. `PORTRAIT`, `LANDSCAPE`, `AUTO`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub content_type: String,
}

macro_rules! impl_default_marker {
    ($($ty:ty),* $(,)?) => {
        $(impl DefaultMarker for $ty {
            fn is_default(&self) -> bool {
                self.is_default
            }
        })*
    };
}

impl_default_marker!(ColorOption, DuplexOption, MediaSizeOption, OrientationOption);

/// Structural problems found in a capability document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilitiesError {
    #[error("Capability document has no version")]
    MissingVersion,

    #[error("Section '{section}' marks {count} options as default")]
    MultipleDefaults { section: &'static str, count: usize },

    #[error("Media size '{name}' has a zero dimension")]
    EmptyMediaSize { name: String },

    #[error("Malformed capability document: {0}")]
    Malformed(String),
}

impl Capabilities {
    /// Parse a capability document from its JSON form and validate it.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CapabilitiesError> {
        let caps: Self = serde_json::from_value(value)
            .map_err(|e| CapabilitiesError::Malformed(e.to_string()))?;
        caps.validate()?;
        Ok(caps)
    }

    /// Check the structural invariants of the document.
    pub fn validate(&self) -> Result<(), CapabilitiesError> {
        if self.version.trim().is_empty() {
            return Err(CapabilitiesError::MissingVersion);
        }

        let printer = &self.printer;
        check_single_default("color", printer.color.as_ref())?;
        check_single_default("duplex", printer.duplex.as_ref())?;
        check_single_default("media_size", printer.media_size.as_ref())?;
        check_single_default("page_orientation", printer.page_orientation.as_ref())?;

        if let Some(media) = &printer.media_size {
            if let Some(bad) = media
                .option
                .iter()
                .find(|m| m.width_microns == 0 || m.height_microns == 0)
            {
                return Err(CapabilitiesError::EmptyMediaSize {
                    name: bad.name.clone().unwrap_or_default(),
                });
            }
        }

        Ok(())
    }

    /// Whether the printer accepts the given MIME type.
    pub fn supports_content_type(&self, mime: &str) -> bool {
        self.printer
            .supported_content_type
            .iter()
            .any(|c| c.content_type.eq_ignore_ascii_case(mime))
    }
}

fn check_single_default<T: DefaultMarker>(
    section: &'static str,
    list: Option<&OptionList<T>>,
) -> Result<(), CapabilitiesError> {
    match list.map(OptionList::default_count) {
        Some(count) if count > 1 => Err(CapabilitiesError::MultipleDefaults { section, count }),
        _ => Ok(()),
    }
}

/// Sample capability documents shared by tests across the workspace.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures {
    use super::Capabilities;

    /// Monochrome duplex printer with letter and legal media.
    pub fn letter_printer_json() -> serde_json::Value {
        serde_json::json!({
            "printer": {
                "color": {
                    "option": [{
                        "is_default": true,
                        "type": "STANDARD_MONOCHROME",
                        "vendor_id": "13"
                    }]
                },
                "copies": {},
                "duplex": {
                    "option": [
                        { "type": "NO_DUPLEX" },
                        { "is_default": true, "type": "LONG_EDGE" },
                        { "type": "SHORT_EDGE" }
                    ]
                },
                "media_size": {
                    "option": [
                        {
                            "custom_display_name": "na letter",
                            "height_microns": 279_400,
                            "is_default": true,
                            "name": "NA_LETTER",
                            "vendor_id": "na_letter_8.5x11in",
                            "width_microns": 215_900
                        },
                        {
                            "custom_display_name": "na legal",
                            "height_microns": 355_600,
                            "name": "NA_LEGAL",
                            "vendor_id": "na_legal_8.5x14in",
                            "width_microns": 215_900
                        }
                    ]
                },
                "page_orientation": {
                    "option": [
                        { "is_default": true, "type": "PORTRAIT" },
                        { "type": "LANDSCAPE" },
                        { "type": "AUTO" }
                    ]
                },
                "supported_content_type": [{ "content_type": "application/pdf" }]
            },
            "version": "1.0"
        })
    }

    pub fn letter_printer_caps() -> Capabilities {
        serde_json::from_value(letter_printer_json()).expect("fixture is well formed")
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::{letter_printer_caps, letter_printer_json};
    use super::*;

    #[test]
    fn test_parse_fixture() {
        let caps = Capabilities::from_json(letter_printer_json()).unwrap();
        assert_eq!(caps.version, "1.0");

        let media = caps.printer.media_size.as_ref().unwrap();
        let letter = media.default_option().unwrap();
        assert_eq!(letter.name.as_deref(), Some("NA_LETTER"));
        assert_eq!(letter.width_microns, 215_900);

        let duplex = caps.printer.duplex.as_ref().unwrap();
        assert_eq!(duplex.default_option().unwrap().kind, "LONG_EDGE");
        assert!(caps.supports_content_type("application/PDF"));
        assert!(!caps.supports_content_type("image/pwg-raster"));
    }

    #[test]
    fn test_missing_option_key_is_empty_list() {
        let caps: Capabilities = serde_json::from_value(serde_json::json!({
            "version": "1.0",
            "printer": { "color": {}, "duplex": { "option": [{ "type": "NO_DUPLEX" }] } }
        }))
        .unwrap();

        assert!(caps.printer.color.as_ref().unwrap().option.is_empty());
        assert_eq!(caps.printer.duplex.as_ref().unwrap().option.len(), 1);
        assert!(caps.printer.media_size.is_none());
    }

    #[test]
    fn test_rejects_multiple_defaults() {
        let mut caps = letter_printer_caps();
        if let Some(orientation) = caps.printer.page_orientation.as_mut() {
            for option in &mut orientation.option {
                option.is_default = true;
            }
        }
        assert_eq!(
            caps.validate(),
            Err(CapabilitiesError::MultipleDefaults {
                section: "page_orientation",
                count: 3
            })
        );
    }

    #[test]
    fn test_rejects_empty_media() {
        let mut caps = letter_printer_caps();
        if let Some(media) = caps.printer.media_size.as_mut() {
            media.option[1].height_microns = 0;
        }
        assert!(matches!(
            caps.validate(),
            Err(CapabilitiesError::EmptyMediaSize { name }) if name == "NA_LEGAL"
        ));
    }

    #[test]
    fn test_rejects_missing_version() {
        let mut json = letter_printer_json();
        json["version"] = serde_json::json!("");
        assert_eq!(
            Capabilities::from_json(json),
            Err(CapabilitiesError::MissingVersion)
        );
    }

    #[test]
    fn test_malformed_document() {
        let result = Capabilities::from_json(serde_json::json!({ "printer": 7 }));
        assert!(matches!(result, Err(CapabilitiesError::Malformed(_))));
    }
}
