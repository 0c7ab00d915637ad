//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! transport or runtime concerns.
//!
//! # Structure
//!
//! - `destination` - The destination entity and its identity enums
//! - `capabilities` - Capability documents and their structural validation

pub mod capabilities;
mod destination;

pub use capabilities::{
    Capabilities, CapabilitiesError, ColorOption, ContentType, CopiesCapability, DefaultMarker,
    DuplexOption, MediaSizeOption, OptionList, OrientationOption, PrinterDescription,
};
pub use destination::{
    ConnectionStatus, Destination, DestinationId, DestinationOrigin, DestinationType,
};
