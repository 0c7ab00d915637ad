//! Core of the print destination engine.
//!
//! This crate holds the destination model, the transport and event ports,
//! and the services that resolve capabilities and drive selection. It has
//! no runtime of its own: callers feed transport events in and receive
//! [`StoreEvent`]s through a [`StoreEventEmitter`].
//!
//! # Layout
//!
//! - [`domain`] - destinations and capability documents
//! - [`ports`] - the native transport and event emitter traits
//! - [`services`] - capability resolver, setup coordinator, store, search
//! - [`events`] - events emitted by the store
//! - [`settings`] - store configuration

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod services;
pub mod settings;

pub use domain::{
    Capabilities, CapabilitiesError, ConnectionStatus, Destination, DestinationId,
    DestinationOrigin, DestinationType,
};
pub use events::StoreEvent;
pub use ports::{
    NativeTransport, NoopEmitter, SetupRejection, SetupResponse, StoreError, StoreEventEmitter,
    TransportEvent,
};
pub use services::{
    CapabilityResolution, CapabilityResolver, DestinationSearch, DestinationStore, FetchDecision,
    FetchFailure, SelectionOutcome, SetupCoordinator, SetupFailure, SetupOutcome,
};
pub use settings::{
    DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_TRANSPORT_EVENT_BUFFER, SelectionPolicy,
    SettingsError, StoreSettings, validate_settings,
};
