//! Tokio runtime wiring for the print destination engine.
//!
//! - [`PrintSession`] composes a store with its event pump and broadcaster
//! - [`spawn_event_pump`] feeds transport events into the store
//! - [`ScriptedTransport`] is an in-process transport for simulations

#![deny(unused_crate_dependencies)]

pub mod broadcaster;
pub mod pump;
pub mod scripted;
pub mod session;

pub use broadcaster::StoreEventBroadcaster;
pub use pump::spawn_event_pump;
pub use scripted::{FetchScript, ScriptedTransport, SetupScript};
pub use session::{PrintSession, SessionError, transport_channel};

#[cfg(test)]
use tokio_test as _;
