//! Command-line front end for the print destination engine.

#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use anyhow as _;
use tracing_subscriber as _;

pub mod error;
pub mod parser;
pub mod scenario;
pub mod simulate;

pub use error::CliError;
pub use parser::{Cli, Commands};
pub use scenario::{Action, CapabilityReply, Scenario, SetupReply};
pub use simulate::{ActionRecord, SimulationReport};
