//! CLI-specific error types.

use std::path::PathBuf;

use printdest_core::{SettingsError, StoreError};
use printdest_runtime::SessionError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// The scenario file could not be read.
    #[error("Cannot read scenario '{}': {source}", path.display())]
    ScenarioRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The scenario file is not valid scenario JSON.
    #[error("Invalid scenario '{}': {source}", path.display())]
    ScenarioParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Scenario settings failed validation.
    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    /// The session could not be started or stopped.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// An action referenced a destination the store does not know.
    #[error("{0}")]
    Store(#[from] StoreError),
}
