//! Scenario files for `printdest simulate`.
//!
//! A scenario lists the destinations the simulated transport knows, how it
//! answers capability fetches and setup requests, and the user actions to
//! replay:
//!
//! ```json
//! {
//!   "settings": { "selection_policy": "gated" },
//!   "destinations": [
//!     { "id": "p1", "type": "local", "origin": "cros", "displayName": "Lab" }
//!   ],
//!   "capabilities": { "p1": "fail" },
//!   "setup": { "p1": { "resolve": { "printerId": "p1", "success": false } } },
//!   "actions": [ { "action": "configure", "id": "p1" } ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use printdest_core::{Destination, DestinationId, SetupResponse, StoreSettings};
use printdest_runtime::{FetchScript, SetupScript};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// How the simulated transport answers a capability fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityReply {
    Respond(serde_json::Value),
    Fail,
    Hold,
}

impl From<CapabilityReply> for FetchScript {
    fn from(reply: CapabilityReply) -> Self {
        match reply {
            CapabilityReply::Respond(document) => Self::Respond(document),
            CapabilityReply::Fail => Self::Fail,
            CapabilityReply::Hold => Self::Hold,
        }
    }
}

/// How the simulated transport answers a setup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupReply {
    Resolve(SetupResponse),
    Reject(serde_json::Value),
}

impl From<SetupReply> for SetupScript {
    fn from(reply: SetupReply) -> Self {
        match reply {
            SetupReply::Resolve(response) => Self::Resolve(response),
            SetupReply::Reject(payload) => Self::Reject(payload),
        }
    }
}

/// One user action to replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Direct selection from the destination list.
    Select { id: DestinationId },
    /// Managed selection through the setup handshake.
    Configure { id: DestinationId },
    /// Let the search controller pick the flow.
    Activate { id: DestinationId },
    Remove { id: DestinationId },
    RequestCapabilities { id: DestinationId },
    Discover,
}

impl Action {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Configure { .. } => "configure",
            Self::Activate { .. } => "activate",
            Self::Remove { .. } => "remove",
            Self::RequestCapabilities { .. } => "request_capabilities",
            Self::Discover => "discover",
        }
    }

    pub const fn destination_id(&self) -> Option<&DestinationId> {
        match self {
            Self::Select { id }
            | Self::Configure { id }
            | Self::Activate { id }
            | Self::Remove { id }
            | Self::RequestCapabilities { id } => Some(id),
            Self::Discover => None,
        }
    }
}

/// A parsed scenario file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub settings: StoreSettings,
    pub destinations: Vec<Destination>,
    pub capabilities: HashMap<DestinationId, CapabilityReply>,
    pub setup: HashMap<DestinationId, SetupReply>,
    pub actions: Vec<Action>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ScenarioRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| CliError::ScenarioParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
