// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service identity, runtime state, and client-facing metadata.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::PathBuf;

/// Pseudo-id addressing the broker's own administrative dispatcher.
pub const CONTROL_SERVICE: &str = "control";

/// Unique identifier for a managed service.
///
/// The id is the directory name of the service's package under the models
/// root and doubles as the client-facing address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(pub String);

impl ServiceId {
    /// Create a new ServiceId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value of this ServiceId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ServiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for ServiceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ServiceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Runtime state of a worker slot.
///
/// The lowercase serde names are the wire values: a worker's `status`
/// method answers with one of these strings, and `get_service_status`
/// returns them to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Awaiting,
    Timeout,
    Error,
}

impl ServiceState {
    /// Wire string for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Stopped => "stopped",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Awaiting => "awaiting",
            ServiceState::Timeout => "timeout",
            ServiceState::Error => "error",
        }
    }

    /// States in which the broker believes an OS process should be alive.
    pub fn expects_live_process(&self) -> bool {
        matches!(
            self,
            ServiceState::Starting | ServiceState::Running | ServiceState::Awaiting
        )
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-facing metadata for one service, as returned by the
/// `get_service_metadata` and `get_services_metadata` control methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub api_name: String,
    pub path: PathBuf,
    pub short_description: String,
    pub description: String,
    /// README.md body below the first `---` marker, empty if absent.
    pub readme: String,
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
