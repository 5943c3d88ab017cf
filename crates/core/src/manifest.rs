// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package manifest (`config.yml`) parsing.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// The broker-relevant slice of a package's `config.yml`.
///
/// Implementation-specific keys are preserved in `extra` so a worker can
/// hand them to the concrete service constructor untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceManifest {
    /// Implementation type under the preferred key.
    #[serde(default)]
    pub model_type: Option<String>,
    /// Implementation type under the legacy key.
    #[serde(default, rename = "type")]
    pub type_field: Option<String>,
    /// Remaining manifest keys, opaque to the broker.
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

impl ServiceManifest {
    /// Parse a manifest from YAML text.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a manifest from `<dir>/config.yml`.
    pub fn load(package_dir: &Path) -> Result<Self, ManifestError> {
        let path = package_dir.join("config.yml");
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ManifestError::Read(path.clone(), e))?;
        Self::parse(&text)
    }

    /// Implementation type name; `model_type` wins over `type`.
    pub fn service_type(&self) -> Option<&str> {
        self.model_type.as_deref().or(self.type_field.as_deref())
    }
}

/// Manifest loading errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {0}: {1}")]
    Read(std::path::PathBuf, #[source] std::io::Error),

    #[error("invalid manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
