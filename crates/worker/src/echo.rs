// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Echo service: replies with its first parameter verbatim.
//!
//! Exists so the broker has one spawnable implementation in-tree; every
//! end-to-end test rides on it.

use crate::service::{Service, WorkerError};
use npc_core::ServiceManifest;
use npc_wire::{str_param, RpcError};
use serde_json::Value;
use std::path::Path;

/// The `Echo` implementation type behind `EchoAPI`.
pub struct EchoService {
    /// Optional prefix prepended to every reply (`prefix` manifest key).
    prefix: String,
}

impl EchoService {
    /// Build from a package manifest.
    pub fn from_manifest(
        manifest: &ServiceManifest,
        _package_dir: &Path,
    ) -> Result<Box<dyn Service>, WorkerError> {
        let prefix = match manifest.extra.get("prefix") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| WorkerError::Config("prefix must be a string".to_string()))?
                .to_string(),
            None => String::new(),
        };
        Ok(Box::new(Self { prefix }))
    }
}

impl Service for EchoService {
    fn call(&mut self, method: &str, params: &Value) -> Result<Value, RpcError> {
        match method {
            "echo" => {
                let text = str_param(params, 0, "text")?;
                Ok(Value::from(format!("{}{}", self.prefix, text)))
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }
}

#[cfg(test)]
#[path = "echo_tests.rs"]
mod tests;
