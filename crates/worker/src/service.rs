// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service trait and the factory registry the worker binary populates.

use npc_core::{ApiRegistry, ApiSpec, ManifestError, ServiceManifest, ServiceState};
use npc_wire::RpcError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A concrete service implementation running inside a worker process.
pub trait Service: Send {
    /// Readiness as reported to the broker's probe. Implementations that
    /// defer loading may return `Starting` until ready.
    fn status(&mut self) -> ServiceState {
        ServiceState::Running
    }

    /// Execute one API method. `method` is always a member of the
    /// implementation's declared method set.
    fn call(&mut self, method: &str, params: &Value) -> Result<Value, RpcError>;
}

impl std::fmt::Debug for dyn Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Service")
    }
}

/// Constructor for a service type: manifest plus package directory in,
/// boxed instance out.
pub type ServiceFactory =
    fn(&ServiceManifest, &Path) -> Result<Box<dyn Service>, WorkerError>;

/// Maps manifest type names to constructors.
///
/// The API registry rides along so the worker loop can learn the method
/// set to expose without asking the instance.
pub struct ServiceRegistry {
    apis: ApiRegistry,
    factories: HashMap<&'static str, ServiceFactory>,
}

impl ServiceRegistry {
    /// Registry with every implementation this binary ships.
    pub fn builtin() -> Self {
        let mut registry =
            Self { apis: ApiRegistry::builtin(), factories: HashMap::new() };
        registry.register_factory("Echo", |manifest, dir| {
            crate::echo::EchoService::from_manifest(manifest, dir)
        });
        registry
    }

    /// Register a constructor for a type already present in the API
    /// registry, or add both at once via [`ApiRegistry::register`] first.
    pub fn register_factory(&mut self, service_type: &'static str, factory: ServiceFactory) {
        self.factories.insert(service_type, factory);
    }

    /// API specs known to this registry.
    pub fn apis(&self) -> &ApiRegistry {
        &self.apis
    }

    /// Instantiate the service described by `<package_dir>/config.yml`.
    pub fn create(
        &self,
        package_dir: &Path,
    ) -> Result<(Box<dyn Service>, &ApiSpec), WorkerError> {
        let manifest = ServiceManifest::load(package_dir)?;
        let service_type = manifest
            .service_type()
            .ok_or_else(|| WorkerError::MissingType(package_dir.to_path_buf()))?;
        let spec = self
            .apis
            .get(service_type)
            .ok_or_else(|| WorkerError::UnknownType(service_type.to_string()))?;
        let factory = self
            .factories
            .get(service_type)
            .ok_or_else(|| WorkerError::UnknownType(service_type.to_string()))?;
        let service = factory(&manifest, package_dir)?;
        Ok((service, spec))
    }
}

/// Worker-side failures.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("manifest in {0} declares no model_type or type key")]
    MissingType(PathBuf),

    #[error("no implementation registered for type {0}")]
    UnknownType(String),

    #[error("invalid service configuration: {0}")]
    Config(String),

    #[error("failed to bind endpoint {0}: {1}")]
    Bind(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
