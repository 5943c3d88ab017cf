// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package discovery, name resolution, and the dependency graph.
//!
//! The models root is scanned once at startup; the resulting table keeps
//! scan order, which is the tie-breaking order for type/api/method
//! resolution.

mod graph;

use indexmap::IndexMap;
use npc_core::{ApiRegistry, ApiSpec, ServiceId, ServiceManifest, ServiceMetadata, CONTROL_SERVICE};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Immutable description of one discovered package. Only `dependencies`
/// mutates after discovery, appended by `check_dependency` calls.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub id: ServiceId,
    pub service_type: String,
    pub api: ApiSpec,
    pub path: PathBuf,
    /// Unix socket path the worker binds (`<cache-root>/<id>`).
    pub endpoint: PathBuf,
    /// Addresses this service has declared it depends on.
    pub dependencies: Vec<String>,
}

/// Resolution and discovery errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Service {0} not found")]
    ServiceNotFound(String),

    #[error("Service with method {0} not found")]
    MethodNotFound(String),

    #[error("There are dependency cycles: {0}")]
    DependencyCycle(String),

    #[error("failed to scan models path {0}: {1}")]
    Scan(PathBuf, #[source] std::io::Error),
}

/// Service name resolution and metadata queries.
#[derive(Debug)]
pub struct MetadataManager {
    services: IndexMap<String, ServiceDescriptor>,
    models_path: PathBuf,
}

impl MetadataManager {
    /// Scan `models_path` non-recursively for package directories holding
    /// a `config.yml`. Packages whose manifest is unreadable or whose type
    /// is not in `registry` are skipped with a warning.
    pub fn scan(
        models_path: &Path,
        endpoint_root: &Path,
        registry: &ApiRegistry,
    ) -> Result<Self, MetadataError> {
        let mut package_dirs: Vec<PathBuf> = std::fs::read_dir(models_path)
            .map_err(|e| MetadataError::Scan(models_path.to_path_buf(), e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir() && path.join("config.yml").is_file())
            .collect();
        package_dirs.sort();

        let mut services = IndexMap::new();
        for path in package_dirs {
            let id = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let manifest = match ServiceManifest::load(&path) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(package = %id, error = %e, "skipping package with bad manifest");
                    continue;
                }
            };
            let service_type = match manifest.service_type() {
                Some(t) => t.to_string(),
                None => {
                    warn!(package = %id, "skipping package without model_type or type key");
                    continue;
                }
            };
            let api = match registry.get(&service_type) {
                Some(spec) => *spec,
                None => {
                    warn!(package = %id, service_type, "skipping package with unknown type");
                    continue;
                }
            };
            info!(package = %id, service_type, api_name = api.api_name, "discovered service");
            services.insert(
                id.clone(),
                ServiceDescriptor {
                    endpoint: endpoint_root.join(&id),
                    id: ServiceId::new(id),
                    service_type,
                    api,
                    path,
                    dependencies: Vec::new(),
                },
            );
        }

        Ok(Self { services, models_path: models_path.to_path_buf() })
    }

    /// Models root this table was scanned from.
    pub fn models_path(&self) -> &Path {
        &self.models_path
    }

    /// Resolve a client-facing address to a service id.
    ///
    /// Order: the control pseudo-id, exact package id, first package with a
    /// matching type or api name, then (when a method is supplied) the
    /// first package declaring that method.
    pub fn resolve(&self, address: &str, method: Option<&str>) -> Result<String, MetadataError> {
        if address == CONTROL_SERVICE {
            return Ok(CONTROL_SERVICE.to_string());
        }
        if self.services.contains_key(address) {
            return Ok(address.to_string());
        }
        for (id, service) in &self.services {
            if service.service_type == address || service.api.api_name == address {
                return Ok(id.clone());
            }
        }
        match method {
            Some(method) => self.resolve_by_method(method),
            None => Err(MetadataError::ServiceNotFound(address.to_string())),
        }
    }

    /// First service in table order declaring `method`.
    pub fn resolve_by_method(&self, method: &str) -> Result<String, MetadataError> {
        for (id, service) in &self.services {
            if service.api.has_method(method) {
                return Ok(id.clone());
            }
        }
        Err(MetadataError::MethodNotFound(method.to_string()))
    }

    /// Descriptor for an exact id.
    pub fn descriptor(&self, id: &str) -> Result<&ServiceDescriptor, MetadataError> {
        self.services.get(id).ok_or_else(|| MetadataError::ServiceNotFound(id.to_string()))
    }

    /// All descriptors in scan order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.values()
    }

    /// All service ids in scan order.
    pub fn ids(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Record that `id` depends on `dependency` (any resolvable address).
    /// The edge is kept even if a later cycle check rejects the graph.
    pub fn add_dependency(&mut self, id: &str, dependency: &str) -> Result<(), MetadataError> {
        let service = self
            .services
            .get_mut(id)
            .ok_or_else(|| MetadataError::ServiceNotFound(id.to_string()))?;
        service.dependencies.push(dependency.to_string());
        Ok(())
    }

    /// Reject the dependency graph if any strongly connected component has
    /// more than one node. The error lists each cycle as
    /// `a -> b -> a`.
    pub fn check_dependency_cycles(&self) -> Result<(), MetadataError> {
        let mut edges: IndexMap<String, Vec<String>> = IndexMap::new();
        for (id, service) in &self.services {
            let mut resolved = Vec::with_capacity(service.dependencies.len());
            for dependency in &service.dependencies {
                resolved.push(self.resolve(dependency, None)?);
            }
            edges.insert(id.clone(), resolved);
        }

        let cycles: Vec<Vec<String>> = graph::strongly_connected_components(&edges)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .collect();
        if cycles.is_empty() {
            return Ok(());
        }
        let listing = cycles
            .iter()
            .map(|cycle| {
                let mut closed = cycle.clone();
                if let Some(first) = cycle.first() {
                    closed.push(first.clone());
                }
                closed.join(" -> ")
            })
            .collect::<Vec<_>>()
            .join("\n");
        Err(MetadataError::DependencyCycle(listing))
    }

    /// Client-facing metadata for any resolvable address.
    pub fn metadata(&self, address: &str) -> Result<ServiceMetadata, MetadataError> {
        let id = self.resolve(address, None)?;
        let service = self.descriptor(&id)?;
        Ok(ServiceMetadata {
            id: service.id.to_string(),
            service_type: service.service_type.clone(),
            api_name: service.api.api_name.to_string(),
            path: service.path.clone(),
            short_description: service.api.short_description.to_string(),
            description: service.api.description.to_string(),
            readme: read_readme(&service.path),
        })
    }

    /// Metadata for every discovered service, in scan order.
    pub fn services_metadata(&self) -> Result<Vec<ServiceMetadata>, MetadataError> {
        self.services.keys().map(|id| self.metadata(id)).collect()
    }
}

/// README.md body after the last `---` marker; whole file when there is no
/// marker, empty when there is no README.
fn read_readme(package_dir: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(package_dir.join("README.md")) else {
        return String::new();
    };
    match content.rsplit_once("---") {
        Some((_, body)) => body.to_string(),
        None => content,
    }
}

#[cfg(test)]
#[path = "../metadata_tests.rs"]
mod tests;
