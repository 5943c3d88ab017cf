// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker lifecycle: configuration, startup, shutdown.

mod startup;
pub use startup::startup;

use crate::control::{ControlConfig, ControlService};
use crate::listener::FrontEnd;
use crate::metadata::MetadataError;
use std::fs::File;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Which front-end flavor serves the public endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Envelope protocol on a TCP port.
    Framed,
    /// HTTP, address in the URL path.
    Http,
}

/// Broker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for model packages.
    pub models_path: PathBuf,
    /// Root for pid and log files.
    pub state_dir: PathBuf,
    /// Root for worker endpoint sockets.
    pub cache_root: PathBuf,
    /// Unix socket workers use to call each other.
    pub internal_endpoint: PathBuf,
    /// Pid/lock file guarding against a second broker instance.
    pub lock_path: PathBuf,
    /// Broker log file.
    pub log_path: PathBuf,
    /// Public port.
    pub port: u16,
    pub transport: Transport,
    /// Start every discovered service before serving.
    pub start_services: bool,
    pub control: ControlConfig,
}

impl Config {
    /// Resolve configuration from overrides and the environment.
    pub fn load(
        models_path: Option<PathBuf>,
        port: Option<u16>,
        transport: Transport,
        start_services: bool,
    ) -> Result<Self, LifecycleError> {
        let models_path = models_path
            .or_else(crate::env::models_path)
            .ok_or(LifecycleError::NoModelsPath)?;
        let state_dir = crate::env::state_dir()?;
        let cache_root = crate::env::cache_root()?;
        Ok(Self {
            internal_endpoint: cache_root.join("self"),
            lock_path: state_dir.join("broker.pid"),
            log_path: state_dir.join("broker.log"),
            port: port.unwrap_or_else(crate::env::public_port),
            control: ControlConfig::from_env(),
            models_path,
            state_dir,
            cache_root,
            transport,
            start_services,
        })
    }
}

/// A started broker. The front-end is returned separately so the caller
/// can drive it alongside signal handling.
pub struct Broker {
    pub config: Config,
    // NOTE(lifetime): held to maintain the exclusive pid-file lock;
    // released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub control: ControlService,
}

/// Result of [`startup`].
pub struct StartupResult {
    pub broker: Broker,
    pub front_end: Box<dyn FrontEnd>,
}

impl std::fmt::Debug for StartupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupResult").finish_non_exhaustive()
    }
}

/// Tear the broker down: terminate workers, release socket and pid files.
pub fn shutdown(broker: &Broker) {
    info!("shutting down broker");
    broker.control.shutdown();

    if broker.config.internal_endpoint.exists() {
        if let Err(e) = std::fs::remove_file(&broker.config.internal_endpoint) {
            warn!(error = %e, "failed to remove internal endpoint");
        }
    }
    if broker.config.lock_path.exists() {
        if let Err(e) = std::fs::remove_file(&broker.config.lock_path) {
            warn!(error = %e, "failed to remove pid file");
        }
    }
    info!("broker shutdown complete");
}

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no models path configured (set NPC_ENGINE_MODELS_PATH or pass --models-path)")]
    NoModelsPath,

    #[error("could not determine state directory")]
    NoStateDir,

    #[error("could not determine cache directory")]
    NoCacheDir,

    #[error("failed to acquire lock: broker already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind {0}: {1}")]
    BindFailed(String, #[source] std::io::Error),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
