// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker startup: lock, scan, bind, build the front-end.

use super::{Broker, Config, LifecycleError, StartupResult, Transport};
use crate::control::ControlService;
use crate::listener::{FramedServer, HttpServer};
use crate::metadata::MetadataManager;
use fs2::FileExt;
use npc_core::ApiRegistry;
use std::io::Write;
use tokio::net::{TcpListener, UnixListener};
use tracing::info;

/// Start the broker: acquire the single-instance lock, discover packages,
/// bind both endpoints, and assemble the configured front-end.
///
/// Bind failures are unrecoverable; the caller exits non-zero.
pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.cache_root)?;

    // Acquire the lock before touching shared files. OpenOptions avoids
    // truncating a running broker's pid before we hold the lock.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let metadata = MetadataManager::scan(
        &config.models_path,
        &config.cache_root,
        &ApiRegistry::builtin(),
    )?;
    info!(
        models_path = %config.models_path.display(),
        services = metadata.ids().len(),
        "discovered services"
    );
    let control = ControlService::new(metadata, config.control.clone());

    let _ = std::fs::remove_file(&config.internal_endpoint);
    let internal = UnixListener::bind(&config.internal_endpoint).map_err(|e| {
        LifecycleError::BindFailed(config.internal_endpoint.display().to_string(), e)
    })?;

    let front_end: Box<dyn crate::listener::FrontEnd> = match config.transport {
        Transport::Framed => {
            let addr = format!("0.0.0.0:{}", config.port);
            let public = TcpListener::bind(&addr)
                .await
                .map_err(|e| LifecycleError::BindFailed(addr.clone(), e))?;
            info!(addr, "framed front-end bound");
            Box::new(FramedServer::new(
                public,
                internal,
                control.clone(),
                config.start_services,
            ))
        }
        Transport::Http => {
            let addr = format!("127.0.0.1:{}", config.port);
            let public = TcpListener::bind(&addr)
                .await
                .map_err(|e| LifecycleError::BindFailed(addr.clone(), e))?;
            info!(addr, "http front-end bound");
            Box::new(HttpServer::new(
                public,
                internal,
                control.clone(),
                config.start_services,
            ))
        }
    };

    Ok(StartupResult { broker: Broker { config, lock_file, control }, front_end })
}
