// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker's receive/dispatch/reply loop.

use crate::service::{Service, ServiceRegistry, WorkerError};
use npc_wire::{read_message, write_message, Dispatcher, ProtocolError, RpcError};
use serde_json::Value;
use std::path::Path;
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

/// Run a worker until its endpoint fails or a termination signal arrives.
///
/// Binds a reply socket at `endpoint`, registers every declared API method
/// plus the synthetic `status`, then serves requests one at a time: the
/// worker is single-threaded with respect to its endpoint, so replies
/// leave in arrival order.
pub async fn run(
    registry: &ServiceRegistry,
    package_dir: &Path,
    endpoint: &Path,
    service_id: &str,
) -> Result<(), WorkerError> {
    let (mut service, spec) = registry.create(package_dir)?;
    info!(
        service_id,
        service_type = spec.service_type,
        api_name = spec.api_name,
        "service instantiated"
    );

    let dispatcher = build_dispatcher(spec.methods);
    let listener = bind_endpoint(endpoint)?;
    let mut sigterm = signal(SignalKind::terminate())?;

    'accept: loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!(service_id, "termination signal received");
                break 'accept;
            }
            accepted = listener.accept() => {
                let mut stream = match accepted {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        warn!(service_id, error = %e, "accept failed");
                        continue;
                    }
                };
                debug!(service_id, "broker connected");
                loop {
                    tokio::select! {
                        _ = sigterm.recv() => {
                            info!(service_id, "termination signal received");
                            break 'accept;
                        }
                        frame = read_message(&mut stream) => match frame {
                            Ok(raw) => {
                                let request = String::from_utf8_lossy(&raw);
                                let response = dispatcher.handle(&mut service, &request);
                                if let Err(e) = write_message(&mut stream, response.as_bytes()).await {
                                    warn!(service_id, error = %e, "reply failed");
                                    break;
                                }
                            }
                            Err(ProtocolError::ConnectionClosed) => {
                                debug!(service_id, "broker disconnected");
                                break;
                            }
                            Err(e) => {
                                warn!(service_id, error = %e, "receive failed");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    let _ = std::fs::remove_file(endpoint);
    Ok(())
}

/// Method table: one forwarding handler per declared method, plus `status`.
fn build_dispatcher(methods: &'static [&'static str]) -> Dispatcher<Box<dyn Service>> {
    let mut dispatcher: Dispatcher<Box<dyn Service>> = Dispatcher::new();
    for method in methods {
        let name = (*method).to_string();
        dispatcher.register(*method, move |service: &mut Box<dyn Service>, params: &Value| {
            service.call(&name, params)
        });
    }
    dispatcher.register("status", |service: &mut Box<dyn Service>, _params: &Value| {
        serde_json::to_value(service.status())
            .map_err(|e| RpcError::internal(format!("status serialization failed: {e}")))
    });
    dispatcher
}

/// Bind the private endpoint, creating its parent directory permissively
/// and clearing any stale socket file from a previous run.
fn bind_endpoint(endpoint: &Path) -> Result<UnixListener, WorkerError> {
    if let Some(parent) = endpoint.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| WorkerError::Bind(endpoint.to_path_buf(), e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o777));
        }
    }
    let _ = std::fs::remove_file(endpoint);
    UnixListener::bind(endpoint).map_err(|e| WorkerError::Bind(endpoint.to_path_buf(), e))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
