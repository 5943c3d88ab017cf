// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control service: owns every worker slot, routes requests, and exposes
//! the administrative JSON-RPC surface under the pseudo-id `control`.

mod admin;
mod dispatcher;
mod probe;
mod slot;

use crate::metadata::{MetadataError, MetadataManager};
use npc_core::{ServiceState, CONTROL_SERVICE};
use npc_wire::{Dispatcher, RpcRequest};
use parking_lot::Mutex;
use slot::{PendingRequest, Slot};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Depth of each worker's request queue.
const REQUEST_QUEUE_DEPTH: usize = 64;

/// Control service failures, surfaced to clients as `-32000` errors.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Service {0} is not running")]
    NotRunning(String),

    #[error("Service {0} is already running")]
    AlreadyRunning(String),

    #[error("Error in service {0}. Process is not alive.")]
    ProcessDead(String),

    #[error("failed to spawn worker for {0}: {1}")]
    Spawn(String, #[source] std::io::Error),

    #[error("invalid request body: {0}")]
    BadRequest(#[from] serde_json::Error),

    #[error("Service {0} has no worker")]
    NotAWorker(String),
}

/// Tunables for worker lifecycle management.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Worker executable spawned for each service.
    pub worker_bin: PathBuf,
    /// Receive timeout for one readiness probe round-trip.
    pub ready_timeout: Duration,
    /// Delay between readiness attempts.
    pub ready_backoff: Duration,
    /// Maximum readiness attempts; 0 retries forever.
    pub ready_attempts: u64,
    /// Grace period between SIGTERM and SIGKILL on stop.
    pub drain_timeout: Duration,
}

impl ControlConfig {
    /// Configuration from the environment (see `env`).
    pub fn from_env() -> Self {
        Self {
            worker_bin: crate::env::worker_bin(),
            ready_timeout: crate::env::ready_timeout(),
            ready_backoff: Duration::from_secs(1),
            ready_attempts: crate::env::ready_attempts(),
            drain_timeout: crate::env::drain_timeout(),
        }
    }
}

/// Mutable broker state: the package table plus one slot per package.
pub(crate) struct ControlState {
    pub metadata: MetadataManager,
    pub slots: HashMap<String, Slot>,
}

pub(crate) struct ControlInner {
    pub state: Mutex<ControlState>,
    pub config: ControlConfig,
    admin: Dispatcher<ControlService>,
}

/// Handle to the control service; cheap to clone, shared by front-ends
/// and background tasks.
#[derive(Clone)]
pub struct ControlService {
    inner: Arc<ControlInner>,
}

impl ControlService {
    /// Build the slot table (every slot STOPPED) and the admin dispatcher.
    pub fn new(metadata: MetadataManager, config: ControlConfig) -> Self {
        let slots = metadata.ids().into_iter().map(|id| (id, Slot::new())).collect();
        Self {
            inner: Arc::new(ControlInner {
                state: Mutex::new(ControlState { metadata, slots }),
                config,
                admin: admin::dispatcher(),
            }),
        }
    }

    /// Ids of every discovered service, in scan order.
    pub fn service_ids(&self) -> Vec<String> {
        self.inner.state.lock().metadata.ids()
    }

    /// Route one JSON-RPC request to the addressed service and return the
    /// raw reply.
    ///
    /// Admin requests are dispatched locally; worker requests are queued
    /// onto the slot's dispatcher task. A request whose worker is stopped
    /// mid-await resolves to an empty string rather than an error.
    pub async fn handle_request(&self, address: &str, body: &str) -> Result<String, ControlError> {
        let request: RpcRequest = serde_json::from_str(body)?;
        let service_id = {
            let mut state = self.inner.state.lock();
            let id = state.metadata.resolve(address, Some(&request.method))?;
            ensure_process_alive(&mut state, &id)?;
            id
        };
        info!(address, service_id, method = %request.method, "routing request");

        if service_id == CONTROL_SERVICE {
            return Ok(self.dispatch_admin(body));
        }

        let sender = {
            let state = self.inner.state.lock();
            let slot = state
                .slots
                .get(&service_id)
                .ok_or_else(|| MetadataError::ServiceNotFound(service_id.clone()))?;
            if slot.state != ServiceState::Running {
                return Err(ControlError::NotRunning(service_id));
            }
            slot.sender.clone().ok_or_else(|| ControlError::NotRunning(service_id.clone()))?
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let pending = PendingRequest { body: body.to_string(), reply: reply_tx };
        if sender.send(pending).await.is_err() {
            // Worker stopped between the state check and the enqueue.
            return Ok(String::new());
        }
        Ok(reply_rx.await.unwrap_or_default())
    }

    /// Execute an admin request against the control dispatcher.
    pub fn dispatch_admin(&self, body: &str) -> String {
        let mut ctx = self.clone();
        self.inner.admin.handle(&mut ctx, body)
    }

    /// Current state of a service's slot.
    pub fn get_service_status(&self, address: &str) -> Result<ServiceState, ControlError> {
        let mut state = self.inner.state.lock();
        let id = state.metadata.resolve(address, None)?;
        if id == CONTROL_SERVICE {
            return Ok(ServiceState::Running);
        }
        ensure_process_alive(&mut state, &id)?;
        let slot =
            state.slots.get(&id).ok_or_else(|| MetadataError::ServiceNotFound(id.clone()))?;
        Ok(slot.state)
    }

    /// Spawn the worker subprocess for a service and begin probing it.
    ///
    /// Returns as soon as the process is forked; readiness is confirmed in
    /// the background. ERROR and TIMEOUT slots may be restarted; anything
    /// with a live start attempt is rejected.
    pub fn start_service(&self, address: &str) -> Result<(), ControlError> {
        let mut state = self.inner.state.lock();
        let id = state.metadata.resolve(address, None)?;
        if id == CONTROL_SERVICE {
            return Err(ControlError::NotAWorker(id));
        }
        ensure_process_alive(&mut state, &id)?;

        let (package_path, endpoint) = {
            let descriptor = state.metadata.descriptor(&id)?;
            (descriptor.path.clone(), descriptor.endpoint.clone())
        };
        let slot =
            state.slots.get_mut(&id).ok_or_else(|| MetadataError::ServiceNotFound(id.clone()))?;
        if slot.state.expects_live_process() {
            return Err(ControlError::AlreadyRunning(id));
        }

        let child = Command::new(&self.inner.config.worker_bin)
            .arg(&package_path)
            .arg(&endpoint)
            .arg(&id)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| ControlError::Spawn(id.clone(), e))?;
        info!(service_id = %id, pid = child.id(), "worker spawned");

        slot.process = Some(child);
        slot.state = ServiceState::Starting;
        slot.epoch += 1;
        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        slot.sender = Some(request_tx);
        let cancel = CancellationToken::new();
        slot.cancel = Some(cancel.clone());

        tokio::spawn(probe::confirm_state(
            Arc::clone(&self.inner),
            id,
            slot.epoch,
            endpoint,
            request_rx,
            cancel,
        ));
        Ok(())
    }

    /// Stop a running worker: cancel its dispatcher, terminate the
    /// process, release the slot.
    pub fn stop_service(&self, address: &str) -> Result<(), ControlError> {
        let mut state = self.inner.state.lock();
        let id = state.metadata.resolve(address, None)?;
        if id == CONTROL_SERVICE {
            return Err(ControlError::NotAWorker(id));
        }
        ensure_process_alive(&mut state, &id)?;
        let slot =
            state.slots.get_mut(&id).ok_or_else(|| MetadataError::ServiceNotFound(id.clone()))?;
        if slot.state != ServiceState::Running {
            return Err(ControlError::NotRunning(id));
        }

        teardown_slot(slot, self.inner.config.drain_timeout);
        slot.state = ServiceState::Stopped;
        info!(service_id = %id, "service stopped");
        Ok(())
    }

    /// Stop then start.
    pub fn restart_service(&self, address: &str) -> Result<(), ControlError> {
        self.stop_service(address)?;
        self.start_service(address)
    }

    /// Record a dependency edge and re-run the cycle check. The edge is
    /// kept even when the check fails; see the README.
    pub fn check_dependency(&self, address: &str, dependency: &str) -> Result<(), ControlError> {
        let mut state = self.inner.state.lock();
        let id = state.metadata.resolve(address, None)?;
        if id == CONTROL_SERVICE {
            return Err(ControlError::NotAWorker(id));
        }
        state.metadata.add_dependency(&id, dependency)?;
        state.metadata.check_dependency_cycles()?;
        Ok(())
    }

    /// Metadata for every discovered service.
    pub fn services_metadata(&self) -> Result<Vec<npc_core::ServiceMetadata>, ControlError> {
        Ok(self.inner.state.lock().metadata.services_metadata()?)
    }

    /// Metadata for one service (any resolvable address).
    pub fn service_metadata(
        &self,
        address: &str,
    ) -> Result<npc_core::ServiceMetadata, ControlError> {
        Ok(self.inner.state.lock().metadata.metadata(address)?)
    }

    /// Pid of a service's live worker process.
    pub fn process_id(&self, address: &str) -> Option<u32> {
        let state = self.inner.state.lock();
        let id = state.metadata.resolve(address, None).ok()?;
        state.slots.get(&id).and_then(Slot::process_id)
    }

    /// Best-effort teardown of every non-stopped slot. Called on broker
    /// shutdown; failures are swallowed.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        for (id, slot) in state.slots.iter_mut() {
            if slot.state == ServiceState::Stopped {
                continue;
            }
            info!(service_id = %id, state = %slot.state, "terminating worker on shutdown");
            teardown_slot(slot, self.inner.config.drain_timeout);
            slot.state = ServiceState::Stopped;
        }
    }
}

/// Force the slot to ERROR when its process died under a live state.
fn ensure_process_alive(state: &mut ControlState, id: &str) -> Result<(), ControlError> {
    if id == CONTROL_SERVICE {
        return Ok(());
    }
    let slot =
        state.slots.get_mut(id).ok_or_else(|| MetadataError::ServiceNotFound(id.to_string()))?;
    if slot.state.expects_live_process() && !slot.process_alive() {
        slot.state = ServiceState::Error;
        return Err(ControlError::ProcessDead(id.to_string()));
    }
    Ok(())
}

/// Release a slot's runtime resources: queue, dispatcher, process.
fn teardown_slot(slot: &mut Slot, drain_timeout: Duration) {
    slot.epoch += 1;
    slot.sender = None;
    if let Some(cancel) = slot.cancel.take() {
        cancel.cancel();
    }
    slot.dispatcher = None;
    if let Some(child) = slot.process.take() {
        terminate(child, drain_timeout);
    }
}

/// SIGTERM the worker, escalating to SIGKILL after the drain timeout.
fn terminate(mut child: Child, drain_timeout: Duration) {
    if let Some(pid) = child.id() {
        let result = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            nix::sys::signal::Signal::SIGTERM,
        );
        if let Err(e) = result {
            warn!(pid, error = %e, "failed to signal worker");
        }
    }
    tokio::spawn(async move {
        if tokio::time::timeout(drain_timeout, child.wait()).await.is_err() {
            warn!("worker ignored SIGTERM, killing");
            let _ = child.kill().await;
        }
    });
}

#[cfg(test)]
#[path = "../control_tests.rs"]
mod tests;
