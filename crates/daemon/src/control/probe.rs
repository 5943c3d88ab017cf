// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness probe: polls a starting worker's `status` method until it
//! reports running, then hands the connection to the dispatcher task.

use super::slot::PendingRequest;
use super::{dispatcher, ControlInner};
use npc_core::ServiceState;
use npc_wire::{read_message, write_message, RpcRequest, RpcResponse};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of a single status round-trip.
enum ProbeStep {
    Ready(UnixStream),
    StillStarting,
    Retry,
    BadState(String),
}

/// Confirm a starting worker, transitioning its slot to RUNNING or ERROR.
///
/// Retries with `ready_backoff` between attempts: connection failures and
/// receive timeouts are not fatal (a slow-loading model eventually binds
/// and answers). The probe holds the slot's start epoch; once the slot is
/// stopped or restarted the probe exits without touching it.
pub(crate) async fn confirm_state(
    inner: Arc<ControlInner>,
    service_id: String,
    epoch: u64,
    endpoint: PathBuf,
    requests: mpsc::Receiver<PendingRequest>,
    cancel: CancellationToken,
) {
    let backoff = inner.config.ready_backoff;
    let max_attempts = inner.config.ready_attempts;
    let mut requests = Some(requests);
    let mut attempts: u64 = 0;

    loop {
        // The slot may have been torn down while we slept; the process may
        // have died before binding its endpoint.
        {
            let mut state = inner.state.lock();
            let Some(slot) = state.slots.get_mut(&service_id) else { return };
            if slot.epoch != epoch || slot.state != ServiceState::Starting {
                return;
            }
            if !slot.process_alive() {
                warn!(service_id, "worker died before becoming ready");
                slot.state = ServiceState::Error;
                return;
            }
        }

        if max_attempts > 0 && attempts >= max_attempts {
            warn!(service_id, attempts, "readiness attempts exhausted");
            mark_error(&inner, &service_id, epoch);
            return;
        }
        attempts += 1;

        match probe_once(&endpoint, inner.config.ready_timeout, &service_id).await {
            ProbeStep::Ready(stream) => {
                let mut state = inner.state.lock();
                let Some(slot) = state.slots.get_mut(&service_id) else { return };
                if slot.epoch != epoch || slot.state != ServiceState::Starting {
                    return;
                }
                slot.state = ServiceState::Running;
                if let Some(requests) = requests.take() {
                    slot.dispatcher = Some(tokio::spawn(dispatcher::run(
                        stream,
                        requests,
                        cancel.clone(),
                        service_id.clone(),
                    )));
                }
                info!(service_id, "service running");
                return;
            }
            ProbeStep::StillStarting => {
                info!(service_id, "service responds but still starting");
                tokio::time::sleep(backoff).await;
            }
            ProbeStep::Retry => {
                tokio::time::sleep(backoff).await;
            }
            ProbeStep::BadState(reported) => {
                warn!(service_id, reported, "service reported unexpected state");
                mark_error(&inner, &service_id, epoch);
                return;
            }
        }
    }
}

/// One connect + status round-trip against the worker endpoint.
///
/// A fresh connection per attempt keeps request/reply pairing intact when
/// a previous attempt timed out mid-exchange.
async fn probe_once(endpoint: &Path, timeout: Duration, service_id: &str) -> ProbeStep {
    let mut stream = match UnixStream::connect(endpoint).await {
        Ok(stream) => stream,
        Err(_) => return ProbeStep::Retry,
    };

    let request = RpcRequest::new("status", Value::Null);
    let body = match serde_json::to_string(&request) {
        Ok(body) => body,
        Err(_) => return ProbeStep::Retry,
    };
    if write_message(&mut stream, body.as_bytes()).await.is_err() {
        return ProbeStep::Retry;
    }

    let reply = match tokio::time::timeout(timeout, read_message(&mut stream)).await {
        Err(_elapsed) => {
            warn!(service_id, "worker is not responding to status probe");
            return ProbeStep::Retry;
        }
        Ok(Err(_)) => return ProbeStep::Retry,
        Ok(Ok(reply)) => reply,
    };

    let response: RpcResponse = match serde_json::from_slice(&reply) {
        Ok(response) => response,
        Err(_) => return ProbeStep::BadState(String::from_utf8_lossy(&reply).into_owned()),
    };
    match response.result.as_ref().and_then(Value::as_str) {
        Some("running") => ProbeStep::Ready(stream),
        Some("starting") => ProbeStep::StillStarting,
        Some(other) => ProbeStep::BadState(other.to_string()),
        None => ProbeStep::BadState(String::from_utf8_lossy(&reply).into_owned()),
    }
}

/// Set the slot to ERROR if it still belongs to this start attempt.
fn mark_error(inner: &Arc<ControlInner>, service_id: &str, epoch: u64) {
    let mut state = inner.state.lock();
    if let Some(slot) = state.slots.get_mut(service_id) {
        if slot.epoch == epoch && slot.state == ServiceState::Starting {
            slot.state = ServiceState::Error;
        }
    }
}
