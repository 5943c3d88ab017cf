// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker dispatcher task: drains the request queue onto the worker's
//! socket and delivers each reply to its waiting caller.

use super::slot::PendingRequest;
use npc_wire::{read_message, write_message, ProtocolError};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Forward queue traffic until cancelled, the queue closes, or the socket
/// fails. Cancellation may land mid-exchange; the dropped reply channel
/// resolves the waiting caller with an empty reply. Socket failures end
/// the task without touching slot state; the liveness check in
/// `handle_request` surfaces the inconsistency to the next caller.
pub(crate) async fn run(
    mut stream: UnixStream,
    mut requests: mpsc::Receiver<PendingRequest>,
    cancel: CancellationToken,
    service_id: String,
) {
    loop {
        let pending = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(service_id, "dispatcher cancelled");
                return;
            }
            request = requests.recv() => match request {
                Some(pending) => pending,
                None => {
                    debug!(service_id, "request queue closed");
                    return;
                }
            },
        };

        let reply = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(service_id, "dispatcher cancelled mid-exchange");
                return;
            }
            reply = exchange(&mut stream, &pending.body) => reply,
        };
        match reply {
            Ok(reply) => {
                let _ = pending.reply.send(String::from_utf8_lossy(&reply).into_owned());
            }
            Err(e) => {
                warn!(service_id, error = %e, "worker exchange failed");
                return;
            }
        }
    }
}

async fn exchange(stream: &mut UnixStream, body: &str) -> Result<Vec<u8>, ProtocolError> {
    write_message(stream, body.as_bytes()).await?;
    read_message(stream).await
}
