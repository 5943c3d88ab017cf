// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker runtime slot.

use npc_core::ServiceState;
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One queued request: the raw JSON-RPC body and the channel its reply
/// must be delivered on. Dropping the sender delivers an empty reply to
/// the waiting caller.
pub(crate) struct PendingRequest {
    pub body: String,
    pub reply: oneshot::Sender<String>,
}

/// Broker-side record of one worker's runtime state.
pub(crate) struct Slot {
    pub state: ServiceState,
    pub process: Option<Child>,
    /// Producer side of the request queue; `None` unless a start is in
    /// flight or completed.
    pub sender: Option<mpsc::Sender<PendingRequest>>,
    pub dispatcher: Option<JoinHandle<()>>,
    /// Cancels the dispatcher task on stop.
    pub cancel: Option<CancellationToken>,
    /// Bumped on every start and stop; background tasks holding a stale
    /// epoch must not touch the slot.
    pub epoch: u64,
}

impl Slot {
    pub fn new() -> Self {
        Self {
            state: ServiceState::Stopped,
            process: None,
            sender: None,
            dispatcher: None,
            cancel: None,
            epoch: 0,
        }
    }

    /// Whether the worker's OS process is currently alive. Reaps the
    /// process handle as a side effect when it has exited.
    pub fn process_alive(&mut self) -> bool {
        match self.process.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Process id of the live worker, if any.
    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().and_then(|child| child.id())
    }
}
