// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Default public TCP port.
pub const DEFAULT_PORT: u16 = 5555;

/// Models root: `NPC_ENGINE_MODELS_PATH` when set.
pub fn models_path() -> Option<PathBuf> {
    std::env::var("NPC_ENGINE_MODELS_PATH").ok().map(PathBuf::from)
}

/// Endpoint root for worker sockets:
/// `NPC_ENGINE_CACHE_DIR` > `<user-cache>/npc-engine`.
pub fn cache_root() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("NPC_ENGINE_CACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::cache_dir().map(|d| d.join("npc-engine")).ok_or(LifecycleError::NoCacheDir)
}

/// Resolve state directory:
/// `NPC_ENGINE_STATE_DIR` > `XDG_STATE_HOME/npc-engine` > `~/.local/state/npc-engine`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("NPC_ENGINE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("npc-engine"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/npc-engine"))
}

/// Public port override (`NPC_ENGINE_PORT`).
pub fn public_port() -> u16 {
    std::env::var("NPC_ENGINE_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Receive timeout for readiness probes (`NPC_ENGINE_IPC_TIMEOUT_MS`,
/// default 10s).
pub fn ready_timeout() -> Duration {
    std::env::var("NPC_ENGINE_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Maximum readiness probe attempts (`NPC_ENGINE_READY_ATTEMPTS`).
/// 0 means retry forever with 1s backoff.
pub fn ready_attempts() -> u64 {
    std::env::var("NPC_ENGINE_READY_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Grace period between SIGTERM and SIGKILL when stopping a worker
/// (`NPC_ENGINE_DRAIN_TIMEOUT_MS`, default 5s).
pub fn drain_timeout() -> Duration {
    std::env::var("NPC_ENGINE_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Worker executable: `NPC_ENGINE_WORKER_BIN` > `npc-worker` next to the
/// broker binary > `npc-worker` on PATH.
pub fn worker_bin() -> PathBuf {
    if let Ok(bin) = std::env::var("NPC_ENGINE_WORKER_BIN") {
        return PathBuf::from(bin);
    }
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let sibling = dir.join("npc-worker");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("npc-worker")
}
