// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Base request/reply client for the broker's internal endpoint.

use npc_wire::{read_envelope, write_envelope, ProtocolError, RpcRequest};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::trace;

/// Client-side failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to broker: {0}")]
    Connect(#[source] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid reply: {0}")]
    Json(#[from] serde_json::Error),

    /// An error object came back instead of a result.
    #[error("code: {code}. {message}")]
    Rpc { code: i64, message: String },

    #[error("reply carried neither result nor error: {0}")]
    Malformed(String),
}

/// One connection to the internal endpoint, addressing a fixed peer.
///
/// The identity frame on every request names the target service; the
/// broker resolves it exactly like a public address.
#[derive(Debug)]
pub struct ServiceClient {
    stream: UnixStream,
    identity: String,
}

impl ServiceClient {
    /// Connect to the broker's internal endpoint, addressing `identity`
    /// (a service id or api name).
    pub async fn connect(internal_endpoint: &Path, identity: &str) -> Result<Self, ClientError> {
        let stream =
            UnixStream::connect(internal_endpoint).await.map_err(ClientError::Connect)?;
        trace!(identity, "connected to broker");
        Ok(Self { stream, identity: identity.to_string() })
    }

    /// Peer this client addresses.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Send one JSON-RPC call and return its `result`.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let request = RpcRequest::new(method, params);
        let body = serde_json::to_string(&request)?;
        trace!(identity = %self.identity, method, "sending request");

        write_envelope(&mut self.stream, self.identity.as_bytes(), body.as_bytes()).await?;
        let (_identity, reply) = read_envelope(&mut self.stream).await?;
        trace!(identity = %self.identity, method, "received reply");

        interpret_reply(serde_json::from_slice(&reply)?)
    }
}

/// Map a raw reply to a result or an error.
///
/// Worker failures arrive as JSON-RPC `error` objects; transport-level
/// broker failures arrive as a bare `{code, message}` object.
fn interpret_reply(reply: Value) -> Result<Value, ClientError> {
    if let Some(result) = reply.get("result") {
        return Ok(result.clone());
    }
    let error = reply.get("error").unwrap_or(&reply);
    if let Some(code) = error.get("code").and_then(Value::as_i64) {
        return Err(ClientError::Rpc {
            code,
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }
    Err(ClientError::Malformed(reply.to_string()))
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
