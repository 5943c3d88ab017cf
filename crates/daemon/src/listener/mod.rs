// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Front-ends: accept client and inter-worker requests and fan them into
//! the control service.
//!
//! Two flavors exist, selected at startup: the framed-socket server and
//! the HTTP server. Both serve the internal endpoint workers use to call
//! each other with the same envelope protocol.

mod framed;
mod http;

use crate::control::ControlService;
use async_trait::async_trait;
use npc_wire::{
    decode_identity, error_codes, read_envelope, write_envelope, ProtocolError,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

pub use framed::FramedServer;
pub use http::{router, HttpServer};

/// Errors that end a front-end's serve loop.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A running front-end. Implementations serve until the process is
/// interrupted.
#[async_trait]
pub trait FrontEnd: Send {
    async fn run(self: Box<Self>) -> Result<(), ListenerError>;
}

/// Route one request through the control service, folding any failure
/// into the wire error object clients expect.
pub(crate) async fn dispatch(control: &ControlService, address: &str, body: &str) -> String {
    match control.handle_request(address, body).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(address, error = %e, "request failed");
            internal_error_body(&e.to_string())
        }
    }
}

/// Bare `{code, message, data}` object used for transport-level failures.
fn internal_error_body(message: &str) -> String {
    let body = serde_json::json!({
        "code": error_codes::INTERNAL_ERROR,
        "message": format!("Internal error: {message}"),
        "data": serde_json::Value::Null,
    });
    body.to_string()
}

/// Ask the control service to start every discovered package.
pub(crate) async fn start_all(control: &ControlService) {
    info!("starting services");
    for id in control.service_ids() {
        if let Err(e) = control.start_service(&id) {
            error!(service_id = %id, error = %e, "failed to start service");
        }
    }
}

/// Serve one routed connection: read envelopes, handle each in its own
/// task, write replies back through a shared writer.
pub(crate) async fn serve_envelope_connection<S>(stream: S, control: ControlService)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let writer = Arc::new(tokio::sync::Mutex::new(writer));
    loop {
        match read_envelope(&mut reader).await {
            Ok((identity, body)) => {
                let control = control.clone();
                let writer = Arc::clone(&writer);
                tokio::spawn(async move {
                    let address = decode_identity(&identity);
                    let body = String::from_utf8_lossy(&body).into_owned();
                    let reply = dispatch(&control, &address, &body).await;
                    let mut writer = writer.lock().await;
                    if let Err(e) =
                        write_envelope(&mut *writer, &identity, reply.as_bytes()).await
                    {
                        debug!(address, error = %e, "failed to write reply");
                    }
                });
            }
            Err(ProtocolError::ConnectionClosed) => {
                debug!("client disconnected");
                return;
            }
            Err(e) => {
                warn!(error = %e, "envelope read failed");
                return;
            }
        }
    }
}

/// Accept loop for the internal endpoint workers call each other through.
pub(crate) async fn run_internal(listener: UnixListener, control: ControlService) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(serve_envelope_connection(stream, control.clone()));
            }
            Err(e) => error!(error = %e, "internal accept error"),
        }
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
