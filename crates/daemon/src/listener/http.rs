// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP front-end: the address is the URL path segment, the body is the
//! raw JSON-RPC string. Functionally identical to the framed server at
//! the JSON-RPC layer.

use super::{dispatch, run_internal, start_all, FrontEnd, ListenerError};
use crate::control::ControlService;
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, UnixListener};
use tracing::info;

/// HTTP server front-end.
pub struct HttpServer {
    public: TcpListener,
    internal: UnixListener,
    control: ControlService,
    start_services: bool,
}

impl HttpServer {
    pub fn new(
        public: TcpListener,
        internal: UnixListener,
        control: ControlService,
        start_services: bool,
    ) -> Self {
        Self { public, internal, control, start_services }
    }

    /// Address the public listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.public.local_addr()
    }
}

/// Routes: `/` resolves the target by method, `/{name}` by address.
/// GET and POST are equivalent; the body is passed through untouched.
pub fn router(control: ControlService) -> Router {
    Router::new()
        .route("/", get(handle_default).post(handle_default))
        .route("/:name", get(handle_named).post(handle_named))
        .with_state(control)
}

async fn handle_default(State(control): State<ControlService>, body: String) -> impl IntoResponse {
    respond(dispatch(&control, "", &body).await)
}

async fn handle_named(
    State(control): State<ControlService>,
    Path(name): Path<String>,
    body: String,
) -> impl IntoResponse {
    respond(dispatch(&control, &name, &body).await)
}

fn respond(reply: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], reply)
}

#[async_trait]
impl FrontEnd for HttpServer {
    async fn run(self: Box<Self>) -> Result<(), ListenerError> {
        if self.start_services {
            start_all(&self.control).await;
        }
        tokio::spawn(run_internal(self.internal, self.control.clone()));
        info!("starting http loop");
        axum::serve(self.public, router(self.control)).await?;
        Ok(())
    }
}
