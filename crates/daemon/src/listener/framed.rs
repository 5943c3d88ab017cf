// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framed-socket front-end: envelope protocol on a public TCP port plus
//! the internal Unix endpoint.

use super::{serve_envelope_connection, start_all, FrontEnd, ListenerError};
use crate::control::ControlService;
use async_trait::async_trait;
use tokio::net::{TcpListener, UnixListener};
use tracing::{debug, error, info};

/// Multiplexed framed-socket server.
pub struct FramedServer {
    public: TcpListener,
    internal: UnixListener,
    control: ControlService,
    start_services: bool,
}

impl FramedServer {
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

#[async_trait]
impl FrontEnd for FramedServer {
    async fn run(self: Box<Self>) -> Result<(), ListenerError> {
        if self.start_services {
            start_all(&self.control).await;
        }
        info!("starting message loop");
        loop {
            tokio::select! {
                accepted = self.public.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!(%addr, "client connected");
                        tokio::spawn(serve_envelope_connection(stream, self.control.clone()));
                    }
                    Err(e) => error!(error = %e, "public accept error"),
                },
                accepted = self.internal.accept() => match accepted {
                    Ok((stream, _)) => {
                        tokio::spawn(serve_envelope_connection(stream, self.control.clone()));
                    }
                    Err(e) => error!(error = %e, "internal accept error"),
                },
            }
        }
    }
}
