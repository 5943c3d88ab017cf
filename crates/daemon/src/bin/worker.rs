// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! npc-worker: entry point for worker subprocesses.
//!
//! The broker launches this binary with the package directory, the
//! private endpoint to bind, and the service id.

use clap::Parser;
use npc_worker::ServiceRegistry;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "npc-worker", about = "Service worker subprocess", version)]
struct Cli {
    /// Package directory holding config.yml and model artifacts.
    package_dir: PathBuf,
    /// Unix socket path to bind.
    endpoint: PathBuf,
    /// Service id assigned by the broker.
    service_id: String,
}

// Workers serve their endpoint strictly sequentially; one thread is the
// point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = ServiceRegistry::builtin();
    match npc_worker::run(&registry, &cli.package_dir, &cli.endpoint, &cli.service_id).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(service_id = %cli.service_id, error = %e, "worker failed");
            ExitCode::FAILURE
        }
    }
}
