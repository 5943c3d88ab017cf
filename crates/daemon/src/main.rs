// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! npcd: the inference service broker daemon.

use clap::Parser;
use npc_daemon::{lifecycle, Config, LifecycleError, Transport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "npcd", about = "Inference service broker", version)]
struct Cli {
    /// Directory containing model packages (defaults to
    /// NPC_ENGINE_MODELS_PATH).
    #[arg(long)]
    models_path: Option<PathBuf>,

    /// Public port (defaults to NPC_ENGINE_PORT or 5555).
    #[arg(long)]
    port: Option<u16>,

    /// Serve HTTP instead of the framed socket protocol.
    #[arg(long)]
    http: bool,

    /// Do not start discovered services on boot.
    #[arg(long)]
    no_start_services: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// The broker multiplexes every endpoint, probe, and dispatcher on one
// cooperative thread; per-worker request ordering relies on it.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let transport = if cli.http { Transport::Http } else { Transport::Framed };
    let config = match Config::load(
        cli.models_path.clone(),
        cli.port,
        transport,
        !cli.no_start_services,
    ) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("npcd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&config, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("npcd: failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "broker failed");
            eprintln!("npcd: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), LifecycleError> {
    let result = lifecycle::startup(config).await?;
    info!("broker ready");

    tokio::select! {
        served = result.front_end.run() => {
            if let Err(e) = served {
                error!(error = %e, "front-end stopped");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received");
        }
    }

    lifecycle::shutdown(&result.broker);
    Ok(())
}

/// Log to `<state-dir>/broker.log` and stderr. The returned guard flushes
/// the file writer on drop.
fn init_logging(
    config: &Config,
    verbose: u8,
) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(guard)
}
