// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::control::ControlConfig;
use serial_test::serial;
use std::path::Path;
use std::time::Duration;

fn test_config(root: &Path, transport: Transport, port: u16) -> Config {
    let models_path = root.join("models");
    let package = models_path.join("svc-a");
    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("config.yml"), "type: Echo\n").unwrap();

    let state_dir = root.join("state");
    let cache_root = root.join("cache");
    Config {
        internal_endpoint: cache_root.join("self"),
        lock_path: state_dir.join("broker.pid"),
        log_path: state_dir.join("broker.log"),
        port,
        control: ControlConfig {
            worker_bin: root.join("missing-worker"),
            ready_timeout: Duration::from_secs(1),
            ready_backoff: Duration::from_millis(25),
            ready_attempts: 0,
            drain_timeout: Duration::from_millis(500),
        },
        models_path,
        state_dir,
        cache_root,
        transport,
        start_services: false,
    }
}

#[test]
#[serial]
fn config_load_resolves_paths_from_env() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("NPC_ENGINE_STATE_DIR", dir.path().join("state"));
    std::env::set_var("NPC_ENGINE_CACHE_DIR", dir.path().join("cache"));
    std::env::remove_var("NPC_ENGINE_MODELS_PATH");

    let config = Config::load(
        Some(dir.path().join("models")),
        Some(6000),
        Transport::Framed,
        true,
    )
    .unwrap();
    assert_eq!(config.internal_endpoint, dir.path().join("cache/self"));
    assert_eq!(config.lock_path, dir.path().join("state/broker.pid"));
    assert_eq!(config.port, 6000);
    assert!(config.start_services);

    std::env::remove_var("NPC_ENGINE_STATE_DIR");
    std::env::remove_var("NPC_ENGINE_CACHE_DIR");
}

#[test]
#[serial]
fn config_load_takes_models_path_from_env() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("NPC_ENGINE_STATE_DIR", dir.path().join("state"));
    std::env::set_var("NPC_ENGINE_CACHE_DIR", dir.path().join("cache"));
    std::env::set_var("NPC_ENGINE_MODELS_PATH", dir.path().join("models"));

    let config = Config::load(None, None, Transport::Http, false).unwrap();
    assert_eq!(config.models_path, dir.path().join("models"));
    assert_eq!(config.port, crate::env::DEFAULT_PORT);

    std::env::remove_var("NPC_ENGINE_STATE_DIR");
    std::env::remove_var("NPC_ENGINE_CACHE_DIR");
    std::env::remove_var("NPC_ENGINE_MODELS_PATH");
}

#[test]
#[serial]
fn config_load_requires_a_models_path() {
    std::env::remove_var("NPC_ENGINE_MODELS_PATH");
    std::env::set_var("NPC_ENGINE_STATE_DIR", "/tmp/npc-test-state");
    std::env::set_var("NPC_ENGINE_CACHE_DIR", "/tmp/npc-test-cache");

    let err = Config::load(None, None, Transport::Framed, true).unwrap_err();
    assert!(matches!(err, LifecycleError::NoModelsPath));

    std::env::remove_var("NPC_ENGINE_STATE_DIR");
    std::env::remove_var("NPC_ENGINE_CACHE_DIR");
}

#[tokio::test]
async fn startup_locks_binds_and_shutdown_releases() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), Transport::Framed, 0);

    let result = startup(config).await.unwrap();
    assert!(result.broker.config.lock_path.exists());
    assert!(result.broker.config.internal_endpoint.exists());
    let pid = std::fs::read_to_string(&result.broker.config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    shutdown(&result.broker);
    assert!(!result.broker.config.lock_path.exists());
    assert!(!result.broker.config.internal_endpoint.exists());
}

#[tokio::test]
async fn second_broker_instance_is_locked_out() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), Transport::Framed, 0);

    let first = startup(config).await.unwrap();

    // second instance against the same state dir, its own port
    let mut config = test_config(dir.path(), Transport::Framed, 0);
    config.internal_endpoint = dir.path().join("cache/self-2");
    let err = startup(config).await.unwrap_err();
    assert!(matches!(err, LifecycleError::LockFailed(_)));

    shutdown(&first.broker);
}

#[tokio::test]
async fn occupied_port_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let config = test_config(dir.path(), Transport::Http, port);
    let err = startup(config).await.unwrap_err();
    assert!(matches!(err, LifecycleError::BindFailed(_, _)));
}
