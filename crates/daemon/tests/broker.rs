// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end broker tests against the real `npc-worker` binary.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use npc_core::{ApiRegistry, ServiceState};
use npc_daemon::listener::{FramedServer, FrontEnd};
use npc_daemon::{ControlConfig, ControlService, MetadataManager};
use npc_wire::{read_envelope, read_message, write_envelope, write_message};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const WORKER_BIN: &str = env!("CARGO_BIN_EXE_npc-worker");

fn write_package(models: &Path, id: &str, config: &str) {
    let dir = models.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.yml"), config).unwrap();
}

struct Fixture {
    _dir: tempfile::TempDir,
    control: ControlService,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let models = dir.path().join("models");
    std::fs::create_dir_all(&models).unwrap();
    write_package(&models, "svc-a", "type: Echo\n");

    let metadata =
        MetadataManager::scan(&models, &dir.path().join("cache"), &ApiRegistry::builtin())
            .unwrap();
    let config = ControlConfig {
        worker_bin: PathBuf::from(WORKER_BIN),
        ready_timeout: Duration::from_secs(5),
        ready_backoff: Duration::from_millis(50),
        ready_attempts: 0,
        drain_timeout: Duration::from_secs(1),
    };
    Fixture { _dir: dir, control: ControlService::new(metadata, config) }
}

async fn wait_for_state(control: &ControlService, id: &str, expected: ServiceState) {
    for _ in 0..200 {
        if control.get_service_status(id).ok() == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "service {id} never reached {expected}, last: {:?}",
        control.get_service_status(id)
    );
}

fn process_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

async fn wait_for_exit(pid: u32) {
    for _ in 0..100 {
        if !process_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("process {pid} never exited");
}

#[tokio::test]
async fn echo_round_trip_through_a_real_worker() {
    let fx = fixture();
    fx.control.start_service("svc-a").unwrap();
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;

    let body = r#"{"jsonrpc":"2.0","method":"echo","params":["hi"],"id":1}"#;
    let reply = fx.control.handle_request("svc-a", body).await.unwrap();
    let value: Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["result"], json!("hi"));
    assert_eq!(value["id"], json!(1));

    fx.control.stop_service("svc-a").unwrap();
}

#[tokio::test]
async fn every_address_form_reaches_the_worker() {
    let fx = fixture();
    fx.control.start_service("svc-a").unwrap();
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;

    let body = r#"{"jsonrpc":"2.0","method":"echo","params":["hi"],"id":1}"#;
    for address in ["svc-a", "Echo", "EchoAPI", ""] {
        let reply = fx.control.handle_request(address, body).await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["result"], json!("hi"), "address {address:?}");
    }

    fx.control.stop_service("svc-a").unwrap();
}

#[tokio::test]
async fn stop_kills_the_worker_and_frees_the_endpoint_for_restart() {
    let fx = fixture();
    fx.control.start_service("svc-a").unwrap();
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;
    let pid = fx.control.process_id("svc-a").unwrap();

    fx.control.stop_service("svc-a").unwrap();
    assert_eq!(fx.control.get_service_status("svc-a").unwrap(), ServiceState::Stopped);
    wait_for_exit(pid).await;

    // the endpoint must be bindable again
    fx.control.start_service("svc-a").unwrap();
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;
    let body = r#"{"jsonrpc":"2.0","method":"echo","params":["again"],"id":2}"#;
    let reply = fx.control.handle_request("svc-a", body).await.unwrap();
    let value: Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["result"], json!("again"));

    fx.control.stop_service("svc-a").unwrap();
}

#[tokio::test]
async fn killed_worker_surfaces_process_not_alive() {
    let fx = fixture();
    fx.control.start_service("svc-a").unwrap();
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;

    let pid = fx.control.process_id("svc-a").unwrap();
    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGKILL,
    )
    .unwrap();
    wait_for_exit(pid).await;

    let body = r#"{"jsonrpc":"2.0","method":"echo","params":["hi"],"id":1}"#;
    let err = fx.control.handle_request("svc-a", body).await.unwrap_err();
    assert!(err.to_string().contains("Process is not alive"));
    assert_eq!(fx.control.get_service_status("svc-a").unwrap(), ServiceState::Error);
}

#[tokio::test]
async fn restart_service_cycles_the_process() {
    let fx = fixture();
    fx.control.start_service("svc-a").unwrap();
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;
    let first_pid = fx.control.process_id("svc-a").unwrap();

    fx.control.restart_service("svc-a").unwrap();
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;
    let second_pid = fx.control.process_id("svc-a").unwrap();
    assert_ne!(first_pid, second_pid);

    fx.control.stop_service("svc-a").unwrap();
}

#[tokio::test]
async fn framed_front_end_serves_clients_end_to_end() {
    let fx = fixture();
    let dir = tempfile::tempdir().unwrap();
    let public = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = public.local_addr().unwrap();
    let internal =
        tokio::net::UnixListener::bind(dir.path().join("internal.sock")).unwrap();

    let control = fx.control.clone();
    let server = FramedServer::new(public, internal, control, true);
    tokio::spawn(async move {
        let _ = Box::new(server).run().await;
    });
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    // pipeline several requests; per-worker ordering holds end to end
    for i in 0..3 {
        let body =
            format!(r#"{{"jsonrpc":"2.0","method":"echo","params":["m{i}"],"id":{i}}}"#);
        write_envelope(&mut stream, b"svc-a", body.as_bytes()).await.unwrap();
    }
    for i in 0..3 {
        let (identity, body) = read_envelope(&mut stream).await.unwrap();
        assert_eq!(identity, b"svc-a");
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["result"], json!(format!("m{i}")));
        assert_eq!(value["id"], json!(i));
    }

    fx.control.shutdown();
}

#[tokio::test]
async fn worker_binary_speaks_the_protocol_and_honors_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let package = dir.path().join("svc-a");
    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("config.yml"), "type: Echo\n").unwrap();
    let endpoint = dir.path().join("svc-a.sock");

    let mut child = tokio::process::Command::new(WORKER_BIN)
        .arg(&package)
        .arg(&endpoint)
        .arg("svc-a")
        .spawn()
        .unwrap();

    let mut stream = None;
    for _ in 0..100 {
        if let Ok(s) = tokio::net::UnixStream::connect(&endpoint).await {
            stream = Some(s);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let mut stream = stream.expect("worker never bound its endpoint");

    write_message(&mut stream, br#"{"jsonrpc":"2.0","method":"status","id":1}"#)
        .await
        .unwrap();
    let reply = read_message(&mut stream).await.unwrap();
    let value: Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(value["result"], json!("running"));

    write_message(
        &mut stream,
        br#"{"jsonrpc":"2.0","method":"echo","params":["direct"],"id":2}"#,
    )
    .await
    .unwrap();
    let reply = read_message(&mut stream).await.unwrap();
    let value: Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(value["result"], json!("direct"));

    let pid = child.id().unwrap();
    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGTERM,
    )
    .unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("worker did not exit on SIGTERM")
        .unwrap();
    assert!(status.success());
    assert!(!endpoint.exists(), "worker left its socket file behind");
}

#[tokio::test]
async fn http_front_end_serves_over_tcp() {
    let fx = fixture();
    let dir = tempfile::tempdir().unwrap();
    let public = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = public.local_addr().unwrap();
    let internal =
        tokio::net::UnixListener::bind(dir.path().join("internal.sock")).unwrap();

    let server =
        npc_daemon::listener::HttpServer::new(public, internal, fx.control.clone(), true);
    tokio::spawn(async move {
        let _ = Box::new(server).run().await;
    });
    wait_for_state(&fx.control, "svc-a", ServiceState::Running).await;

    let body = r#"{"jsonrpc":"2.0","method":"echo","params":["http"],"id":9}"#;
    let request = format!(
        "POST /svc-a HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    let (head, payload) = response.split_once("\r\n\r\n").unwrap();
    assert!(head.starts_with("HTTP/1.1 200"));
    let value: Value = serde_json::from_str(payload.trim()).unwrap();
    assert_eq!(value["result"], json!("http"));
    assert_eq!(value["id"], json!(9));

    fx.control.shutdown();
}
