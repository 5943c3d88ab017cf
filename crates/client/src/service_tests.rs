// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use tokio::net::UnixListener;

#[test]
fn result_reply_yields_the_result() {
    let reply = json!({"jsonrpc": "2.0", "result": "hi", "id": 0});
    assert_eq!(interpret_reply(reply).unwrap(), json!("hi"));
}

#[test]
fn null_result_is_still_a_result() {
    let reply = json!({"jsonrpc": "2.0", "result": null, "id": 0});
    assert_eq!(interpret_reply(reply).unwrap(), Value::Null);
}

#[test]
fn error_object_raises_with_code_and_message() {
    let reply = json!({
        "jsonrpc": "2.0",
        "error": {"code": -32000, "message": "Service svc-a is not running"},
        "id": 0
    });
    let err = interpret_reply(reply).unwrap_err();
    assert_eq!(err.to_string(), "code: -32000. Service svc-a is not running");
}

#[test]
fn bare_error_body_raises_identically() {
    // transport-level broker failures are bare {code, message} objects
    let reply = json!({"code": -32000, "message": "Internal error: boom", "data": null});
    let err = interpret_reply(reply).unwrap_err();
    assert_eq!(err.to_string(), "code: -32000. Internal error: boom");
}

#[test]
fn reply_without_result_or_code_is_malformed() {
    let err = interpret_reply(json!({"jsonrpc": "2.0", "id": 0})).unwrap_err();
    assert!(matches!(err, ClientError::Malformed(_)));
}

/// Fake internal endpoint answering every request with a canned reply.
fn spawn_broker_stub(
    listener: UnixListener,
    reply_for: fn(&str, &str) -> String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { return };
            tokio::spawn(async move {
                while let Ok((identity, body)) = read_envelope(&mut stream).await {
                    let address = String::from_utf8_lossy(&identity).into_owned();
                    let reply = reply_for(&address, &String::from_utf8_lossy(&body));
                    if write_envelope(&mut stream, &identity, reply.as_bytes()).await.is_err() {
                        return;
                    }
                }
            });
        }
    })
}

#[tokio::test]
async fn call_round_trips_through_the_internal_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("self");
    let listener = UnixListener::bind(&socket).unwrap();
    let _stub = spawn_broker_stub(listener, |address, body| {
        assert_eq!(address, "svc-a");
        let request: Value = serde_json::from_str(body).unwrap();
        assert_eq!(request["jsonrpc"], "2.0");
        assert_eq!(request["id"], json!(0));
        json!({"jsonrpc": "2.0", "result": request["params"][0], "id": 0}).to_string()
    });

    let mut client = ServiceClient::connect(&socket, "svc-a").await.unwrap();
    let reply = client.call("echo", json!(["hello"])).await.unwrap();
    assert_eq!(reply, json!("hello"));
    assert_eq!(client.identity(), "svc-a");
}

#[tokio::test]
async fn rpc_errors_surface_through_call() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("self");
    let listener = UnixListener::bind(&socket).unwrap();
    let _stub = spawn_broker_stub(listener, |_address, _body| {
        json!({"code": -32000, "message": "Internal error: Service ghost not found"})
            .to_string()
    });

    let mut client = ServiceClient::connect(&socket, "ghost").await.unwrap();
    let err = client.call("echo", json!(["x"])).await.unwrap_err();
    assert!(matches!(err, ClientError::Rpc { code: -32000, .. }));
}

#[tokio::test]
async fn connect_to_a_missing_broker_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServiceClient::connect(&dir.path().join("nothing"), "svc-a").await.unwrap_err();
    assert!(matches!(err, ClientError::Connect(_)));
}
