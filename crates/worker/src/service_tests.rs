// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;

fn package(dir: &Path, config: &str) -> std::path::PathBuf {
    let path = dir.join("pkg");
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("config.yml"), config).unwrap();
    path
}

#[test]
fn create_builds_echo_from_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = package(dir.path(), "type: Echo\n");

    let registry = ServiceRegistry::builtin();
    let (mut service, spec) = registry.create(&path).unwrap();
    assert_eq!(spec.api_name, "EchoAPI");
    assert_eq!(service.status(), ServiceState::Running);
}

#[test]
fn create_honors_model_type_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let path = package(dir.path(), "model_type: Echo\ntype: HfChatbot\n");

    let registry = ServiceRegistry::builtin();
    let (_service, spec) = registry.create(&path).unwrap();
    assert_eq!(spec.service_type, "Echo");
}

#[test]
fn create_rejects_unknown_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = package(dir.path(), "type: NotAModel\n");

    let registry = ServiceRegistry::builtin();
    let err = registry.create(&path).unwrap_err();
    assert!(matches!(err, WorkerError::UnknownType(t) if t == "NotAModel"));
}

#[test]
fn create_rejects_known_api_without_factory() {
    // HfChatbot is in the API registry but this binary ships no factory
    // for it; instantiation must fail, not fall back to a stub.
    let dir = tempfile::tempdir().unwrap();
    let path = package(dir.path(), "type: HfChatbot\ntemplate_string: hi\n");

    let registry = ServiceRegistry::builtin();
    let err = registry.create(&path).unwrap_err();
    assert!(matches!(err, WorkerError::UnknownType(_)));
}

#[test]
fn create_rejects_missing_type_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = package(dir.path(), "template_string: hi\n");

    let registry = ServiceRegistry::builtin();
    let err = registry.create(&path).unwrap_err();
    assert!(matches!(err, WorkerError::MissingType(_)));
}
