// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn model_type_key_wins_over_type() {
    let manifest = ServiceManifest::parse("model_type: HfChatbot\ntype: Echo\n").unwrap();
    assert_eq!(manifest.service_type(), Some("HfChatbot"));
}

#[test]
fn type_key_used_when_model_type_absent() {
    let manifest = ServiceManifest::parse("type: Echo\nmax_steps: 5\n").unwrap();
    assert_eq!(manifest.service_type(), Some("Echo"));
}

#[test]
fn missing_type_keys_yield_none() {
    let manifest = ServiceManifest::parse("template_string: hello\n").unwrap();
    assert_eq!(manifest.service_type(), None);
}

#[test]
fn implementation_keys_are_preserved() {
    let manifest =
        ServiceManifest::parse("type: SimilarityTransformers\ncache_size: 128\n").unwrap();
    let cache = manifest.extra.get("cache_size").and_then(serde_yaml::Value::as_u64);
    assert_eq!(cache, Some(128));
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServiceManifest::load(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Read(_, _)));
}
