// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration loading

use depth_bridge::BridgeConfig;
use depth_bridge::config::{GrabFailurePolicy, RetrieveFailurePolicy};
use std::io::Write;

#[test]
fn test_config_default() {
    let config = BridgeConfig::default();

    assert_eq!(config.endpoint, "tcp://127.0.0.1:5555");
    assert_eq!(config.cycle_delay_ms, 200);
    assert_eq!(
        config.on_grab_failure,
        GrabFailurePolicy::Drop,
        "Grab failures should drop the reply by default"
    );
    assert_eq!(
        config.on_retrieve_failure,
        RetrieveFailurePolicy::SendStale,
        "Retrieve failures should send the previous buffer by default"
    );
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "endpoint": "tcp://127.0.0.1:6000", "output_resolution": {{ "width": 320, "height": 180 }} }}"#
    )
    .unwrap();

    let config = BridgeConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.endpoint, "tcp://127.0.0.1:6000");
    assert_eq!(config.output_resolution.width, 320);
    assert_eq!(config.output_resolution.height, 180);
    assert_eq!(config.cycle_delay_ms, 200);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    assert!(BridgeConfig::load(Some(&missing)).is_err());
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = BridgeConfig::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_config_serializes_back() {
    let config = BridgeConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(BridgeConfig::from_json(&json).unwrap(), config);
}
