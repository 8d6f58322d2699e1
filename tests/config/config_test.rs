//! Coverage for config parsing, overrides and path resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sentinel::config::{config_dir, SentinelConfig};
use sentinel::platform::{CaptureMode, LensFacing};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_match_device_values() {
    let config = SentinelConfig::default();
    assert_eq!(config.bridge.interface_name, "AndroidInterface");
    assert_eq!(config.bridge.page_url, "file:///android_asset/chat.html");
    assert_eq!(config.bridge.command_buffer, 32);
    assert_eq!(config.camera.lens, LensFacing::Back);
    assert_eq!(config.camera.capture_mode, CaptureMode::MinimizeLatency);
    assert_eq!(config.camera.capture_queue_depth, 4);
    assert!(config.simulation.grant_camera);
    assert!(config.logging.logs_dir.is_none());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let config = SentinelConfig::from_toml(
        r#"
[bridge]
command_buffer = 8

[simulation]
grant_telephony = false
frame_width = 320
"#,
    )
    .expect("partial config should parse");

    assert_eq!(config.bridge.command_buffer, 8);
    assert_eq!(config.bridge.log_level, "info");
    assert!(!config.simulation.grant_telephony);
    assert!(config.simulation.grant_camera);
    assert_eq!(config.simulation.frame_width, 320);
    assert_eq!(config.simulation.frame_height, 48);
}

#[test]
fn camera_section_parses_snake_case() {
    let config = SentinelConfig::from_toml(
        r#"
[camera]
lens = "back"
capture_mode = "minimize_latency"
capture_queue_depth = 1
"#,
    )
    .expect("camera config should parse");
    assert_eq!(config.camera.capture_queue_depth, 1);
}

#[test]
fn unknown_lens_is_rejected() {
    let result = SentinelConfig::from_toml("[camera]\nlens = \"front\"\n");
    assert!(result.is_err());
}

#[test]
fn env_overrides_file_values() {
    let mut config =
        SentinelConfig::from_toml("[bridge]\nlog_level = \"warn\"\n").expect("should parse");
    config.apply_overrides(env_from(&[
        ("SENTINEL_LOG_LEVEL", "debug"),
        ("SENTINEL_LOGS_DIR", "/tmp/sentinel-logs"),
        ("SENTINEL_COMMAND_BUFFER", "64"),
        ("SENTINEL_GRANT_CAMERA", "no"),
    ]));

    assert_eq!(config.bridge.log_level, "debug");
    assert_eq!(config.bridge.command_buffer, 64);
    assert!(!config.simulation.grant_camera);
    assert_eq!(
        config.logs_dir().expect("explicit dir"),
        PathBuf::from("/tmp/sentinel-logs")
    );
}

#[test]
fn invalid_env_values_are_ignored() {
    let mut config = SentinelConfig::default();
    config.apply_overrides(env_from(&[
        ("SENTINEL_COMMAND_BUFFER", "lots"),
        ("SENTINEL_GRANT_TELEPHONY", "perhaps"),
    ]));
    assert_eq!(config.bridge.command_buffer, 32);
    assert!(config.simulation.grant_telephony);
}

#[test]
fn bridge_options_follow_config() {
    let mut config = SentinelConfig::default();
    config.bridge.command_buffer = 5;
    config.camera.capture_queue_depth = 2;

    let options = config.bridge_options();
    assert_eq!(options.command_buffer, 5);
    assert_eq!(options.capture_queue_depth, 2);
    assert_eq!(options.capture.lens, LensFacing::Back);
}

#[test]
fn missing_file_gives_defaults() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config =
        SentinelConfig::load_from(&tmp.path().join("absent.toml")).expect("missing is fine");
    assert_eq!(config.bridge.command_buffer, 32);
}

#[test]
fn file_is_loaded_and_malformed_file_errors() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let good = tmp.path().join("sentinel.toml");
    std::fs::write(&good, "[bridge]\ninterface_name = \"Bridge\"\n").expect("write");
    let config = SentinelConfig::load_from(&good).expect("file should load");
    assert_eq!(config.bridge.interface_name, "Bridge");

    let bad = tmp.path().join("bad.toml");
    std::fs::write(&bad, "[bridge\n").expect("write");
    assert!(SentinelConfig::load_from(&bad).is_err());
}

#[test]
fn config_dir_resolves() {
    let dir = config_dir().expect("home directory should resolve");
    assert!(dir.ends_with(Path::new(".sentinel")));
}
