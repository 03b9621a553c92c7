// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use shutter::Config;
use shutter::backends::camera::{CameraBackendType, CameraFacing};
use shutter::flash::FlashMode;
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.backend, CameraBackendType::V4l2);
    assert_eq!(config.default_facing, CameraFacing::Back);
    assert_eq!(config.default_flash_mode, FlashMode::Off);
    assert!(config.flash_control, "Flash control should be enabled by default");
    assert!(config.tap_to_focus, "Tap to focus should be enabled by default");
    assert!(config.refresh_after_burst);
    assert_eq!(config.burst_interval(), Duration::from_millis(500));
}

#[test]
fn test_config_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        backend: CameraBackendType::Virtual,
        default_facing: CameraFacing::Front,
        default_flash_mode: FlashMode::Auto,
        tap_to_focus: false,
        burst_interval_ms: 250,
        photo_dir: Some(dir.path().join("photos")),
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_fields_take_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "backend": "Virtual", "jpeg_quality": 70 }"#).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.backend, CameraBackendType::Virtual);
    assert_eq!(loaded.jpeg_quality, 70);
    assert_eq!(loaded.burst_interval_ms, Config::default().burst_interval_ms);
    assert!(loaded.flash_control);
}

#[test]
fn test_malformed_or_missing_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();

    let missing = Config::load_or_default(&dir.path().join("absent.json"));
    assert_eq!(missing, Config::default());

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    assert!(Config::load_from(&bad).is_err());
    assert_eq!(Config::load_or_default(&bad), Config::default());
}

#[test]
fn test_burst_interval_has_floor() {
    let config = Config {
        burst_interval_ms: 1,
        ..Config::default()
    };
    assert_eq!(config.burst_interval(), Duration::from_millis(50));
}
