// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use camera_capture::pipelines::photo::EncodingQuality;
use camera_capture::{CameraMode, CaptureError, Config, Facing, FileNaming};

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.default_mode, CameraMode::Photo);
    assert_eq!(config.default_facing, Facing::Front);
    assert_eq!((config.still_width, config.still_height), (640, 480));
    assert_eq!(config.file_naming, FileNaming::Fixed);
    assert!(config.record_audio, "Video should request audio by default");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_round_trips_through_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        default_mode: CameraMode::Video,
        default_facing: Facing::Back,
        jpeg_quality: EncodingQuality::Maximum,
        file_naming: FileNaming::Timestamped,
        record_audio: false,
        save_directory: Some(dir.path().join("out")),
        ..Config::default()
    };
    config.save_to(&path).expect("save");

    assert_eq!(Config::load_from(&path).expect("load"), config);
}

#[test]
fn test_config_missing_fields_use_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "default_facing": "Back" }"#).expect("write");

    let config = Config::load_from(&path).expect("load");
    assert_eq!(config.default_facing, Facing::Back);
    assert_eq!(config.still_width, 640);
    assert_eq!(config.jpeg_quality, EncodingQuality::High);
}

#[test]
fn test_config_rejects_empty_raster() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "still_width": 0 }"#).expect("write");

    assert!(matches!(
        Config::load_from(&path),
        Err(CaptureError::Config(_))
    ));
}

#[test]
fn test_config_malformed_json_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").expect("write");

    assert!(matches!(
        Config::load_from(&path),
        Err(CaptureError::Config(_))
    ));
}

#[test]
fn test_save_directory_override() {
    let config = Config {
        save_directory: Some("/tmp/captures".into()),
        ..Config::default()
    };
    assert_eq!(config.save_directory(), std::path::PathBuf::from("/tmp/captures"));

    // Default folder is named Camera
    let default_dir = Config::default().save_directory();
    assert!(default_dir.ends_with("Camera"));
}
