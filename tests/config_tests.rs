// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration and board detection

use microscope_cam::profile::DeviceGeneration;
use microscope_cam::{Config, DeviceProfileResolver};
use std::path::PathBuf;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("microscope-cam-it-{}-{}", std::process::id(), name))
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.default_resolution, 1);
    assert_eq!(config.tools.preview, "rpicam-hello");
    assert_eq!(config.tools.still, "rpicam-still");
    assert_eq!(config.tools.video, "rpicam-vid");
    assert_eq!(config.tools.merge, "mkvmerge");
    assert_eq!(
        config.timestamp_path(),
        config.save_dir.join("timestamps.txt"),
        "Timestamps should default to the save folder"
    );
}

#[test]
fn test_config_save_and_load() {
    let path = scratch_path("config.json");
    let config = Config {
        save_dir: PathBuf::from("/data/scope"),
        timestamp_file: Some(PathBuf::from("/data/pts.txt")),
        default_resolution: 3,
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path);
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, config);
    assert_eq!(loaded.timestamp_path(), PathBuf::from("/data/pts.txt"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let loaded = Config::load_from(&scratch_path("does-not-exist.json"));
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_model_file_drives_video_handling() {
    let path = scratch_path("model");
    std::fs::write(&path, b"Raspberry Pi 4 Model B Rev 1.5\0").unwrap();

    let resolver = DeviceProfileResolver::from_source(&path);
    let profile = resolver.resolve();
    let _ = std::fs::remove_file(&path);

    assert_eq!(profile.generation, DeviceGeneration::Gen4);
    assert_eq!(profile.video_extension, ".h264");
    assert!(profile.needs_timestamp_merge);
}

#[test]
fn test_unreadable_model_file_falls_back() {
    let resolver = DeviceProfileResolver::from_source(scratch_path("no-model"));
    let profile = resolver.resolve();

    assert_eq!(profile.model_name, "Unknown");
    assert_eq!(profile.generation, DeviceGeneration::Unknown);
    assert!(!profile.needs_timestamp_merge);
}
