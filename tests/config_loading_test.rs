//! Configuration layering: defaults, TOML file, `CAPTURE_` environment overrides.

use serial_test::serial;
use std::env;
use std::fs;
use transient_capture::config::RunConfig;
use transient_capture::CaptureError;

const SMALL_TOML: &str = r#"
log_level = "debug"

[acquisition]
sample_period_us = 20
sample_n = 10
pre_trigger_n = 6
baseline_n = 4
threshold = 5

[[channels]]
name = "left"
source = "A9"

[[channels]]
name = "right"
source = "A7"

[storage]
root = "/tmp/capture"
ledger_name = "labels.csv"
ledger_header = "x:sensor,y"

[[classes]]
folder = "110001"
cycles = 3
"#;

fn clear_env() {
    for (key, _) in env::vars() {
        if key.starts_with("CAPTURE_") {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, RunConfig::default());
    config.validate().unwrap();
}

#[test]
#[serial]
fn file_values_replace_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.toml");
    fs::write(&path, SMALL_TOML).unwrap();

    let config = RunConfig::load_from(&path).unwrap();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.acquisition.sample_period_us, 20);
    assert_eq!(config.acquisition.post_trigger_n(), 4);
    assert_eq!(config.channel_count(), 2);
    assert_eq!(config.classes.len(), 1);
    assert_eq!(config.total_cycles(), 3);
    assert_eq!(config.storage.ledger_name, "labels.csv");
    assert_eq!(config.storage.progress_every, 10_000);
    assert_eq!(config.simulation, RunConfig::default().simulation);
    config.validate().unwrap();
}

#[test]
#[serial]
fn environment_overrides_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.toml");
    fs::write(&path, SMALL_TOML).unwrap();

    env::set_var("CAPTURE_ACQUISITION__THRESHOLD", "300");
    env::set_var("CAPTURE_LOG_LEVEL", "warn");
    let config = RunConfig::load_from(&path);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.acquisition.threshold, 300);
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.acquisition.sample_n, 10);
}

#[test]
#[serial]
fn malformed_file_is_a_config_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.toml");
    fs::write(&path, "[acquisition]\nthreshold = \"high\"\n").unwrap();

    let err = RunConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, CaptureError::Config(_)));
}

#[test]
#[serial]
fn shipped_configuration_is_valid() {
    clear_env();
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/capture.toml");
    let config = RunConfig::load_from(path).unwrap();
    config.validate().unwrap();
    assert_eq!(config, RunConfig::default());
}
