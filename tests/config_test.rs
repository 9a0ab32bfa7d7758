//! Integration tests for configuration loading

use chef_core::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[motion]
acc_threshold = 22.5
gravity_threshold = 640.0
startup_guard_ms = 1500

[selection]
ticks = 12
tick_interval_ms = 100

[idle]
quiet_ms = 15000

[gestures]
logo_long_press_ms = 2500

[admin]
pin = "246810"
store_file = "/tmp/chef-store.json"

[catalog]
file = "menus/winter.json"

[metrics]
interval_secs = 30
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.acc_threshold(), 22.5);
    assert_eq!(config.gravity_threshold(), 640.0);
    assert_eq!(config.startup_guard_ms(), 1500);
    assert_eq!(config.selection_ticks(), 12);
    assert_eq!(config.tick_interval_ms(), 100);
    assert_eq!(config.idle_quiet_ms(), 15_000);
    assert_eq!(config.logo_long_press_ms(), 2500);
    assert_eq!(config.admin_pin(), "246810");
    assert_eq!(config.store_file(), "/tmp/chef-store.json");
    assert_eq!(config.catalog_file(), "menus/winter.json");
    assert_eq!(config.metrics_interval_secs(), 30);

    // Untouched fields keep their defaults
    assert_eq!(config.throttle_ms(), 100);
    assert_eq!(config.settle_ms(), 800);
    assert_eq!(config.card_long_press_ms(), 500);
    assert_eq!(config.add_confirm_ms(), 1500);
}

#[test]
fn test_short_pin_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[admin]\npin = \"1234\"\n").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("admin.pin"));
}

#[test]
fn test_zero_ticks_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[selection]\nticks = 0\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.config_file(), "default");
    assert_eq!(config.admin_pin(), "812356");
    assert_eq!(config.selection_ticks(), 20);
    assert_eq!(config.idle_quiet_ms(), 10_000);
}

#[test]
fn test_unparseable_file_falls_back_to_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[motion\nacc_threshold = ").unwrap();
    temp_file.flush().unwrap();

    let config = Config::load_from_path(temp_file.path().to_str().unwrap());
    assert_eq!(config.config_file(), "default");
    assert_eq!(config.acc_threshold(), 25.0);
}
