//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! Every section and field is optional; anything missing takes the default.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct MotionConfig {
    /// Linear-acceleration magnitude that counts as a shake (roughly 2.5 g)
    #[serde(default = "default_acc_threshold")]
    pub acc_threshold: f64,
    /// Empirically calibrated trigger level for the gravity-inclusive fallback
    #[serde(default = "default_gravity_threshold")]
    pub gravity_threshold: f64,
    /// Minimum spacing between fallback evaluations
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Samples inside this window after construction are ignored
    #[serde(default = "default_startup_guard_ms")]
    pub startup_guard_ms: u64,
}

fn default_acc_threshold() -> f64 {
    25.0
}

fn default_gravity_threshold() -> f64 {
    800.0
}

fn default_throttle_ms() -> u64 {
    100
}

fn default_startup_guard_ms() -> u64 {
    2000
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            acc_threshold: default_acc_threshold(),
            gravity_threshold: default_gravity_threshold(),
            throttle_ms: default_throttle_ms(),
            startup_guard_ms: default_startup_guard_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_ticks() -> u32 {
    20
}

fn default_tick_interval_ms() -> u64 {
    80
}

fn default_settle_ms() -> u64 {
    800
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdleConfig {
    #[serde(default = "default_idle_quiet_ms")]
    pub quiet_ms: u64,
}

fn default_idle_quiet_ms() -> u64 {
    10_000
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { quiet_ms: default_idle_quiet_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GesturesConfig {
    /// Hold on the title before the PIN pad appears
    #[serde(default = "default_logo_long_press_ms")]
    pub logo_long_press_ms: u64,
    /// Hold on a card before its detail view opens
    #[serde(default = "default_card_long_press_ms")]
    pub card_long_press_ms: u64,
}

fn default_logo_long_press_ms() -> u64 {
    3000
}

fn default_card_long_press_ms() -> u64 {
    500
}

impl Default for GesturesConfig {
    fn default() -> Self {
        Self {
            logo_long_press_ms: default_logo_long_press_ms(),
            card_long_press_ms: default_card_long_press_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailConfig {
    /// After "add to order", repeats are ignored this long, then the view closes
    #[serde(default = "default_add_confirm_ms")]
    pub add_confirm_ms: u64,
}

fn default_add_confirm_ms() -> u64 {
    1500
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self { add_confirm_ms: default_add_confirm_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_pin")]
    pub pin: String,
    /// JSON file backing the key-value store for custom items
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

fn default_pin() -> String {
    "812356".to_string()
}

fn default_store_file() -> String {
    "data/store.json".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { pin: default_pin(), store_file: default_store_file() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_file")]
    pub file: String,
}

fn default_catalog_file() -> String {
    "config/menu.json".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { file: default_catalog_file() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    10
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub gestures: GesturesConfig,
    #[serde(default)]
    pub detail: DetailConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    acc_threshold: f64,
    gravity_threshold: f64,
    throttle_ms: u64,
    startup_guard_ms: u64,
    selection_ticks: u32,
    tick_interval_ms: u64,
    settle_ms: u64,
    idle_quiet_ms: u64,
    logo_long_press_ms: u64,
    card_long_press_ms: u64,
    add_confirm_ms: u64,
    admin_pin: String,
    store_file: String,
    catalog_file: String,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            acc_threshold: toml_config.motion.acc_threshold,
            gravity_threshold: toml_config.motion.gravity_threshold,
            throttle_ms: toml_config.motion.throttle_ms,
            startup_guard_ms: toml_config.motion.startup_guard_ms,
            selection_ticks: toml_config.selection.ticks,
            tick_interval_ms: toml_config.selection.tick_interval_ms,
            settle_ms: toml_config.selection.settle_ms,
            idle_quiet_ms: toml_config.idle.quiet_ms,
            logo_long_press_ms: toml_config.gestures.logo_long_press_ms,
            card_long_press_ms: toml_config.gestures.card_long_press_ms,
            add_confirm_ms: toml_config.detail.add_confirm_ms,
            admin_pin: toml_config.admin.pin,
            store_file: toml_config.admin.store_file,
            catalog_file: toml_config.catalog.file,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file,
        }
    }

    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let pin = &toml_config.admin.pin;
        if pin.len() != 6 || !pin.bytes().all(|b| b.is_ascii_digit()) {
            bail!("admin.pin in {} must be exactly 6 digits", path.display());
        }
        if toml_config.selection.ticks == 0 {
            bail!("selection.ticks in {} must be at least 1", path.display());
        }

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn acc_threshold(&self) -> f64 {
        self.acc_threshold
    }

    pub fn gravity_threshold(&self) -> f64 {
        self.gravity_threshold
    }

    pub fn throttle_ms(&self) -> u64 {
        self.throttle_ms
    }

    pub fn startup_guard_ms(&self) -> u64 {
        self.startup_guard_ms
    }

    pub fn selection_ticks(&self) -> u32 {
        self.selection_ticks
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    pub fn settle_ms(&self) -> u64 {
        self.settle_ms
    }

    pub fn idle_quiet_ms(&self) -> u64 {
        self.idle_quiet_ms
    }

    pub fn logo_long_press_ms(&self) -> u64 {
        self.logo_long_press_ms
    }

    pub fn card_long_press_ms(&self) -> u64 {
        self.card_long_press_ms
    }

    pub fn add_confirm_ms(&self) -> u64 {
        self.add_confirm_ms
    }

    pub fn admin_pin(&self) -> &str {
        &self.admin_pin
    }

    pub fn store_file(&self) -> &str {
        &self.store_file
    }

    pub fn catalog_file(&self) -> &str {
        &self.catalog_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to shorten the idle window
    #[cfg(test)]
    pub fn with_idle_quiet_ms(mut self, ms: u64) -> Self {
        self.idle_quiet_ms = ms;
        self
    }

    /// Builder method for tests to drop the startup guard
    #[cfg(test)]
    pub fn with_startup_guard_ms(mut self, ms: u64) -> Self {
        self.startup_guard_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.acc_threshold(), 25.0);
        assert_eq!(config.gravity_threshold(), 800.0);
        assert_eq!(config.throttle_ms(), 100);
        assert_eq!(config.startup_guard_ms(), 2000);
        assert_eq!(config.selection_ticks(), 20);
        assert_eq!(config.tick_interval_ms(), 80);
        assert_eq!(config.settle_ms(), 800);
        assert_eq!(config.idle_quiet_ms(), 10_000);
        assert_eq!(config.admin_pin(), "812356");
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_config: TomlConfig = toml::from_str("[motion]\nacc_threshold = 30.0\n").unwrap();
        let config = Config::from_toml(toml_config, "inline".to_string());
        assert_eq!(config.acc_threshold(), 30.0);
        assert_eq!(config.gravity_threshold(), 800.0);
        assert_eq!(config.add_confirm_ms(), 1500);
    }

    #[test]
    fn test_resolve_config_path_default() {
        let args: Vec<String> = vec!["chef-core".to_string()];
        if env::var("CONFIG_FILE").is_err() {
            assert_eq!(Config::resolve_config_path(&args), "config/dev.toml");
        }
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        let args: Vec<String> =
            vec!["chef-core".to_string(), "--config".to_string(), "config/kiosk.toml".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/kiosk.toml");
    }

    #[test]
    fn test_resolve_config_path_from_arg_equals() {
        let args: Vec<String> =
            vec!["chef-core".to_string(), "--config=config/stall.toml".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/stall.toml");
    }
}
