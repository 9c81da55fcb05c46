//! # Config Loader
//!
//! Configuration loading and parsing.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a [`ServiceConfig`]
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Channel: {}", config.channel.id);
//! ```

mod error;
mod parser;
mod validator;

pub use error::ConfigError;
pub use parser::ConfigFormat;

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
///
/// Only `[channel]` is mandatory; every other section has defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub channel: ChannelSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub recovery: RecoverySection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay: Option<ReplaySection>,
}

/// `[channel]` - the one channel this instance listens to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSection {
    /// Raw channel id; equivalent upstream encodings are accepted
    pub id: String,
}

/// `[polling]` - long-poll tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSection {
    /// Long-poll timeout in seconds (1..=120)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Messages fetched per poll (1..=100)
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_items: default_max_items(),
        }
    }
}

/// `[recovery]` - duplicate-session conflict recovery budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySection {
    /// Consecutive recovery attempts before the session gives up (>= 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Minimum spacing between recovery attempts, in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Linear backoff unit in seconds (>= 1)
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

impl Default for RecoverySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            cooldown_secs: default_cooldown_secs(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

/// Record store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Log records, persist nothing
    Log,
    /// Append-only JSONL files under `path`
    Jsonl,
}

/// `[store]` - where classified records go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_kind")]
    pub kind: StoreKind,
    /// Base directory for file-backed stores
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            path: default_store_path(),
        }
    }
}

/// `[metrics]` - optional Prometheus exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSection {
    pub port: u16,
}

/// `[replay]` - optional captured-message log to feed the session from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySection {
    pub path: String,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_items() -> usize {
    100
}
fn default_max_attempts() -> u32 {
    3
}
fn default_cooldown_secs() -> u64 {
    30
}
fn default_base_delay_secs() -> u64 {
    5
}
fn default_store_kind() -> StoreKind {
    StoreKind::Log
}
fn default_store_path() -> String {
    "./data".to_string()
}

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ServiceConfig, ConfigError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<ServiceConfig, ConfigError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Serialize a ServiceConfig to TOML string
    pub fn to_toml(config: &ServiceConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config)
            .map_err(|e| ConfigError::parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a ServiceConfig to JSON string
    pub fn to_json(config: &ServiceConfig) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::parse(format!("JSON serialize error: {e}")))
    }

    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::parse("cannot determine file format from extension"))?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::parse(format!("unsupported config format: .{ext}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[channel]
id = "-1003217044000"

[store]
kind = "jsonl"
path = "./data"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.channel.id, "-1003217044000");
        assert_eq!(config.store.kind, StoreKind::Jsonl);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.channel.id, config2.channel.id);
        assert_eq!(config.polling.max_items, config2.polling.max_items);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.channel.id, config2.channel.id);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[channel]
id = "-3217044000"

[polling]
timeout_secs = 600
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout_secs"));
    }
}
