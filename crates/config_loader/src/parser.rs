//! Configuration parsing
//!
//! TOML is the primary format, JSON is accepted as well.

use crate::error::ConfigError;
use crate::ServiceConfig;

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration content
pub fn parse_toml(content: &str) -> Result<ServiceConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration content
pub fn parse_json(content: &str) -> Result<ServiceConfig, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::Parse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse content in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<ServiceConfig, ConfigError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
