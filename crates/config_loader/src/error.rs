//! Configuration error definitions

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or format could not be determined
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be parsed
    #[error("config parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Parsed content failed a validation rule
    #[error("config validation error: {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl ConfigError {
    /// Create a parse error without a source
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
