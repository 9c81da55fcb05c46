//! Configuration validation
//!
//! Rules:
//! - channel.id non-empty
//! - polling.timeout_secs in 1..=120
//! - polling.max_items in 1..=100
//! - recovery.max_attempts >= 1
//! - recovery.base_delay_secs >= 1
//! - store.path non-empty when a file-backed store is selected
//! - replay.path non-empty when the section is present

use crate::error::ConfigError;
use crate::{ServiceConfig, StoreKind};

/// Validate a ServiceConfig
///
/// Returns the first rule violation, or Ok(()).
pub fn validate(config: &ServiceConfig) -> Result<(), ConfigError> {
    validate_channel(config)?;
    validate_polling(config)?;
    validate_recovery(config)?;
    validate_store(config)?;
    validate_replay(config)?;
    Ok(())
}

fn validate_channel(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.channel.id.trim().is_empty() {
        return Err(ConfigError::validation(
            "channel.id",
            "channel id cannot be empty",
        ));
    }
    Ok(())
}

fn validate_polling(config: &ServiceConfig) -> Result<(), ConfigError> {
    let polling = &config.polling;
    if !(1..=120).contains(&polling.timeout_secs) {
        return Err(ConfigError::validation(
            "polling.timeout_secs",
            format!("must be in 1..=120, got {}", polling.timeout_secs),
        ));
    }
    if !(1..=100).contains(&polling.max_items) {
        return Err(ConfigError::validation(
            "polling.max_items",
            format!("must be in 1..=100, got {}", polling.max_items),
        ));
    }
    Ok(())
}

fn validate_recovery(config: &ServiceConfig) -> Result<(), ConfigError> {
    let recovery = &config.recovery;
    if recovery.max_attempts == 0 {
        return Err(ConfigError::validation(
            "recovery.max_attempts",
            "must be >= 1",
        ));
    }
    if recovery.base_delay_secs == 0 {
        return Err(ConfigError::validation(
            "recovery.base_delay_secs",
            "must be >= 1",
        ));
    }
    Ok(())
}

fn validate_store(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.store.kind == StoreKind::Jsonl && config.store.path.trim().is_empty() {
        return Err(ConfigError::validation(
            "store.path",
            "path cannot be empty for a jsonl store",
        ));
    }
    Ok(())
}

fn validate_replay(config: &ServiceConfig) -> Result<(), ConfigError> {
    if let Some(replay) = &config.replay {
        if replay.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "replay.path",
                "path cannot be empty",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelSection, ReplaySection, StoreSection};

    fn minimal_config() -> ServiceConfig {
        ServiceConfig {
            channel: ChannelSection {
                id: "-1003217044000".to_string(),
            },
            polling: Default::default(),
            recovery: Default::default(),
            store: Default::default(),
            metrics: None,
            replay: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_empty_channel_id() {
        let mut config = minimal_config();
        config.channel.id = "  ".to_string();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("channel.id"), "got: {err}");
    }

    #[test]
    fn test_timeout_out_of_range() {
        let mut config = minimal_config();
        config.polling.timeout_secs = 0;
        assert!(validate(&config).is_err());
        config.polling.timeout_secs = 121;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_max_items_out_of_range() {
        let mut config = minimal_config();
        config.polling.max_items = 101;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_items"), "got: {err}");
    }

    #[test]
    fn test_zero_recovery_attempts() {
        let mut config = minimal_config();
        config.recovery.max_attempts = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_attempts"), "got: {err}");
    }

    #[test]
    fn test_jsonl_store_requires_path() {
        let mut config = minimal_config();
        config.store = StoreSection {
            kind: StoreKind::Jsonl,
            path: "".to_string(),
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("store.path"), "got: {err}");
    }

    #[test]
    fn test_empty_replay_path() {
        let mut config = minimal_config();
        config.replay = Some(ReplaySection {
            path: " ".to_string(),
        });
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("replay.path"), "got: {err}");
    }
}
