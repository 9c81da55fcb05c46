//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::ServiceConfig;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    channel: String,
    store_kind: String,
    poll_timeout_secs: u64,
    max_items: usize,
    recovery_max_attempts: u32,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    channel: config.channel.id.clone(),
                    store_kind: format!("{:?}", config.store.kind),
                    poll_timeout_secs: config.polling.timeout_secs,
                    max_items: config.polling.max_items,
                    recovery_max_attempts: config.recovery.max_attempts,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ServiceConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.replay.is_none() {
        warnings.push("No [replay] section - the run command needs a message log".to_string());
    }

    if config.metrics.is_none() {
        warnings.push("No [metrics] section - Prometheus export disabled".to_string());
    }

    if config.recovery.cooldown_secs < config.recovery.base_delay_secs {
        warnings.push(format!(
            "recovery.cooldown_secs ({}) is below base_delay_secs ({}) - the backoff dominates",
            config.recovery.cooldown_secs, config.recovery.base_delay_secs
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Channel: {}", summary.channel);
            println!("  Store: {}", summary.store_kind);
            println!("  Poll timeout: {}s", summary.poll_timeout_secs);
            println!("  Max items per poll: {}", summary.max_items);
            println!("  Recovery attempts: {}", summary.recovery_max_attempts);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(dir: &std::path::Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[channel]\nid = \"-1003217044000\"\n",
        );

        let result = validate_config(&ValidateArgs {
            config: path,
            json: false,
        });
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("[replay]")));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[channel]\nid = \"\"\n",
        );

        let result = validate_config(&ValidateArgs {
            config: path,
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("channel.id"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/config.toml"),
            json: false,
        });
        assert!(!result.valid);
    }
}
