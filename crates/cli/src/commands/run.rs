//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use config_loader::ServiceConfig;

use crate::cli::RunArgs;
use crate::service::{ServiceOptions, ServiceRuntime};

/// Execute the `run` command
pub async fn run_service(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref channel) = args.channel {
        info!(channel = %channel, "Overriding channel from CLI");
        config.channel.id = channel.clone();
    }
    if let Some(ref replay) = args.replay {
        info!(replay = %replay.display(), "Overriding replay log from CLI");
        config.replay = Some(config_loader::ReplaySection {
            path: replay.display().to_string(),
        });
    }
    if let Some(port) = args.metrics_port {
        config.metrics = if port == 0 {
            None
        } else {
            Some(config_loader::MetricsSection { port })
        };
    }

    info!(
        channel = %config.channel.id,
        store = ?config.store.kind,
        poll_timeout_secs = config.polling.timeout_secs,
        max_items = config.polling.max_items,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if let Some(metrics) = &config.metrics {
        observability::init_metrics_only(metrics.port)
            .context("Failed to start metrics exporter")?;
    }

    let runtime = ServiceRuntime::new(ServiceOptions {
        config,
        drain: args.drain,
    });

    info!("Starting ingestion session...");
    let stats = runtime.run().await.context("Service run failed")?;

    info!(
        records_stored = stats.counters.processed,
        duration_secs = stats.duration.as_secs_f64(),
        "Session finished"
    );
    stats.print_summary();

    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &ServiceConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Channel: {}", config.channel.id);
    println!("\nPolling:");
    println!("  Timeout: {}s", config.polling.timeout_secs);
    println!("  Max items: {}", config.polling.max_items);
    println!("\nRecovery:");
    println!("  Max attempts: {}", config.recovery.max_attempts);
    println!("  Cooldown: {}s", config.recovery.cooldown_secs);
    println!("  Base delay: {}s", config.recovery.base_delay_secs);
    println!("\nStore: {:?} ({})", config.store.kind, config.store.path);

    if let Some(metrics) = &config.metrics {
        println!("Metrics port: {}", metrics.port);
    }
    if let Some(replay) = &config.replay {
        println!("Replay log: {}", replay.path);
    }

    println!();
}
