//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// cop-ingest - chat report ingestion and classification service
#[derive(Parser, Debug)]
#[command(
    name = "cop-ingest",
    author,
    version,
    about = "Chat report ingestion and classification service",
    long_about = "Polls an operations channel for structured report and incident-alert \n\
                  messages, classifies them into records, and appends them to a \n\
                  persistence store.\n\n\
                  One instance owns one polling session; duplicate-session conflicts \n\
                  are recovered with a bounded retry budget."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "COP_INGEST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "COP_INGEST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Classify a captured message log without a session (backfill)
    Classify(ClassifyArgs),

    /// Resolve a group label against the area table
    Resolve(ResolveArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "COP_INGEST_CONFIG")]
    pub config: PathBuf,

    /// Override channel id from configuration
    #[arg(long, env = "COP_INGEST_CHANNEL")]
    pub channel: Option<String>,

    /// Override replay log path from configuration
    #[arg(long, env = "COP_INGEST_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Stop automatically once the replay log is fully consumed
    #[arg(long)]
    pub drain: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port override (0 = disabled)
    #[arg(long, env = "COP_INGEST_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `classify` command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Path to a JSONL file of raw messages
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write classified records to this JSONL file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `resolve` command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Group label to resolve
    pub label: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
