//! `resolve` command implementation.
//!
//! Troubleshooting helper: shows how a group label normalizes and which
//! area it maps to, if any.

use anyhow::{Context, Result};
use serde::Serialize;

use classifier::{normalize_label, resolve_group};

use crate::cli::ResolveArgs;

/// Resolution result for JSON output
#[derive(Serialize)]
struct Resolution {
    label: String,
    normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    area: Option<String>,
}

/// Execute the `resolve` command
pub fn run_resolve(args: &ResolveArgs) -> Result<()> {
    let resolution = Resolution {
        label: args.label.clone(),
        normalized: normalize_label(&args.label),
        area: resolve_group(&args.label).map(str::to_string),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&resolution).context("Failed to serialize resolution")?
        );
        return Ok(());
    }

    println!("Label:      {}", resolution.label);
    println!("Normalized: {}", resolution.normalized);
    match &resolution.area {
        Some(area) => println!("Area:       {}", area),
        None => println!("Area:       (unresolved)"),
    }

    Ok(())
}
