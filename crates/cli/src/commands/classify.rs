//! `classify` command implementation.
//!
//! Offline backfill: runs the classifier over a captured JSONL message log
//! without starting a session, optionally writing the records out.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use classifier::classify;
use contracts::RawMessage;
use observability::IngestStatsAggregator;

use crate::cli::ClassifyArgs;

/// Classification result for JSON output
#[derive(Serialize)]
struct ClassifySummary {
    messages_read: u64,
    records_produced: u64,
    skipped: u64,
    reports: u64,
    alerts: u64,
    unresolved_groups: u64,
    parse_errors: u64,
}

/// Execute the `classify` command
pub fn run_classify(args: &ClassifyArgs) -> Result<()> {
    info!(input = %args.input.display(), "Classifying message log");

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let mut output = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let mut aggregator = IngestStatsAggregator::new();
    let mut messages_read = 0u64;
    let mut skipped = 0u64;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Read error at line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let message: RawMessage = serde_json::from_str(&line)
            .with_context(|| format!("Invalid message at line {}", line_no + 1))?;
        messages_read += 1;

        let Some(record) = classify(&message) else {
            skipped += 1;
            continue;
        };
        aggregator.update(&record);

        if let Some(writer) = &mut output {
            let json = serde_json::to_string(&record)
                .with_context(|| format!("Failed to serialize record {}", record.record_id))?;
            writeln!(writer, "{json}")?;
        }
    }

    if let Some(mut writer) = output {
        writer.flush()?;
    }

    let summary = aggregator.summary();
    if args.json {
        let json_summary = ClassifySummary {
            messages_read,
            records_produced: summary.total_records,
            skipped,
            reports: summary.reports,
            alerts: summary.alerts,
            unresolved_groups: summary.unresolved,
            parse_errors: summary.parse_errors,
        };
        println!("{}", serde_json::to_string_pretty(&json_summary)?);
    } else {
        println!("Messages read: {messages_read} ({skipped} skipped)");
        print!("{summary}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn write_log(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("log.jsonl");
        let mut file = File::create(&path).unwrap();
        let bodies = [
            "COP REDE INFORMA\nTIPO: Preventiva\nGRUPO: MG\nVOLUME: 2",
            "🚨 Novo Evento Detectado!\nGRUPO: Norte\nVOLUME: 1",
            "mensagem irrelevante",
        ];
        for (i, body) in bodies.iter().enumerate() {
            let message = RawMessage {
                sequence_id: i as u64 + 1,
                chat_id: "-3217044000".to_string(),
                sender_is_automated: false,
                body: body.to_string(),
                timestamp: Utc::now(),
            };
            writeln!(file, "{}", serde_json::to_string(&message).unwrap()).unwrap();
        }
        path
    }

    #[test]
    fn test_classify_log_with_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_log(dir.path());
        let output = dir.path().join("records.jsonl");

        run_classify(&ClassifyArgs {
            input,
            output: Some(output.clone()),
            json: false,
        })
        .unwrap();

        let content = std::fs::read_to_string(output).unwrap();
        // relevant messages only
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_classify_missing_input() {
        let result = run_classify(&ClassifyArgs {
            input: PathBuf::from("/nonexistent.jsonl"),
            output: None,
            json: false,
        });
        assert!(result.is_err());
    }
}
