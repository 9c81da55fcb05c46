//! Template detection and record assembly.
//!
//! Single entry point [`classify`]: identify the template by the title line,
//! run the per-template extraction routine, and absorb any extraction failure
//! into a `ParseError` record instead of letting it reach the polling loop.

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use contracts::{
    record_id, ClassifiedRecord, LifecycleStatus, Outcome, RawMessage, TemplateKind,
    ALERT_TITLE, DEFAULT_VOLUME, NOT_AVAILABLE, REPORT_TITLE,
};

use crate::area::resolve_group;
use crate::extract::{
    extract_date, extract_first, extract_free_detail, extract_volume, format_event_date,
};

/// Failure inside a per-template extraction routine.
///
/// Never crosses the classify boundary: [`classify`] converts it into a
/// record with `outcome = ParseError` so the caller's loop keeps polling.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("message body has no title line")]
    MissingTitle,

    /// Hard failure inside an extraction routine. The current routines fall
    /// back to sentinels instead of failing, so nothing constructs this in
    /// production yet; it exists so a routine that gains a hard failure mode
    /// stays inside the absorption contract of [`classify`].
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Classify a raw message into a structured record.
///
/// Returns `None` for messages that are not of interest: empty bodies and
/// bodies whose first line matches neither known title. Those are dropped,
/// not stored, not errors.
///
/// Classifying the same message twice yields records identical in content
/// except `record_id`/`processed_at`; duplicate collapsing is the store's job.
pub fn classify(message: &RawMessage) -> Option<ClassifiedRecord> {
    if message.body.trim().is_empty() {
        return None;
    }

    let kind = detect_template(&message.body)?;

    let record = match build_record(kind, message) {
        Ok(record) => record,
        Err(err) => {
            debug!(
                sequence_id = message.sequence_id,
                error = %err,
                "extraction failed, emitting parse-error record"
            );
            parse_error_record(kind, message, &err)
        }
    };

    Some(record)
}

/// Identify the template by exact match of the trimmed first line.
fn detect_template(body: &str) -> Option<TemplateKind> {
    match body.lines().next()?.trim() {
        REPORT_TITLE => Some(TemplateKind::Report),
        ALERT_TITLE => Some(TemplateKind::Alert),
        _ => None,
    }
}

/// Per-template extraction routine.
fn build_record(
    kind: TemplateKind,
    message: &RawMessage,
) -> Result<ClassifiedRecord, ClassifyError> {
    let body = &message.body;
    if body.lines().next().is_none() {
        return Err(ClassifyError::MissingTitle);
    }

    let report_type = extract_first(body, &["TIPO"]);
    let group = extract_first(body, &["GRUPO"]);
    let date_text = extract_first(body, &["DIA", "DATA"]);
    let responsible = extract_first(body, &["RESPONSAVEL", "RESPONSÁVEL"]);
    let volume_text = extract_first(body, &["VOLUME"]);

    let event_date = date_text
        .as_deref()
        .and_then(extract_date)
        .unwrap_or_else(|| format_event_date(message.timestamp));

    let volume = volume_text
        .as_deref()
        .and_then(extract_volume)
        .unwrap_or(DEFAULT_VOLUME);

    let resolved_area = group
        .as_deref()
        .and_then(resolve_group)
        .map(str::to_string);

    let outcome = if resolved_area.is_some() {
        Outcome::Success
    } else {
        Outcome::UnresolvedGroup
    };

    let detail_text = match kind {
        TemplateKind::Alert => Some(
            extract_first(body, &["DETALHES", "DESCRICAO", "DESCRIÇÃO"])
                .unwrap_or_else(|| extract_free_detail(body)),
        ),
        TemplateKind::Report => None,
    };

    let now = Utc::now();
    Ok(ClassifiedRecord {
        record_id: record_id(kind, message.sequence_id, now),
        template_kind: kind,
        sequence_id: message.sequence_id,
        received_at: message.timestamp,
        event_date,
        report_type: report_type.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        raw_group_label: group.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        resolved_area,
        responsible_party: responsible.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        volume,
        detail_text,
        full_body: body.clone(),
        outcome,
        error: None,
        lifecycle_status: match kind {
            TemplateKind::Alert => Some(LifecycleStatus::New),
            TemplateKind::Report => None,
        },
        processed_at: now,
    })
}

/// Fallback record for a failed extraction: sentinels everywhere, verbatim
/// body retained for manual recovery.
fn parse_error_record(
    kind: TemplateKind,
    message: &RawMessage,
    err: &ClassifyError,
) -> ClassifiedRecord {
    let now = Utc::now();
    ClassifiedRecord {
        record_id: record_id(kind, message.sequence_id, now),
        template_kind: kind,
        sequence_id: message.sequence_id,
        received_at: message.timestamp,
        event_date: format_event_date(message.timestamp),
        report_type: NOT_AVAILABLE.to_string(),
        raw_group_label: NOT_AVAILABLE.to_string(),
        resolved_area: None,
        responsible_party: NOT_AVAILABLE.to_string(),
        volume: DEFAULT_VOLUME,
        detail_text: None,
        full_body: message.body.clone(),
        outcome: Outcome::ParseError,
        error: Some(err.to_string()),
        lifecycle_status: match kind {
            TemplateKind::Alert => Some(LifecycleStatus::New),
            TemplateKind::Report => None,
        },
        processed_at: now,
    }
}
