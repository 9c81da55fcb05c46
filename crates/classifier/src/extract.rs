//! Typed field extraction from loosely structured message bodies.
//!
//! Messages carry `KEY: value` lines in free text. Extraction is line-anchored
//! and case-insensitive; callers try synonym keys in priority order.

use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use contracts::NO_DETAILS;

/// `DD/MM/YYYY` with 1-2 digit day/month
static FULL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("static regex"));

/// `DD/MM` with 1-2 digit day/month
static SHORT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").expect("static regex"));

/// Field keys recognized across both templates, colon included. Lines starting
/// with one of these (upper-cased, trimmed) are field lines, not free detail.
const FIELD_PREFIXES: &[&str] = &[
    "TIPO:",
    "GRUPO:",
    "DIA:",
    "DATA:",
    "RESPONSAVEL:",
    "RESPONSÁVEL:",
    "VOLUME:",
    "DETALHES:",
    "DESCRICAO:",
    "DESCRIÇÃO:",
];

/// Extract the value of a `key : value` line.
///
/// Case-insensitive, anchored to line start, colon optionally surrounded by
/// whitespace. Returns the trimmed remainder of the first matching line.
pub fn extract_field(body: &str, key: &str) -> Option<String> {
    if body.is_empty() || key.is_empty() {
        return None;
    }

    let pattern = format!(r"(?im)^\s*{}\s*:\s*(.+)$", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Try synonym keys in priority order, first hit wins.
pub fn extract_first(body: &str, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| extract_field(body, key))
}

/// Extract a calendar date as `DD/MM/YYYY`.
///
/// Recognizes `DD/MM/YYYY` first, then `DD/MM` (assumes the current year).
/// Single-digit day/month are zero-padded. No calendar validation beyond the
/// digit shape; the upstream authors free-type these.
pub fn extract_date(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = FULL_DATE.captures(text) {
        return Some(format!("{:0>2}/{:0>2}/{}", &caps[1], &caps[2], &caps[3]));
    }

    if let Some(caps) = SHORT_DATE.captures(text) {
        let year = Utc::now().year();
        return Some(format!("{:0>2}/{:0>2}/{year}", &caps[1], &caps[2]));
    }

    None
}

/// Extract a numeric volume.
///
/// Strips everything except digits, `.` and `,`. When a comma is present it is
/// the decimal separator and dots are thousands separators (`"1.234,5"` parses
/// as `1234.5`); otherwise the text parses as-is.
pub fn extract_volume(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Derive alert detail text from leftover body lines.
///
/// Used when no explicit detail field exists: keeps every line except the
/// title line and known field lines, joined verbatim. Falls back to the
/// sentinel when nothing remains.
pub fn extract_free_detail(body: &str) -> String {
    let detail = body
        .lines()
        .skip(1)
        .filter(|line| {
            let upper = line.trim().to_uppercase();
            !FIELD_PREFIXES.iter().any(|prefix| upper.starts_with(prefix))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if detail.is_empty() {
        NO_DETAILS.to_string()
    } else {
        detail
    }
}

/// Render an instant as the normalized `DD/MM/YYYY` event date.
pub fn format_event_date(instant: DateTime<Utc>) -> String {
    instant.format("%d/%m/%Y").to_string()
}
