//! # Classifier
//!
//! Pure message classification engine: template detection, typed field
//! extraction, and group-label resolution. No I/O, no state; the ingestion
//! crate drives it, and the management surface exposes it directly for manual
//! backfill and troubleshooting.

mod area;
mod extract;
mod parse;

pub use area::{normalize_label, resolve_group, AREA_TABLE};
pub use extract::{
    extract_date, extract_field, extract_first, extract_free_detail, extract_volume,
    format_event_date,
};
pub use parse::{classify, ClassifyError};
