//! Service orchestration module.

mod runtime;
mod stats;

pub use runtime::{ServiceOptions, ServiceRuntime};
pub use stats::ServiceStats;
