//! Command implementations.

mod classify;
mod resolve;
mod run;
mod validate;

pub use classify::run_classify;
pub use resolve::run_resolve;
pub use run::run_service;
pub use validate::run_validate;
