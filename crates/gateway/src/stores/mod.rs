//! Record store implementations

mod jsonl;
mod log;
mod memory;

pub use jsonl::JsonlStore;
pub use log::LogStore;
pub use memory::MemoryStore;
