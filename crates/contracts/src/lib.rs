//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are
//! prohibited.
//!
//! ## Delivery Model
//! - The upstream transport delivers at-least-once; `sequence_id` is the
//!   transport-assigned monotonic position marker
//! - Record storage is idempotent-tolerant: the same `sequence_id` may be appended
//!   more than once after a restart, final de-duplication is a store concern

mod channel_id;
mod error;
mod record;
mod store;
mod transport;

pub use channel_id::ChannelId;
pub use error::*;
pub use record::*;
pub use store::RecordStore;
pub use transport::{Identity, MembershipRole, MessageTransport};
