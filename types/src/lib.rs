//! Fundamental types for the NXD token engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, amounts, timestamps, bridge transfer ids and the per-call context
//! handed over by the host.

pub mod address;
pub mod amount;
pub mod context;
pub mod error;
pub mod hash;
pub mod time;

pub use address::Address;
pub use amount::{Amount, DEFAULT_DECIMALS};
pub use context::CallContext;
pub use error::TypeError;
pub use hash::{blake2b_256, blake2b_256_multi, TransferId};
pub use time::Timestamp;
