//! Bridge: moves ledger tokens to and from a counterpart chain.
//!
//! Outbound: `lock` debits the sender (transfer into bridge custody, or burn)
//! and records a `Pending` transfer; the relay carries it to the other chain
//! and later calls `confirm`, or `revert` to give the funds back.
//!
//! Inbound: the relay, holding minter or relay capability, calls `release`
//! with the id of the event it observed; the bridge mints or releases from
//! custody to the recipient. Every transfer id leaves `Pending` exactly once,
//! which is what rules out double release and replay.
//!
//! Proof that the counterpart event happened is the relay's responsibility.

pub mod bridge;
pub mod error;
pub mod transfer;

pub use bridge::{Bridge, BridgeMode};
pub use error::BridgeError;
pub use transfer::{BridgeTransfer, Direction, TransferStatus};
