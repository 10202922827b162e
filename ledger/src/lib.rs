//! Fungible-token balance store for NXD.
//!
//! The ledger exclusively owns account balances and allowances and is the only
//! place where total supply changes. Staking and bridging components move value
//! through its public operations, which keeps `Σ balances == total_supply`
//! enforceable in one place.
//!
//! Minting is gated by the owner or by the [`MinterRegistry`] capability table,
//! so a bridge can mint without holding administrative rights.

pub mod account;
pub mod error;
pub mod ledger;
pub mod registry;

pub use account::Account;
pub use error::LedgerError;
pub use ledger::{Ledger, TokenMetadata};
pub use registry::{MinterRegistry, Permissions};
