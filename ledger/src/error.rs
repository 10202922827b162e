//! Ledger errors.
//!
//! Display strings follow the token's on-chain revert messages so that
//! wallets and scripts matching on them keep working.

use nxd_types::{Address, Amount};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("NXD: insufficient balance")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("NXD: insufficient allowance")]
    InsufficientAllowance { needed: Amount, available: Amount },

    #[error("NXD: caller is not owner")]
    Unauthorized { caller: Address },

    #[error("NXD: invalid recipient {0}")]
    InvalidRecipient(Address),

    #[error("NXD: arithmetic overflow")]
    Overflow,

    #[error("NXD: total supply {total_supply} does not match sum of balances {sum}")]
    SupplyMismatch { total_supply: Amount, sum: Amount },
}
