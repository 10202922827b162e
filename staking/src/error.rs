//! Staking-specific errors.

use nxd_ledger::LedgerError;
use nxd_types::{Address, Amount};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StakingError {
    #[error("insufficient stake: need {needed}, staked {staked}")]
    InsufficientStake { needed: Amount, staked: Amount },

    /// Reward funds in custody cannot cover a payout. This breaks the pool's
    /// funding invariant and is not retriable by the staker.
    #[error("staking pool underfunded: owes {owed} in rewards, holds {available}")]
    PoolUnderfunded { owed: Amount, available: Amount },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow in reward computation")]
    Overflow,

    #[error("caller {caller} is not allowed to perform this operation")]
    Unauthorized { caller: Address },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
