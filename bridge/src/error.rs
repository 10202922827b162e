//! Bridge-specific errors.

use nxd_ledger::LedgerError;
use nxd_types::{Address, Amount, TransferId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("transfer {0} is no longer pending")]
    AlreadyCompleted(TransferId),

    #[error("caller {caller} is not authorized to relay bridge transfers")]
    Unauthorized { caller: Address },

    #[error("transfer {0} not found")]
    UnknownTransfer(TransferId),

    #[error("transfer {0} already exists")]
    DuplicateTransfer(TransferId),

    #[error("transfer {0} runs in the other direction")]
    DirectionMismatch(TransferId),

    #[error("release of {0} does not match the registered recipient or amount")]
    TransferMismatch(TransferId),

    #[error("lock amount {amount} exceeds per-transfer limit {limit}")]
    LockLimitExceeded { amount: Amount, limit: Amount },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
