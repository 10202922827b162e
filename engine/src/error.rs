use nxd_bridge::BridgeError;
use nxd_ledger::LedgerError;
use nxd_staking::StakingError;
use nxd_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("staking error: {0}")]
    Staking(#[from] StakingError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A fatal condition stopped the engine; mutating calls are refused until
    /// the owner resumes it.
    #[error("engine halted: {reason}")]
    Halted { reason: String },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("no engine state in store")]
    NotDeployed,
}

/// Flat error code for callers that surface failures to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientBalance,
    InsufficientAllowance,
    Unauthorized,
    InvalidRecipient,
    Overflow,
    InsufficientStake,
    PoolUnderfunded,
    ZeroAmount,
    AlreadyCompleted,
    UnknownTransfer,
    DuplicateTransfer,
    DirectionMismatch,
    TransferMismatch,
    LockLimitExceeded,
    Halted,
    InvariantViolation,
    Store,
    Config,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(e) => ledger_kind(e),
            Self::Staking(e) => match e {
                StakingError::InsufficientStake { .. } => ErrorKind::InsufficientStake,
                StakingError::PoolUnderfunded { .. } => ErrorKind::PoolUnderfunded,
                StakingError::ZeroAmount => ErrorKind::ZeroAmount,
                StakingError::Overflow => ErrorKind::Overflow,
                StakingError::Unauthorized { .. } => ErrorKind::Unauthorized,
                StakingError::Ledger(e) => ledger_kind(e),
            },
            Self::Bridge(e) => match e {
                BridgeError::AlreadyCompleted(_) => ErrorKind::AlreadyCompleted,
                BridgeError::Unauthorized { .. } => ErrorKind::Unauthorized,
                BridgeError::UnknownTransfer(_) => ErrorKind::UnknownTransfer,
                BridgeError::DuplicateTransfer(_) => ErrorKind::DuplicateTransfer,
                BridgeError::DirectionMismatch(_) => ErrorKind::DirectionMismatch,
                BridgeError::TransferMismatch(_) => ErrorKind::TransferMismatch,
                BridgeError::LockLimitExceeded { .. } => ErrorKind::LockLimitExceeded,
                BridgeError::ZeroAmount => ErrorKind::ZeroAmount,
                BridgeError::Overflow => ErrorKind::Overflow,
                BridgeError::Ledger(e) => ledger_kind(e),
            },
            Self::Store(_) | Self::NotDeployed => ErrorKind::Store,
            Self::Halted { .. } => ErrorKind::Halted,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether this failure must stop the engine.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::PoolUnderfunded | ErrorKind::InvariantViolation
        )
    }
}

fn ledger_kind(e: &LedgerError) -> ErrorKind {
    match e {
        LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
        LedgerError::InsufficientAllowance { .. } => ErrorKind::InsufficientAllowance,
        LedgerError::Unauthorized { .. } => ErrorKind::Unauthorized,
        LedgerError::InvalidRecipient(_) => ErrorKind::InvalidRecipient,
        LedgerError::Overflow => ErrorKind::Overflow,
        LedgerError::SupplyMismatch { .. } => ErrorKind::InvariantViolation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxd_types::{Address, Amount, TransferId};

    #[test]
    fn nested_ledger_errors_map_to_ledger_kinds() {
        let insufficient = LedgerError::InsufficientBalance {
            needed: Amount::new(2),
            available: Amount::new(1),
        };
        assert_eq!(
            EngineError::from(StakingError::from(insufficient.clone())).kind(),
            ErrorKind::InsufficientBalance
        );
        assert_eq!(
            EngineError::from(BridgeError::from(insufficient)).kind(),
            ErrorKind::InsufficientBalance
        );
    }

    #[test]
    fn fatal_kinds() {
        let underfunded = EngineError::from(StakingError::PoolUnderfunded {
            owed: Amount::new(5),
            available: Amount::ZERO,
        });
        assert!(underfunded.is_fatal());
        assert!(EngineError::InvariantViolation("x".into()).is_fatal());
        assert!(!EngineError::from(BridgeError::AlreadyCompleted(TransferId::ZERO)).is_fatal());
        assert!(!EngineError::from(LedgerError::Unauthorized {
            caller: Address::ZERO
        })
        .is_fatal());
    }

    #[test]
    fn ledger_messages_pass_through() {
        let err = EngineError::from(LedgerError::Unauthorized {
            caller: Address::ZERO,
        });
        assert_eq!(err.to_string(), "ledger error: NXD: caller is not owner");
    }
}
