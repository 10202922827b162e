//! Per-staker position.

use nxd_types::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Where a stake is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakePhase {
    /// Never staked.
    #[default]
    Idle,
    /// Principal is locked and reward accrues from `since`.
    Accruing,
    /// Fully unstaked and paid out. A new `stake` re-enters `Accruing`.
    Settled,
}

/// A staker's position in the pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    /// Amount locked in pool custody.
    pub principal: Amount,
    /// Start of the current accrual window.
    pub since: Timestamp,
    /// Reward already checkpointed but not yet paid.
    pub claimable: Amount,
    pub phase: StakePhase,
}

impl Stake {
    pub fn is_accruing(&self) -> bool {
        self.phase == StakePhase::Accruing
    }
}
