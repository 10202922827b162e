//! Staking pool: locks ledger balances for linear yield.
//!
//! `reward = principal × rate × elapsed / RATE_SCALE`
//!
//! Tokens never leave the ledger: staked principal and reward funds sit in the
//! pool's custody address and the pool keeps only bookkeeping. Each stake runs
//! through an explicit state machine (`Idle → Accruing → Settled`); any change
//! to the accrual basis checkpoints prior reward into a fixed claimable amount
//! first, so adding stake before claiming never compounds.

pub mod error;
pub mod pool;
pub mod stake;

pub use error::StakingError;
pub use pool::{StakingPool, UnstakeReceipt, RATE_SCALE};
pub use stake::{Stake, StakePhase};
