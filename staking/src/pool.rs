//! Staking pool engine.

use std::collections::BTreeMap;

use crate::error::StakingError;
use crate::stake::{Stake, StakePhase};
use nxd_ledger::Ledger;
use nxd_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Fixed-point scale of the reward rate: a rate of `RATE_SCALE` pays one raw
/// unit of reward per raw unit of principal per second.
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000;

/// What an `unstake` paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnstakeReceipt {
    pub principal: Amount,
    pub reward: Amount,
}

impl UnstakeReceipt {
    pub fn total(&self) -> Amount {
        self.principal + self.reward
    }
}

/// The staking pool.
///
/// Principal of every staker plus the reward funds live in the ledger balance
/// of `custody`. Rewards may only be paid from the part of that balance that
/// exceeds `total_staked`; paying them out of other stakers' principal would
/// fail with [`StakingError::PoolUnderfunded`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPool {
    custody: Address,
    /// Reward per raw unit of principal per second, scaled by [`RATE_SCALE`].
    reward_rate: u128,
    stakes: BTreeMap<Address, Stake>,
    total_staked: Amount,
}

impl StakingPool {
    pub fn new(custody: Address, reward_rate: u128) -> Self {
        Self {
            custody,
            reward_rate,
            stakes: BTreeMap::new(),
            total_staked: Amount::ZERO,
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn custody(&self) -> Address {
        self.custody
    }

    pub fn reward_rate(&self) -> u128 {
        self.reward_rate
    }

    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    pub fn stake_of(&self, staker: &Address) -> Stake {
        self.stakes.get(staker).cloned().unwrap_or_default()
    }

    pub fn stakes(&self) -> impl Iterator<Item = (&Address, &Stake)> {
        self.stakes.iter()
    }

    /// Reward funds held in custody beyond staked principal.
    pub fn reward_reserve(&self, ledger: &Ledger) -> Amount {
        ledger.balance_of(&self.custody).saturating_sub(self.total_staked)
    }

    /// Checkpointed plus currently accruing reward for `staker` at `now`.
    pub fn pending_reward(&self, staker: &Address, now: Timestamp) -> Result<Amount, StakingError> {
        let stake = self.stake_of(staker);
        let accrued = self.accrued(&stake, now)?;
        stake
            .claimable
            .checked_add(accrued)
            .ok_or(StakingError::Overflow)
    }

    // ── Staker operations ───────────────────────────────────────────────

    /// Lock `amount` of the caller's balance.
    ///
    /// Any reward accrued on existing principal is checkpointed first, then the
    /// accrual clock restarts at `now` on the new total.
    pub fn stake(
        &mut self,
        ledger: &mut Ledger,
        staker: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        if amount.is_zero() {
            return Err(StakingError::ZeroAmount);
        }
        if *staker == self.custody {
            return Err(StakingError::Unauthorized { caller: *staker });
        }
        let mut stake = self.settled(staker, now)?;
        stake.principal = stake
            .principal
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        let total = self
            .total_staked
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;

        ledger.transfer(staker, &self.custody, amount)?;

        stake.phase = StakePhase::Accruing;
        self.stakes.insert(*staker, stake);
        self.total_staked = total;
        Ok(())
    }

    /// Withdraw `amount` of principal together with all reward owed so far.
    pub fn unstake(
        &mut self,
        ledger: &mut Ledger,
        staker: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<UnstakeReceipt, StakingError> {
        if amount.is_zero() {
            return Err(StakingError::ZeroAmount);
        }
        let mut stake = self.settled(staker, now)?;
        if amount > stake.principal {
            return Err(StakingError::InsufficientStake {
                needed: amount,
                staked: stake.principal,
            });
        }
        let receipt = UnstakeReceipt {
            principal: amount,
            reward: stake.claimable,
        };
        self.pay(ledger, staker, receipt.principal, receipt.reward)?;

        stake.principal = stake.principal - amount;
        stake.claimable = Amount::ZERO;
        if stake.principal.is_zero() {
            stake.phase = StakePhase::Settled;
        }
        self.stakes.insert(*staker, stake);
        self.total_staked = self.total_staked - amount;
        Ok(receipt)
    }

    /// Pay out accrued reward without touching principal. Returns the amount paid.
    pub fn claim(
        &mut self,
        ledger: &mut Ledger,
        staker: &Address,
        now: Timestamp,
    ) -> Result<Amount, StakingError> {
        let mut stake = self.settled(staker, now)?;
        let reward = stake.claimable;
        if reward.is_zero() {
            if self.stakes.contains_key(staker) {
                self.stakes.insert(*staker, stake);
            }
            return Ok(Amount::ZERO);
        }
        self.pay(ledger, staker, Amount::ZERO, reward)?;

        stake.claimable = Amount::ZERO;
        self.stakes.insert(*staker, stake);
        Ok(reward)
    }

    /// Fold accrued reward into the claimable balance and restart the clock.
    /// Moves no tokens. Returns the claimable total afterwards.
    pub fn checkpoint(&mut self, staker: &Address, now: Timestamp) -> Result<Amount, StakingError> {
        let stake = self.settled(staker, now)?;
        let claimable = stake.claimable;
        if self.stakes.contains_key(staker) {
            self.stakes.insert(*staker, stake);
        }
        Ok(claimable)
    }

    // ── Administration ──────────────────────────────────────────────────

    /// Move reward funds from `funder` into custody.
    pub fn fund_rewards(
        &self,
        ledger: &mut Ledger,
        funder: &Address,
        amount: Amount,
    ) -> Result<(), StakingError> {
        if amount.is_zero() {
            return Err(StakingError::ZeroAmount);
        }
        ledger.transfer(funder, &self.custody, amount)?;
        Ok(())
    }

    /// Change the reward rate. Ledger owner only.
    ///
    /// Every accruing stake is checkpointed at the old rate first.
    pub fn set_reward_rate(
        &mut self,
        ledger: &Ledger,
        caller: &Address,
        rate: u128,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        if *caller != ledger.owner() {
            return Err(StakingError::Unauthorized { caller: *caller });
        }
        let mut updated = BTreeMap::new();
        for (staker, stake) in &self.stakes {
            updated.insert(*staker, self.checkpointed(stake, now)?);
        }
        self.stakes = updated;
        self.reward_rate = rate;
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Reward earned since the stake's last checkpoint.
    fn accrued(&self, stake: &Stake, now: Timestamp) -> Result<Amount, StakingError> {
        if !stake.is_accruing() || stake.principal.is_zero() {
            return Ok(Amount::ZERO);
        }
        let elapsed = u128::from(stake.since.elapsed_since(now));
        let factor = self
            .reward_rate
            .checked_mul(elapsed)
            .ok_or(StakingError::Overflow)?;
        mul_div(stake.principal.raw(), factor, RATE_SCALE)
            .map(Amount::new)
            .ok_or(StakingError::Overflow)
    }

    /// Copy of `stake` with accrual folded into `claimable` and the clock at `now`.
    /// The clock never moves backwards, so an out-of-order `now` accrues nothing.
    fn checkpointed(&self, stake: &Stake, now: Timestamp) -> Result<Stake, StakingError> {
        let accrued = self.accrued(stake, now)?;
        let mut next = stake.clone();
        next.claimable = next
            .claimable
            .checked_add(accrued)
            .ok_or(StakingError::Overflow)?;
        next.since = stake.since.max(now);
        Ok(next)
    }

    fn settled(&self, staker: &Address, now: Timestamp) -> Result<Stake, StakingError> {
        self.checkpointed(&self.stake_of(staker), now)
    }

    /// Transfer principal plus reward from custody, enforcing that the reward
    /// part is covered by funds beyond other stakers' principal.
    fn pay(
        &self,
        ledger: &mut Ledger,
        staker: &Address,
        principal: Amount,
        reward: Amount,
    ) -> Result<(), StakingError> {
        let available = self.reward_reserve(ledger);
        if reward > available {
            return Err(StakingError::PoolUnderfunded {
                owed: reward,
                available,
            });
        }
        let total = principal.checked_add(reward).ok_or(StakingError::Overflow)?;
        ledger.transfer(&self.custody, staker, total)?;
        Ok(())
    }
}

/// `a × b / d` without overflowing on the intermediate product when `a` is large.
fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    let whole = (a / d).checked_mul(b)?;
    let part = (a % d).checked_mul(b)? / d;
    whole.checked_add(part)
}
