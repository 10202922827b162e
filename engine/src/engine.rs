//! The engine façade: one guarded entry point per external call.

use std::sync::Arc;

use nxd_bridge::{Bridge, BridgeMode};
use nxd_ledger::{Ledger, LedgerError, Permissions};
use nxd_staking::{StakingPool, UnstakeReceipt};
use nxd_store::StateStore;
use nxd_types::{Address, Amount, CallContext, Timestamp, TransferId};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::event::{EngineEvent, EventBus, EventRecord};
use crate::state::{self, EngineState, Status};

type CallResult<T> = Result<(T, Vec<EngineEvent>), EngineError>;

/// Deployed ledger, staking pool and bridge behind a single call guard.
///
/// Every mutating call:
/// 1. is refused with [`EngineError::Halted`] while the engine is halted,
/// 2. runs against the components, which validate before they mutate,
/// 3. re-checks `Σ balances == total_supply`,
/// 4. commits the new state to the attached store, if any,
/// 5. appends its events to the journal and notifies subscribers.
///
/// A fatal failure (pool underfunded, supply invariant broken) halts the
/// engine until the ledger owner calls [`Engine::resume`].
pub struct Engine {
    state: EngineState,
    halted: Option<String>,
    journal: Vec<EventRecord>,
    next_seq: u64,
    bus: EventBus,
    store: Option<Arc<dyn StateStore>>,
}

impl Engine {
    /// Deploy from configuration: token, staking pool, bridge, the bridge
    /// custody's mint capability, then the owner-funded reward reserve.
    pub fn deploy(config: &EngineConfig, now: Timestamp) -> Result<Self, EngineError> {
        config.validate()?;
        let owner = config.owner;

        let mut ledger = Ledger::new(owner, config.metadata(), u128::from(config.initial_supply))?;
        let reserve = config.reward_reserve()?;
        let staking = StakingPool::new(config.staking_custody(), u128::from(config.reward_rate));
        let mut bridge = Bridge::new(config.bridge_custody(), config.operator(), config.bridge_mode);
        if let Some(limit) = config.lock_limit()? {
            bridge = bridge.with_lock_limit(limit);
        }
        if config.register_bridge_minter {
            ledger.set_minter(&owner, &bridge.custody(), true)?;
        }
        if !reserve.is_zero() {
            staking.fund_rewards(&mut ledger, &owner, reserve)?;
        } else if staking.reward_rate() > 0 {
            tracing::warn!(
                rate = staking.reward_rate(),
                "reward rate set with an empty reserve; claims halt the engine until funded"
            );
        }

        tracing::info!(
            symbol = %ledger.symbol(),
            %owner,
            supply = %ledger.total_supply(),
            staking = %staking.custody(),
            bridge = %bridge.custody(),
            mode = ?bridge.mode(),
            %reserve,
            "engine deployed"
        );

        let supply = ledger.total_supply();
        let bridge_custody = bridge.custody();
        let staking_custody = staking.custody();
        let mut engine = Self::from_state(EngineState {
            ledger,
            staking,
            bridge,
        });
        if !supply.is_zero() {
            engine.record(
                now,
                EngineEvent::Mint {
                    minter: owner,
                    to: owner,
                    amount: supply,
                },
            );
        }
        if config.register_bridge_minter {
            engine.record(
                now,
                EngineEvent::PermissionsUpdated {
                    target: bridge_custody,
                    bits: Permissions::MINT.bits(),
                    enabled: true,
                },
            );
        }
        if !reserve.is_zero() {
            engine.record(
                now,
                EngineEvent::Transfer {
                    from: owner,
                    to: staking_custody,
                    amount: reserve,
                },
            );
            engine.record(
                now,
                EngineEvent::RewardsFunded {
                    funder: owner,
                    amount: reserve,
                },
            );
        }
        Ok(engine)
    }

    /// Restore an engine previously committed to `store`, keeping the store
    /// attached.
    pub fn load(store: Arc<dyn StateStore>) -> Result<Self, EngineError> {
        let (state, status) = state::read_all(store.as_ref())?.ok_or(EngineError::NotDeployed)?;
        let mut engine = Self::from_state(state);
        engine.halted = status.halted;
        engine.next_seq = status.next_seq;
        engine.store = Some(store);

        if let Some(reason) = &engine.halted {
            tracing::warn!(%reason, "loaded engine is halted");
        } else if let Err(err) = engine.state.ledger.check_supply_invariant() {
            engine.halt(Timestamp::EPOCH, format!("load: {err}"));
        }
        tracing::info!(
            supply = %engine.state.ledger.total_supply(),
            transfers = engine.state.bridge.transfers().count(),
            next_seq = engine.next_seq,
            "engine loaded"
        );
        Ok(engine)
    }

    fn from_state(state: EngineState) -> Self {
        Self {
            state,
            halted: None,
            journal: Vec::new(),
            next_seq: 0,
            bus: EventBus::new(),
            store: None,
        }
    }

    /// Commit the current state to `store` and keep committing after every
    /// successful call.
    pub fn attach_store(&mut self, store: Arc<dyn StateStore>) -> Result<(), EngineError> {
        state::write_all(store.as_ref(), &self.state, &self.status(0))?;
        self.store = Some(store);
        Ok(())
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&EventRecord) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn staking(&self) -> &StakingPool {
        &self.state.staking
    }

    pub fn bridge(&self) -> &Bridge {
        &self.state.bridge
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.state.ledger.balance_of(address)
    }

    pub fn total_supply(&self) -> Amount {
        self.state.ledger.total_supply()
    }

    pub fn pending_reward(&self, staker: &Address, now: Timestamp) -> Result<Amount, EngineError> {
        Ok(self.state.staking.pending_reward(staker, now)?)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Events recorded since deployment or the last [`Engine::drain_events`].
    pub fn events(&self) -> &[EventRecord] {
        &self.journal
    }

    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.journal)
    }

    // ── Token ───────────────────────────────────────────────────────────

    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        to: &Address,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.execute(ctx, "transfer", |s, ctx| {
            s.ledger.transfer(&ctx.caller, to, amount)?;
            Ok((
                (),
                vec![EngineEvent::Transfer {
                    from: ctx.caller,
                    to: *to,
                    amount,
                }],
            ))
        })
    }

    pub fn approve(
        &mut self,
        ctx: &CallContext,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.execute(ctx, "approve", |s, ctx| {
            s.ledger.approve(&ctx.caller, spender, amount)?;
            Ok(((), vec![approval(ctx.caller, *spender, amount)]))
        })
    }

    /// Returns the new allowance.
    pub fn increase_allowance(
        &mut self,
        ctx: &CallContext,
        spender: &Address,
        added: Amount,
    ) -> Result<Amount, EngineError> {
        self.execute(ctx, "increase_allowance", |s, ctx| {
            let updated = s.ledger.increase_allowance(&ctx.caller, spender, added)?;
            Ok((updated, vec![approval(ctx.caller, *spender, updated)]))
        })
    }

    /// Returns the new allowance.
    pub fn decrease_allowance(
        &mut self,
        ctx: &CallContext,
        spender: &Address,
        removed: Amount,
    ) -> Result<Amount, EngineError> {
        self.execute(ctx, "decrease_allowance", |s, ctx| {
            let updated = s.ledger.decrease_allowance(&ctx.caller, spender, removed)?;
            Ok((updated, vec![approval(ctx.caller, *spender, updated)]))
        })
    }

    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.execute(ctx, "transfer_from", |s, ctx| {
            s.ledger.transfer_from(&ctx.caller, from, to, amount)?;
            let remaining = s.ledger.allowance(from, &ctx.caller);
            Ok((
                (),
                vec![
                    EngineEvent::Transfer {
                        from: *from,
                        to: *to,
                        amount,
                    },
                    approval(*from, ctx.caller, remaining),
                ],
            ))
        })
    }

    pub fn mint(&mut self, ctx: &CallContext, to: &Address, amount: Amount) -> Result<(), EngineError> {
        self.execute(ctx, "mint", |s, ctx| {
            s.ledger.mint(&ctx.caller, to, amount)?;
            Ok((
                (),
                vec![EngineEvent::Mint {
                    minter: ctx.caller,
                    to: *to,
                    amount,
                }],
            ))
        })
    }

    pub fn burn(&mut self, ctx: &CallContext, amount: Amount) -> Result<(), EngineError> {
        self.execute(ctx, "burn", |s, ctx| {
            s.ledger.burn(&ctx.caller, amount)?;
            Ok((
                (),
                vec![EngineEvent::Burn {
                    from: ctx.caller,
                    amount,
                }],
            ))
        })
    }

    /// Returns whether the registry changed.
    pub fn set_minter(
        &mut self,
        ctx: &CallContext,
        minter: &Address,
        enabled: bool,
    ) -> Result<bool, EngineError> {
        self.set_permissions(ctx, minter, Permissions::MINT, enabled)
    }

    /// Returns whether the registry changed.
    pub fn set_permissions(
        &mut self,
        ctx: &CallContext,
        target: &Address,
        permissions: Permissions,
        enabled: bool,
    ) -> Result<bool, EngineError> {
        self.execute(ctx, "set_permissions", |s, ctx| {
            let changed = s
                .ledger
                .set_permissions(&ctx.caller, target, permissions, enabled)?;
            let events = if changed {
                tracing::info!(%target, ?permissions, enabled, "permissions updated");
                vec![EngineEvent::PermissionsUpdated {
                    target: *target,
                    bits: permissions.bits(),
                    enabled,
                }]
            } else {
                Vec::new()
            };
            Ok((changed, events))
        })
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: &Address,
    ) -> Result<(), EngineError> {
        self.execute(ctx, "transfer_ownership", |s, ctx| {
            s.ledger.transfer_ownership(&ctx.caller, new_owner)?;
            tracing::info!(previous = %ctx.caller, owner = %new_owner, "ownership transferred");
            Ok((
                (),
                vec![EngineEvent::OwnershipTransferred {
                    previous: ctx.caller,
                    owner: *new_owner,
                }],
            ))
        })
    }

    // ── Staking ─────────────────────────────────────────────────────────

    pub fn stake(&mut self, ctx: &CallContext, amount: Amount) -> Result<(), EngineError> {
        self.execute(ctx, "stake", |s, ctx| {
            s.staking
                .stake(&mut s.ledger, &ctx.caller, amount, ctx.now)?;
            Ok((
                (),
                vec![
                    EngineEvent::Transfer {
                        from: ctx.caller,
                        to: s.staking.custody(),
                        amount,
                    },
                    EngineEvent::Staked {
                        staker: ctx.caller,
                        amount,
                    },
                ],
            ))
        })
    }

    pub fn unstake(&mut self, ctx: &CallContext, amount: Amount) -> Result<UnstakeReceipt, EngineError> {
        self.execute(ctx, "unstake", |s, ctx| {
            let receipt = s
                .staking
                .unstake(&mut s.ledger, &ctx.caller, amount, ctx.now)?;
            Ok((
                receipt,
                vec![
                    EngineEvent::Transfer {
                        from: s.staking.custody(),
                        to: ctx.caller,
                        amount: receipt.total(),
                    },
                    EngineEvent::Unstaked {
                        staker: ctx.caller,
                        principal: receipt.principal,
                        reward: receipt.reward,
                    },
                ],
            ))
        })
    }

    /// Returns the reward paid.
    pub fn claim(&mut self, ctx: &CallContext) -> Result<Amount, EngineError> {
        self.execute(ctx, "claim", |s, ctx| {
            let paid = s.staking.claim(&mut s.ledger, &ctx.caller, ctx.now)?;
            let events = if paid.is_zero() {
                Vec::new()
            } else {
                vec![
                    EngineEvent::Transfer {
                        from: s.staking.custody(),
                        to: ctx.caller,
                        amount: paid,
                    },
                    EngineEvent::RewardClaimed {
                        staker: ctx.caller,
                        amount: paid,
                    },
                ]
            };
            Ok((paid, events))
        })
    }

    /// Returns the caller's claimable reward after the checkpoint.
    pub fn checkpoint(&mut self, ctx: &CallContext) -> Result<Amount, EngineError> {
        self.execute(ctx, "checkpoint", |s, ctx| {
            let claimable = s.staking.checkpoint(&ctx.caller, ctx.now)?;
            Ok((
                claimable,
                vec![EngineEvent::Checkpointed {
                    staker: ctx.caller,
                    claimable,
                }],
            ))
        })
    }

    pub fn fund_rewards(&mut self, ctx: &CallContext, amount: Amount) -> Result<(), EngineError> {
        self.execute(ctx, "fund_rewards", |s, ctx| {
            s.staking.fund_rewards(&mut s.ledger, &ctx.caller, amount)?;
            Ok((
                (),
                vec![
                    EngineEvent::Transfer {
                        from: ctx.caller,
                        to: s.staking.custody(),
                        amount,
                    },
                    EngineEvent::RewardsFunded {
                        funder: ctx.caller,
                        amount,
                    },
                ],
            ))
        })
    }

    pub fn set_reward_rate(&mut self, ctx: &CallContext, rate: u128) -> Result<(), EngineError> {
        self.execute(ctx, "set_reward_rate", |s, ctx| {
            s.staking
                .set_reward_rate(&s.ledger, &ctx.caller, rate, ctx.now)?;
            tracing::info!(rate, "reward rate changed");
            Ok(((), vec![EngineEvent::RewardRateChanged { rate }]))
        })
    }

    // ── Bridge ──────────────────────────────────────────────────────────

    /// Open an outbound transfer. Returns its id.
    pub fn bridge_lock(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
        destination_chain: u64,
        remote_recipient: [u8; 32],
    ) -> Result<TransferId, EngineError> {
        self.execute(ctx, "bridge_lock", |s, ctx| {
            let id = s.bridge.lock(
                &mut s.ledger,
                &ctx.caller,
                amount,
                destination_chain,
                remote_recipient,
                ctx.now,
            )?;
            let debit = match s.bridge.mode() {
                BridgeMode::LockRelease => EngineEvent::Transfer {
                    from: ctx.caller,
                    to: s.bridge.custody(),
                    amount,
                },
                BridgeMode::BurnMint => EngineEvent::Burn {
                    from: ctx.caller,
                    amount,
                },
            };
            Ok((
                id,
                vec![
                    debit,
                    EngineEvent::BridgeLocked {
                        id,
                        sender: ctx.caller,
                        amount,
                        destination_chain,
                    },
                ],
            ))
        })
    }

    pub fn bridge_confirm(&mut self, ctx: &CallContext, id: &TransferId) -> Result<(), EngineError> {
        self.execute(ctx, "bridge_confirm", |s, ctx| {
            s.bridge.confirm(&s.ledger, &ctx.caller, id, ctx.now)?;
            Ok(((), vec![EngineEvent::BridgeConfirmed { id: *id }]))
        })
    }

    pub fn bridge_register_inbound(
        &mut self,
        ctx: &CallContext,
        id: TransferId,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.execute(ctx, "bridge_register_inbound", |s, ctx| {
            s.bridge
                .register_inbound(&s.ledger, &ctx.caller, id, recipient, amount, ctx.now)?;
            Ok((
                (),
                vec![EngineEvent::BridgeInboundRegistered {
                    id,
                    recipient: *recipient,
                    amount,
                }],
            ))
        })
    }

    pub fn bridge_release(
        &mut self,
        ctx: &CallContext,
        id: TransferId,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.execute(ctx, "bridge_release", |s, ctx| {
            s.bridge
                .release(&mut s.ledger, &ctx.caller, id, recipient, amount, ctx.now)?;
            let credit = payout_event(&s.bridge, *recipient, amount);
            Ok((
                (),
                vec![
                    credit,
                    EngineEvent::BridgeReleased {
                        id,
                        recipient: *recipient,
                        amount,
                    },
                ],
            ))
        })
    }

    pub fn bridge_revert(&mut self, ctx: &CallContext, id: &TransferId) -> Result<(), EngineError> {
        self.execute(ctx, "bridge_revert", |s, ctx| {
            let refund = s
                .bridge
                .transfer(id)
                .filter(|t| t.direction.is_outbound())
                .map(|t| (t.sender, t.amount));
            s.bridge.revert(&mut s.ledger, &ctx.caller, id, ctx.now)?;

            let mut events = Vec::new();
            if let Some((sender, amount)) = refund {
                events.push(payout_event(&s.bridge, sender, amount));
            }
            events.push(EngineEvent::BridgeReverted { id: *id });
            Ok(((), events))
        })
    }

    pub fn set_bridge_operator(
        &mut self,
        ctx: &CallContext,
        operator: &Address,
    ) -> Result<(), EngineError> {
        self.execute(ctx, "set_bridge_operator", |s, ctx| {
            if operator.is_zero() {
                return Err(LedgerError::InvalidRecipient(*operator).into());
            }
            s.bridge.set_operator(&s.ledger, &ctx.caller, operator)?;
            tracing::info!(%operator, "bridge operator changed");
            Ok((
                (),
                vec![EngineEvent::OperatorChanged {
                    operator: *operator,
                }],
            ))
        })
    }

    // ── Halt control ────────────────────────────────────────────────────

    /// Clear a halt. Ledger owner only; refused while the supply invariant
    /// still fails.
    pub fn resume(&mut self, ctx: &CallContext) -> Result<(), EngineError> {
        if ctx.caller != self.state.ledger.owner() {
            return Err(LedgerError::Unauthorized { caller: ctx.caller }.into());
        }
        let Some(reason) = self.halted.take() else {
            return Ok(());
        };
        if let Err(err) = self.state.ledger.check_supply_invariant() {
            self.halted = Some(reason);
            return Err(EngineError::InvariantViolation(err.to_string()));
        }
        if let Some(store) = &self.store {
            let status = Status {
                halted: None,
                next_seq: self.next_seq + 1,
            };
            if let Err(err) = state::write_status(store.as_ref(), &status) {
                self.halted = Some(reason);
                return Err(err.into());
            }
        }
        tracing::info!(by = %ctx.caller, %reason, "engine resumed");
        self.record(ctx.now, EngineEvent::Resumed { by: ctx.caller });
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn execute<T>(
        &mut self,
        ctx: &CallContext,
        op: &'static str,
        call: impl FnOnce(&mut EngineState, &CallContext) -> CallResult<T>,
    ) -> Result<T, EngineError> {
        if let Some(reason) = &self.halted {
            return Err(EngineError::Halted {
                reason: reason.clone(),
            });
        }
        let before = self.store.as_ref().map(|_| self.state.clone());

        let (value, events) = match call(&mut self.state, ctx) {
            Ok(done) => done,
            Err(err) => {
                if err.is_fatal() {
                    self.halt(ctx.now, format!("{op}: {err}"));
                } else {
                    tracing::debug!(op, caller = %ctx.caller, error = %err, "call rejected");
                }
                return Err(err);
            }
        };

        if let Err(err) = self.state.ledger.check_supply_invariant() {
            let reason = format!("{op}: {err}");
            self.halt(ctx.now, reason.clone());
            return Err(EngineError::InvariantViolation(reason));
        }

        if let Some(store) = &self.store {
            let status = self.status(events.len());
            if let Err(err) = state::write_all(store.as_ref(), &self.state, &status) {
                tracing::warn!(op, error = %err, "commit failed, call rolled back");
                if let Some(before) = before {
                    self.state = before;
                }
                return Err(err.into());
            }
        }

        tracing::debug!(op, caller = %ctx.caller, "call committed");
        for event in events {
            self.record(ctx.now, event);
        }
        Ok(value)
    }

    fn halt(&mut self, now: Timestamp, reason: String) {
        tracing::error!(%reason, "engine halted");
        self.halted = Some(reason.clone());
        if let Some(store) = &self.store {
            if let Err(err) = state::write_status(store.as_ref(), &self.status(1)) {
                tracing::warn!(error = %err, "could not persist halt status");
            }
        }
        self.record(now, EngineEvent::Halted { reason });
    }

    /// Status as it will stand once `recording` more events are journaled.
    fn status(&self, recording: usize) -> Status {
        Status {
            halted: self.halted.clone(),
            next_seq: self.next_seq + recording as u64,
        }
    }

    fn record(&mut self, at: Timestamp, event: EngineEvent) {
        let record = EventRecord {
            seq: self.next_seq,
            at,
            event,
        };
        self.next_seq += 1;
        tracing::trace!(seq = record.seq, event = ?record.event, "event");
        self.bus.emit(&record);
        self.journal.push(record);
    }
}

fn approval(owner: Address, spender: Address, amount: Amount) -> EngineEvent {
    EngineEvent::Approval {
        owner,
        spender,
        amount,
    }
}

/// How a bridge payout shows up on the ledger.
fn payout_event(bridge: &Bridge, to: Address, amount: Amount) -> EngineEvent {
    match bridge.mode() {
        BridgeMode::LockRelease => EngineEvent::Transfer {
            from: bridge.custody(),
            to,
            amount,
        },
        BridgeMode::BurnMint => EngineEvent::Mint {
            minter: bridge.custody(),
            to,
            amount,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxd_nullables::NullStore;

    fn config() -> EngineConfig {
        EngineConfig {
            initial_supply: 1_000,
            decimals: 0,
            reward_rate: 0,
            initial_reward_reserve: 0,
            ..EngineConfig::default()
        }
    }

    fn ctx(caller: Address, at: u64) -> CallContext {
        CallContext::new(caller, Timestamp::new(at))
    }

    #[test]
    fn deploy_registers_bridge_custody_as_minter() {
        let cfg = config();
        let engine = Engine::deploy(&cfg, Timestamp::EPOCH).unwrap();
        assert!(engine.ledger().is_minter(&cfg.bridge_custody()));
        assert_eq!(engine.bridge().operator(), cfg.owner);
        assert_eq!(engine.total_supply(), Amount::new(1_000));
        assert_eq!(engine.events().len(), 2);
    }

    #[test]
    fn rejected_call_records_nothing() {
        let cfg = config();
        let mut engine = Engine::deploy(&cfg, Timestamp::EPOCH).unwrap();
        engine.drain_events();
        let stranger = Address::new([9; 20]);

        let err = engine
            .transfer(&ctx(stranger, 1), &cfg.owner, Amount::new(1))
            .unwrap_err();
        assert!(matches!(err, EngineError::Ledger(LedgerError::InsufficientBalance { .. })));
        assert!(engine.events().is_empty());
        assert!(!engine.is_halted());
    }

    #[test]
    fn successful_calls_number_events_in_order() {
        let cfg = config();
        let mut engine = Engine::deploy(&cfg, Timestamp::EPOCH).unwrap();
        let user = Address::new([3; 20]);
        engine
            .transfer(&ctx(cfg.owner, 5), &user, Amount::new(10))
            .unwrap();
        engine.burn(&ctx(user, 6), Amount::new(4)).unwrap();

        let seqs: Vec<u64> = engine.events().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(
            engine.events()[3].event,
            EngineEvent::Burn {
                from: user,
                amount: Amount::new(4)
            }
        );
        assert_eq!(engine.events()[3].at, Timestamp::new(6));
    }

    #[test]
    fn failed_commit_rolls_the_call_back() {
        let cfg = config();
        let store = Arc::new(NullStore::new());
        let mut engine = Engine::deploy(&cfg, Timestamp::EPOCH).unwrap();
        engine.attach_store(store.clone()).unwrap();
        let user = Address::new([3; 20]);

        store.fail_next_commit();
        let err = engine
            .transfer(&ctx(cfg.owner, 1), &user, Amount::new(10))
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
        assert_eq!(engine.balance_of(&user), Amount::ZERO);
        assert_eq!(engine.balance_of(&cfg.owner), Amount::new(1_000));

        engine
            .transfer(&ctx(cfg.owner, 2), &user, Amount::new(10))
            .unwrap();
        assert_eq!(engine.balance_of(&user), Amount::new(10));
    }

    #[test]
    fn event_numbering_continues_after_reload() {
        let cfg = config();
        let store = Arc::new(NullStore::new());
        let mut engine = Engine::deploy(&cfg, Timestamp::EPOCH).unwrap();
        engine.attach_store(store.clone()).unwrap();
        let user = Address::new([3; 20]);
        engine
            .transfer(&ctx(cfg.owner, 1), &user, Amount::new(10))
            .unwrap();
        assert_eq!(engine.events().last().map(|r| r.seq), Some(2));

        let mut reloaded = Engine::load(store).unwrap();
        assert!(reloaded.events().is_empty());
        reloaded
            .transfer(&ctx(user, 2), &cfg.owner, Amount::new(1))
            .unwrap();
        assert_eq!(reloaded.events()[0].seq, 3);
    }

    #[test]
    fn resume_requires_owner_and_is_noop_when_running() {
        let cfg = config();
        let mut engine = Engine::deploy(&cfg, Timestamp::EPOCH).unwrap();
        let stranger = Address::new([9; 20]);
        assert!(engine.resume(&ctx(stranger, 1)).is_err());
        assert!(engine.resume(&ctx(cfg.owner, 1)).is_ok());
    }

    #[test]
    fn set_operator_rejects_zero_address() {
        let cfg = config();
        let mut engine = Engine::deploy(&cfg, Timestamp::EPOCH).unwrap();
        let err = engine
            .set_bridge_operator(&ctx(cfg.owner, 1), &Address::ZERO)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Ledger(LedgerError::InvalidRecipient(_))
        ));
    }
}
