//! Bridge engine.

use std::collections::BTreeMap;

use crate::error::BridgeError;
use crate::transfer::{BridgeTransfer, Direction, TransferStatus};
use nxd_ledger::{Ledger, Permissions};
use nxd_types::{Address, Amount, Timestamp, TransferId};
use serde::{Deserialize, Serialize};

/// How outbound value leaves and inbound value arrives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeMode {
    /// Outbound tokens are held in bridge custody; inbound tokens are paid
    /// out of it.
    #[default]
    LockRelease,
    /// Outbound tokens are burned; inbound tokens are minted. The custody
    /// address must hold the mint capability.
    BurnMint,
}

/// The bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    custody: Address,
    operator: Address,
    mode: BridgeMode,
    /// Largest amount a single `lock` may move. `None` = unlimited.
    max_lock_per_transfer: Option<Amount>,
    next_nonce: u64,
    transfers: BTreeMap<TransferId, BridgeTransfer>,
}

impl Bridge {
    pub fn new(custody: Address, operator: Address, mode: BridgeMode) -> Self {
        Self {
            custody,
            operator,
            mode,
            max_lock_per_transfer: None,
            next_nonce: 0,
            transfers: BTreeMap::new(),
        }
    }

    pub fn with_lock_limit(mut self, limit: Amount) -> Self {
        self.max_lock_per_transfer = Some(limit);
        self
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn custody(&self) -> Address {
        self.custody
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    pub fn mode(&self) -> BridgeMode {
        self.mode
    }

    pub fn lock_limit(&self) -> Option<Amount> {
        self.max_lock_per_transfer
    }

    pub fn transfer(&self, id: &TransferId) -> Option<&BridgeTransfer> {
        self.transfers.get(id)
    }

    pub fn transfers(&self) -> impl Iterator<Item = &BridgeTransfer> {
        self.transfers.values()
    }

    /// Sum of pending outbound amounts. In lock-release mode custody holds
    /// at least this much so every open lock can still be refunded.
    pub fn locked(&self) -> Amount {
        self.transfers
            .values()
            .filter(|t| t.status.is_pending() && t.direction.is_outbound())
            .fold(Amount::ZERO, |sum, t| sum.saturating_add(t.amount))
    }

    /// Custody balance free for inbound releases.
    pub fn releasable(&self, ledger: &Ledger) -> Amount {
        ledger.balance_of(&self.custody).saturating_sub(self.locked())
    }

    pub fn pending(&self) -> Vec<&BridgeTransfer> {
        self.transfers
            .values()
            .filter(|t| t.status.is_pending())
            .collect()
    }

    /// Whether `caller` may drive the relay side of the bridge.
    pub fn is_relay(&self, ledger: &Ledger, caller: &Address) -> bool {
        *caller == self.operator
            || ledger
                .registry()
                .permissions(caller)
                .intersects(Permissions::MINT.union(Permissions::RELAY))
    }

    // ── Outbound ────────────────────────────────────────────────────────

    /// Debit `amount` from `sender` and open a pending outbound transfer.
    pub fn lock(
        &mut self,
        ledger: &mut Ledger,
        sender: &Address,
        amount: Amount,
        destination_chain: u64,
        remote_recipient: [u8; 32],
        now: Timestamp,
    ) -> Result<TransferId, BridgeError> {
        if amount.is_zero() {
            return Err(BridgeError::ZeroAmount);
        }
        if let Some(limit) = self.max_lock_per_transfer {
            if amount > limit {
                return Err(BridgeError::LockLimitExceeded { amount, limit });
            }
        }
        if *sender == self.custody {
            return Err(BridgeError::Unauthorized { caller: *sender });
        }
        let (id, next_nonce) = self.next_outbound_id()?;

        match self.mode {
            BridgeMode::LockRelease => ledger.transfer(sender, &self.custody, amount)?,
            BridgeMode::BurnMint => ledger.burn(sender, amount)?,
        }

        self.next_nonce = next_nonce;
        self.transfers.insert(
            id,
            BridgeTransfer {
                id,
                sender: *sender,
                amount,
                direction: Direction::Outbound {
                    destination_chain,
                    remote_recipient,
                },
                status: TransferStatus::Pending,
                created_at: now,
                resolved_at: None,
            },
        );
        Ok(id)
    }

    /// The counterpart chain has delivered an outbound transfer.
    pub fn confirm(
        &mut self,
        ledger: &Ledger,
        caller: &Address,
        id: &TransferId,
        now: Timestamp,
    ) -> Result<(), BridgeError> {
        self.authorize(ledger, caller)?;
        let transfer = self.pending_mut(id)?;
        if !transfer.direction.is_outbound() {
            return Err(BridgeError::DirectionMismatch(*id));
        }
        transfer.resolve(TransferStatus::Completed, now);
        Ok(())
    }

    // ── Inbound ─────────────────────────────────────────────────────────

    /// Record a counterpart event as pending before it is released.
    pub fn register_inbound(
        &mut self,
        ledger: &Ledger,
        caller: &Address,
        id: TransferId,
        recipient: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), BridgeError> {
        self.authorize(ledger, caller)?;
        self.check_inbound(recipient, amount)?;
        if self.transfers.contains_key(&id) {
            return Err(BridgeError::DuplicateTransfer(id));
        }
        self.transfers
            .insert(id, inbound_record(id, caller, recipient, amount, now));
        Ok(())
    }

    /// Credit `recipient` for the counterpart event `id`.
    ///
    /// A previously registered transfer must match `recipient` and `amount`;
    /// an unknown id is recorded and completed in the same call.
    pub fn release(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        id: TransferId,
        recipient: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), BridgeError> {
        self.authorize(ledger, caller)?;
        self.check_inbound(recipient, amount)?;
        if let Some(existing) = self.transfers.get(&id) {
            if !existing.status.is_pending() {
                return Err(BridgeError::AlreadyCompleted(id));
            }
            match &existing.direction {
                Direction::Outbound { .. } => return Err(BridgeError::DirectionMismatch(id)),
                Direction::Inbound { recipient: registered } => {
                    if registered != recipient || existing.amount != amount {
                        return Err(BridgeError::TransferMismatch(id));
                    }
                }
            }
        }

        if self.mode == BridgeMode::LockRelease {
            let available = self.releasable(ledger);
            if amount > available {
                return Err(nxd_ledger::LedgerError::InsufficientBalance {
                    needed: amount,
                    available,
                }
                .into());
            }
        }
        self.pay_out(ledger, recipient, amount)?;

        let record = self
            .transfers
            .entry(id)
            .or_insert_with(|| inbound_record(id, caller, recipient, amount, now));
        record.resolve(TransferStatus::Completed, now);
        Ok(())
    }

    // ── Either direction ────────────────────────────────────────────────

    /// Abandon a pending transfer. Outbound funds go back to the sender.
    ///
    /// Callable by the ledger owner, the operator, or a minter/relay.
    pub fn revert(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        id: &TransferId,
        now: Timestamp,
    ) -> Result<(), BridgeError> {
        if *caller != ledger.owner() {
            self.authorize(ledger, caller)?;
        }
        let transfer = self.pending_mut(id)?;
        let refund = transfer
            .direction
            .is_outbound()
            .then(|| (transfer.sender, transfer.amount));

        if let Some((sender, amount)) = refund {
            self.pay_out(ledger, &sender, amount)?;
        }

        if let Some(transfer) = self.transfers.get_mut(id) {
            transfer.resolve(TransferStatus::Reverted, now);
        }
        Ok(())
    }

    // ── Administration ──────────────────────────────────────────────────

    /// Replace the operator. Ledger owner only.
    pub fn set_operator(
        &mut self,
        ledger: &Ledger,
        caller: &Address,
        operator: &Address,
    ) -> Result<(), BridgeError> {
        if *caller != ledger.owner() {
            return Err(BridgeError::Unauthorized { caller: *caller });
        }
        self.operator = *operator;
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn authorize(&self, ledger: &Ledger, caller: &Address) -> Result<(), BridgeError> {
        if !self.is_relay(ledger, caller) {
            return Err(BridgeError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn check_inbound(&self, recipient: &Address, amount: Amount) -> Result<(), BridgeError> {
        if amount.is_zero() {
            return Err(BridgeError::ZeroAmount);
        }
        if recipient.is_zero() || *recipient == self.custody {
            return Err(nxd_ledger::LedgerError::InvalidRecipient(*recipient).into());
        }
        Ok(())
    }

    fn pending_mut(&mut self, id: &TransferId) -> Result<&mut BridgeTransfer, BridgeError> {
        let transfer = self
            .transfers
            .get_mut(id)
            .ok_or(BridgeError::UnknownTransfer(*id))?;
        if !transfer.status.is_pending() {
            return Err(BridgeError::AlreadyCompleted(*id));
        }
        Ok(transfer)
    }

    /// First unused outbound id from `next_nonce` on, and the nonce after it.
    /// Nonces whose id a relay already registered as inbound are skipped.
    fn next_outbound_id(&self) -> Result<(TransferId, u64), BridgeError> {
        let mut nonce = self.next_nonce;
        loop {
            let id = TransferId::outbound(&self.custody, nonce);
            let next = nonce.checked_add(1).ok_or(BridgeError::Overflow)?;
            if !self.transfers.contains_key(&id) {
                return Ok((id, next));
            }
            nonce = next;
        }
    }

    /// Move `amount` from the bridge to `to`, by mode.
    fn pay_out(&self, ledger: &mut Ledger, to: &Address, amount: Amount) -> Result<(), BridgeError> {
        match self.mode {
            BridgeMode::LockRelease => ledger.transfer(&self.custody, to, amount)?,
            BridgeMode::BurnMint => ledger.mint(&self.custody, to, amount)?,
        }
        Ok(())
    }
}

fn inbound_record(
    id: TransferId,
    relay: &Address,
    recipient: &Address,
    amount: Amount,
    now: Timestamp,
) -> BridgeTransfer {
    BridgeTransfer {
        id,
        sender: *relay,
        amount,
        direction: Direction::Inbound {
            recipient: *recipient,
        },
        status: TransferStatus::Pending,
        created_at: now,
        resolved_at: None,
    }
}
