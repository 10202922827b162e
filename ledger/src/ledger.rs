//! Core ledger state and operations.

use std::collections::BTreeMap;

use crate::account::Account;
use crate::error::LedgerError;
use crate::registry::{MinterRegistry, Permissions};
use nxd_types::{Address, Amount, DEFAULT_DECIMALS};
use serde::{Deserialize, Serialize};

/// Immutable token metadata fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "Quantum Zero-Chain Token".to_string(),
            symbol: "NXD".to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// The token ledger.
///
/// Every mutating operation validates all of its preconditions before touching
/// state, so a call that returns `Err` leaves the ledger exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    metadata: TokenMetadata,
    owner: Address,
    total_supply: Amount,
    accounts: BTreeMap<Address, Account>,
    registry: MinterRegistry,
}

impl Ledger {
    /// Deploy a ledger and credit `initial_supply` whole tokens, scaled by
    /// `10^decimals`, to `owner`.
    pub fn new(
        owner: Address,
        metadata: TokenMetadata,
        initial_supply: u128,
    ) -> Result<Self, LedgerError> {
        if owner.is_zero() {
            return Err(LedgerError::InvalidRecipient(owner));
        }
        let supply =
            Amount::from_tokens(initial_supply, metadata.decimals).ok_or(LedgerError::Overflow)?;
        let mut accounts = BTreeMap::new();
        if !supply.is_zero() {
            accounts.insert(
                owner,
                Account {
                    balance: supply,
                    ..Account::default()
                },
            );
        }
        Ok(Self {
            metadata,
            owner,
            total_supply: supply,
            accounts,
            registry: MinterRegistry::new(),
        })
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.accounts
            .get(address)
            .map(|a| a.balance)
            .unwrap_or(Amount::ZERO)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.accounts
            .get(owner)
            .map(|a| a.allowance(spender))
            .unwrap_or(Amount::ZERO)
    }

    /// Addresses with a non-zero balance, in address order.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.accounts
            .iter()
            .filter(|(_, a)| !a.balance.is_zero())
            .map(|(addr, a)| (addr, a.balance))
    }

    pub fn registry(&self) -> &MinterRegistry {
        &self.registry
    }

    pub fn is_minter(&self, address: &Address) -> bool {
        self.registry.is_minter(address)
    }

    /// Owner or registered minter.
    pub fn can_mint(&self, address: &Address) -> bool {
        *address == self.owner || self.registry.is_minter(address)
    }

    /// Recompute Σ balances and compare it with the recorded total supply.
    pub fn check_supply_invariant(&self) -> Result<(), LedgerError> {
        let mut sum = Amount::ZERO;
        for account in self.accounts.values() {
            sum = sum.checked_add(account.balance).ok_or(LedgerError::Overflow)?;
        }
        if sum != self.total_supply {
            return Err(LedgerError::SupplyMismatch {
                total_supply: self.total_supply,
                sum,
            });
        }
        Ok(())
    }

    // ── Transfers and allowances ────────────────────────────────────────

    /// Move `amount` from `from` to `to`.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.check_transfer(from, to, amount)?;
        self.move_balance(from, to, amount);
        Ok(())
    }

    /// Overwrite the allowance `spender` may draw from `owner`.
    pub fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidRecipient(*spender));
        }
        self.accounts
            .entry(*owner)
            .or_default()
            .set_allowance(*spender, amount);
        self.prune(owner);
        Ok(())
    }

    /// Raise an allowance by `added`, returning the new value.
    pub fn increase_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        added: Amount,
    ) -> Result<Amount, LedgerError> {
        let updated = self
            .allowance(owner, spender)
            .checked_add(added)
            .ok_or(LedgerError::Overflow)?;
        self.approve(owner, spender, updated)?;
        Ok(updated)
    }

    /// Lower an allowance by `removed`, flooring at zero. Returns the new value.
    pub fn decrease_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        removed: Amount,
    ) -> Result<Amount, LedgerError> {
        let updated = self.allowance(owner, spender).saturating_sub(removed);
        self.approve(owner, spender, updated)?;
        Ok(updated)
    }

    /// `spender` moves `amount` out of `from` against its allowance.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(from, spender);
        if amount > allowed {
            return Err(LedgerError::InsufficientAllowance {
                needed: amount,
                available: allowed,
            });
        }
        self.check_transfer(from, to, amount)?;
        self.move_balance(from, to, amount);
        if let Some(account) = self.accounts.get_mut(from) {
            account.set_allowance(*spender, allowed - amount);
        }
        self.prune(from);
        Ok(())
    }

    // ── Supply ──────────────────────────────────────────────────────────

    /// Create `amount` new tokens for `to`. Caller must be owner or minter.
    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if !self.can_mint(caller) {
            return Err(LedgerError::Unauthorized { caller: *caller });
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient(*to));
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        // A balance is bounded by the supply, so this cannot fail once the
        // supply addition succeeded.
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.total_supply = supply;
        self.accounts.entry(*to).or_default().balance = balance;
        self.prune(to);
        Ok(())
    }

    /// Destroy `amount` of the caller's own tokens.
    pub fn burn(&mut self, caller: &Address, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(caller);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        self.total_supply = supply;
        if let Some(account) = self.accounts.get_mut(caller) {
            account.balance = available - amount;
        }
        self.prune(caller);
        Ok(())
    }

    // ── Administration ──────────────────────────────────────────────────

    /// Enable or disable `minter`. Owner only; setting the current value is a no-op.
    /// Returns whether the registry changed.
    pub fn set_minter(
        &mut self,
        caller: &Address,
        minter: &Address,
        enabled: bool,
    ) -> Result<bool, LedgerError> {
        self.set_permissions(caller, minter, Permissions::MINT, enabled)
    }

    /// Grant or revoke arbitrary capability bits. Owner only.
    pub fn set_permissions(
        &mut self,
        caller: &Address,
        target: &Address,
        permissions: Permissions,
        enabled: bool,
    ) -> Result<bool, LedgerError> {
        self.only_owner(caller)?;
        if target.is_zero() {
            return Err(LedgerError::InvalidRecipient(*target));
        }
        let changed = if enabled {
            self.registry.grant(*target, permissions)
        } else {
            self.registry.revoke(*target, permissions)
        };
        Ok(changed)
    }

    /// Hand administrative control to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: &Address,
    ) -> Result<(), LedgerError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(LedgerError::InvalidRecipient(*new_owner));
        }
        self.owner = *new_owner;
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn only_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if *caller != self.owner {
            return Err(LedgerError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn check_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient(*to));
        }
        let available = self.balance_of(from);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from != to {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
        }
        Ok(())
    }

    /// Apply a transfer already validated by `check_transfer`.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) {
        if from == to || amount.is_zero() {
            return;
        }
        if let Some(account) = self.accounts.get_mut(from) {
            account.balance = account.balance - amount;
        }
        let recipient = self.accounts.entry(*to).or_default();
        recipient.balance = recipient.balance + amount;
        self.prune(from);
    }

    fn prune(&mut self, address: &Address) {
        if self.accounts.get(address).is_some_and(Account::is_empty) {
            self.accounts.remove(address);
        }
    }
}
