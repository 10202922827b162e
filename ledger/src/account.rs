//! Per-address ledger record.

use nxd_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balance and outgoing allowances of one address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Amount,
    /// Remaining amount each spender may move out of this account.
    pub allowances: BTreeMap<Address, Amount>,
}

impl Account {
    pub fn allowance(&self, spender: &Address) -> Amount {
        self.allowances.get(spender).copied().unwrap_or(Amount::ZERO)
    }

    /// Store an allowance, dropping the entry when it reaches zero.
    pub(crate) fn set_allowance(&mut self, spender: Address, amount: Amount) {
        if amount.is_zero() {
            self.allowances.remove(&spender);
        } else {
            self.allowances.insert(spender, amount);
        }
    }

    /// An account with nothing in it can be pruned from the ledger.
    pub(crate) fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.allowances.is_empty()
    }
}
