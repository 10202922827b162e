//! Capability table of privileged addresses.
//!
//! The registry itself holds no notion of ownership: [`crate::Ledger`] checks
//! the caller against its owner before mutating it.

use nxd_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Permission bits held by an address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions(u8);

impl Permissions {
    pub const NONE: Self = Self(0);
    /// May increase total supply through `mint`.
    pub const MINT: Self = Self(1 << 0);
    /// May drive the bridge's inbound side (register, release, confirm, revert)
    /// without being able to mint directly.
    pub const RELAY: Self = Self(1 << 1);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::MINT) {
            names.push("MINT");
        }
        if self.contains(Self::RELAY) {
            names.push("RELAY");
        }
        write!(f, "Permissions({})", names.join("|"))
    }
}

/// Address → permission bits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterRegistry {
    entries: BTreeMap<Address, Permissions>,
}

impl MinterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissions(&self, address: &Address) -> Permissions {
        self.entries.get(address).copied().unwrap_or(Permissions::NONE)
    }

    pub fn has(&self, address: &Address, permission: Permissions) -> bool {
        self.permissions(address).contains(permission)
    }

    pub fn is_minter(&self, address: &Address) -> bool {
        self.has(address, Permissions::MINT)
    }

    /// All addresses currently holding the mint capability, in address order.
    pub fn minters(&self) -> Vec<Address> {
        self.entries
            .iter()
            .filter(|(_, p)| p.contains(Permissions::MINT))
            .map(|(a, _)| *a)
            .collect()
    }

    /// Add `permissions` to `address`. Returns whether anything changed.
    pub(crate) fn grant(&mut self, address: Address, permissions: Permissions) -> bool {
        let current = self.permissions(&address);
        let updated = current.union(permissions);
        if updated == current {
            return false;
        }
        self.entries.insert(address, updated);
        true
    }

    /// Remove `permissions` from `address`. Returns whether anything changed.
    pub(crate) fn revoke(&mut self, address: Address, permissions: Permissions) -> bool {
        let current = self.permissions(&address);
        let updated = current.difference(permissions);
        if updated == current {
            return false;
        }
        if updated.is_empty() {
            self.entries.remove(&address);
        } else {
            self.entries.insert(address, updated);
        }
        true
    }
}
