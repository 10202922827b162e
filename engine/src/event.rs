//! Events recorded for every successful engine call.

use nxd_types::{Address, Amount, Timestamp, TransferId};
use serde::Serialize;

/// State changes observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    Mint {
        minter: Address,
        to: Address,
        amount: Amount,
    },
    Burn {
        from: Address,
        amount: Amount,
    },
    PermissionsUpdated {
        target: Address,
        bits: u8,
        enabled: bool,
    },
    OwnershipTransferred {
        previous: Address,
        owner: Address,
    },
    Staked {
        staker: Address,
        amount: Amount,
    },
    Unstaked {
        staker: Address,
        principal: Amount,
        reward: Amount,
    },
    RewardClaimed {
        staker: Address,
        amount: Amount,
    },
    Checkpointed {
        staker: Address,
        claimable: Amount,
    },
    RewardsFunded {
        funder: Address,
        amount: Amount,
    },
    RewardRateChanged {
        rate: u128,
    },
    BridgeLocked {
        id: TransferId,
        sender: Address,
        amount: Amount,
        destination_chain: u64,
    },
    BridgeConfirmed {
        id: TransferId,
    },
    BridgeInboundRegistered {
        id: TransferId,
        recipient: Address,
        amount: Amount,
    },
    BridgeReleased {
        id: TransferId,
        recipient: Address,
        amount: Amount,
    },
    BridgeReverted {
        id: TransferId,
    },
    OperatorChanged {
        operator: Address,
    },
    Halted {
        reason: String,
    },
    Resumed {
        by: Address,
    },
}

/// One journal entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub seq: u64,
    pub at: Timestamp,
    #[serde(flatten)]
    pub event: EngineEvent,
}

/// Synchronous fan-out event bus.
///
/// Listeners run inline on the calling thread after the call has committed.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&EventRecord) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&EventRecord) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, record: &EventRecord) {
        for listener in &self.listeners {
            listener(record);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
