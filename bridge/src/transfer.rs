//! Bridge transfer records.

use nxd_types::{Address, Amount, Timestamp, TransferId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one transfer. `Pending` is left exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Pending,
    Completed,
    Reverted,
}

impl TransferStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Reverted => "reverted",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way the tokens move, with the route details for that direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Leaving this chain. The recipient lives on the counterpart chain and is
    /// opaque to the engine.
    Outbound {
        destination_chain: u64,
        remote_recipient: [u8; 32],
    },
    /// Arriving from the counterpart chain.
    Inbound { recipient: Address },
}

impl Direction {
    pub fn is_outbound(&self) -> bool {
        matches!(self, Self::Outbound { .. })
    }
}

/// One cross-chain move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTransfer {
    pub id: TransferId,
    /// Outbound: the local account that was debited.
    /// Inbound: the relay that reported the counterpart event.
    pub sender: Address,
    pub amount: Amount,
    pub direction: Direction,
    pub status: TransferStatus,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

impl BridgeTransfer {
    pub(crate) fn resolve(&mut self, status: TransferStatus, at: Timestamp) {
        self.status = status;
        self.resolved_at = Some(at);
    }
}
