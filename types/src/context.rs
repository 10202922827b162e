//! Per-call context supplied by the host execution environment.

use crate::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// Who is calling and at what block time.
///
/// The host has already verified the caller's signature; the engine treats
/// `caller` as authenticated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }
}
