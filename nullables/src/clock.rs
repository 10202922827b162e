//! Nullable block clock.

use nxd_types::{Address, CallContext, Timestamp};
use std::cell::Cell;

/// Block time under test control.
///
/// The host normally supplies block time with each call; tests drive it by
/// hand instead. `tick` moves one block forward at the configured interval.
pub struct NullClock {
    time: Cell<Timestamp>,
    height: Cell<u64>,
    block_secs: u64,
}

impl NullClock {
    pub fn new(start_secs: u64) -> Self {
        Self::with_block_time(start_secs, 12)
    }

    pub fn with_block_time(start_secs: u64, block_secs: u64) -> Self {
        Self {
            time: Cell::new(Timestamp::new(start_secs)),
            height: Cell::new(0),
            block_secs,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.time.get()
    }

    pub fn height(&self) -> u64 {
        self.height.get()
    }

    /// Jump `secs` seconds ahead without producing a block.
    pub fn advance(&self, secs: u64) {
        self.time.set(Timestamp::new(self.time.get().as_secs() + secs));
    }

    pub fn set(&self, secs: u64) {
        self.time.set(Timestamp::new(secs));
    }

    /// Produce the next block and return its time.
    pub fn tick(&self) -> Timestamp {
        self.advance(self.block_secs);
        self.height.set(self.height.get() + 1);
        self.now()
    }

    /// Call context for `caller` at the current block time.
    pub fn context(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.now())
    }
}
