//! Block time.
//!
//! The host reports the block time of every call as Unix seconds. Reward
//! accrual and bridge records read it from the [`CallContext`](crate::CallContext);
//! nothing in the engine consults a wall clock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Block time in Unix seconds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whole seconds from `self` to `now`. Zero when the host reports a block
    /// time earlier than `self`, so accrual never runs backwards.
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    pub fn checked_add_secs(self, secs: u64) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates_on_earlier_block_time() {
        let since = Timestamp::new(100);
        assert_eq!(since.elapsed_since(Timestamp::new(160)), 60);
        assert_eq!(since.elapsed_since(Timestamp::new(40)), 0);
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(Timestamp::new(1).checked_add_secs(2), Some(Timestamp::new(3)));
        assert_eq!(Timestamp::new(u64::MAX).checked_add_secs(1), None);
    }
}
