//! Test doubles for what the host provides to the engine.
//!
//! [`NullClock`] stands in for block time and [`NullStore`] for the host's
//! key-value state. Both are deterministic, in-memory and scriptable, so
//! engine tests can replay exact block sequences and inject commit failures.

pub mod clock;
pub mod store;

pub use clock::NullClock;
pub use store::NullStore;
