//! Host-facing façade over ledger, staking pool and bridge.
//!
//! The host hands every call a [`CallContext`](nxd_types::CallContext)
//! (authenticated caller plus block time). The engine routes it to the right
//! component, keeps the supply invariant under watch, commits state to the
//! host's [`StateStore`](nxd_store::StateStore) and journals events.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod state;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, ErrorKind};
pub use event::{EngineEvent, EventBus, EventRecord};
pub use state::EngineState;
