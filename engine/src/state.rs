//! Engine state and its layout in the host store.
//!
//! Each component is a separate bincode value under its own key, written in
//! one batch so the store never holds a ledger from one call next to a pool
//! from another.

use nxd_bridge::Bridge;
use nxd_ledger::Ledger;
use nxd_staking::StakingPool;
use nxd_store::{StateStore, StoreError, WriteBatch};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub const LEDGER_KEY: &[u8] = b"nxd/ledger";
pub const STAKING_KEY: &[u8] = b"nxd/staking";
pub const BRIDGE_KEY: &[u8] = b"nxd/bridge";
pub const STATUS_KEY: &[u8] = b"nxd/status";

/// Every component the engine drives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub ledger: Ledger,
    pub staking: StakingPool,
    pub bridge: Bridge,
}

/// Run status kept next to the component state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Status {
    pub halted: Option<String>,
    /// Sequence number of the next journaled event.
    pub next_seq: u64,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| {
        StoreError::Corruption(format!("{}: {e}", String::from_utf8_lossy(key)))
    })
}

pub(crate) fn write_all(
    store: &dyn StateStore,
    state: &EngineState,
    status: &Status,
) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    batch.put(LEDGER_KEY, encode(&state.ledger)?);
    batch.put(STAKING_KEY, encode(&state.staking)?);
    batch.put(BRIDGE_KEY, encode(&state.bridge)?);
    batch.put(STATUS_KEY, encode(status)?);
    store.commit(batch)
}

pub(crate) fn write_status(store: &dyn StateStore, status: &Status) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    batch.put(STATUS_KEY, encode(status)?);
    store.commit(batch)
}

/// Read back what [`write_all`] stored. `None` if nothing was ever written.
pub(crate) fn read_all(store: &dyn StateStore) -> Result<Option<(EngineState, Status)>, StoreError> {
    let Some(ledger) = store.get(LEDGER_KEY)? else {
        return Ok(None);
    };
    let ledger: Ledger = decode(LEDGER_KEY, &ledger)?;
    let staking: StakingPool = decode(STAKING_KEY, &required(store, STAKING_KEY)?)?;
    let bridge: Bridge = decode(BRIDGE_KEY, &required(store, BRIDGE_KEY)?)?;
    let status = match store.get(STATUS_KEY)? {
        Some(bytes) => decode(STATUS_KEY, &bytes)?,
        None => Status::default(),
    };
    Ok(Some((
        EngineState {
            ledger,
            staking,
            bridge,
        },
        status,
    )))
}

fn required(store: &dyn StateStore, key: &[u8]) -> Result<Vec<u8>, StoreError> {
    store.get(key)?.ok_or_else(|| {
        StoreError::Corruption(format!("{} missing", String::from_utf8_lossy(key)))
    })
}
