//! Abstract state store for the NXD engine.
//!
//! The host chain owns persistence. It hands the engine a key-value store with
//! atomic-commit-per-transaction semantics; the engine stages its writes in a
//! [`WriteBatch`] and commits the batch once a call has fully succeeded.
//! Nothing from a failed call is ever staged.

pub mod batch;
pub mod error;

pub use batch::{WriteBatch, WriteOp};
pub use error::StoreError;

/// Key-value store provided by the host.
pub trait StateStore {
    /// Read the committed value under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Apply every operation in `batch`, or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.get(key).map(|v| v.is_some())
    }
}
