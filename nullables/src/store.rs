//! In-memory state store for tests.

use nxd_store::{StateStore, StoreError, WriteBatch, WriteOp};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory state store.
///
/// Commits apply under one lock, so readers see either none or all of a batch.
/// [`NullStore::fail_next_commit`] makes the next commit fail without applying
/// anything, for exercising error paths.
pub struct NullStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    fail_next: Mutex<bool>,
    commits: Mutex<u64>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            fail_next: Mutex::new(false),
            commits: Mutex::new(0),
        }
    }

    /// Make the next `commit` return a backend error.
    pub fn fail_next_commit(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        *self.commits.lock().unwrap()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for NullStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        {
            let mut fail = self.fail_next.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(StoreError::Backend("injected commit failure".into()));
            }
        }
        let mut entries = self.entries.lock().unwrap();
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        *self.commits.lock().unwrap() += 1;
        Ok(())
    }
}
