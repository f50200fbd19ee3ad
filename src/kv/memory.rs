//! In-memory store for tests
//!
//! Same contract as the log store, without durability. Batch failures can
//! be injected to exercise the all-or-nothing paths above the store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::errors::{StorageError, StorageResult};
use super::record::BatchOp;
use super::store::KeyValueStore;

/// Volatile ordered store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
    fail_batches: AtomicUsize,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` batches fail without applying anything.
    pub fn fail_next_batches(&self, count: usize) {
        self.fail_batches.store(count, Ordering::SeqCst);
    }

    /// Make every `get` fail until turned off again.
    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// Number of live keys.
    pub fn key_count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    fn check_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::closed());
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.check_open()?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::read_failed_no_source("injected read failure"));
        }
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::read_failed_no_source("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn batch(&self, ops: &[BatchOp]) -> StorageResult<()> {
        self.check_open()?;

        let injected = self
            .fail_batches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StorageError::write_failed_no_source("injected batch failure"));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::write_failed_no_source("memory store lock poisoned"))?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                BatchOp::Delete { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_open()?;
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::read_failed_no_source("memory store lock poisoned"))?;
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn close(&self) -> StorageResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
