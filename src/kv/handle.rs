//! Shared store handle
//!
//! One handle is opened per process and cloned into every component. Store
//! calls run on the blocking pool, so async callers never stall a worker
//! while the log fsyncs. The handle also owns the per-namespace writer
//! locks that serialize read-modify-write sequences.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::errors::{StorageError, StorageResult};
use super::log_store::LogStore;
use super::memory::MemoryStore;
use super::record::BatchOp;
use super::store::KeyValueStore;

/// Writer lock for one namespace
pub type WriterLock = Arc<tokio::sync::Mutex<()>>;

/// Cloneable handle to one opened store.
#[derive(Clone, Debug)]
pub struct StoreHandle {
    store: Arc<dyn KeyValueStore>,
    writers: Arc<Mutex<HashMap<String, WriterLock>>>,
}

impl StoreHandle {
    /// Wrap an already opened store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            writers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Open (or create) the durable log store under `data_dir`
    pub fn open_log(data_dir: &Path) -> StorageResult<Self> {
        Ok(Self::new(Arc::new(LogStore::open(data_dir)?)))
    }

    /// Volatile store, mostly for tests and dry runs
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// The writer lock for `namespace`. Every caller asking for the same
    /// namespace on this handle (or its clones) gets the same lock.
    pub fn writer_lock(&self, namespace: &str) -> WriterLock {
        let mut writers = self.writers.lock().unwrap_or_else(|p| p.into_inner());
        writers
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub async fn get(&self, key: Vec<u8>) -> StorageResult<Option<Vec<u8>>> {
        let store = Arc::clone(&self.store);
        run_blocking(move || store.get(&key)).await
    }

    /// Commit `ops` as one atomic batch
    pub async fn batch(&self, ops: Vec<BatchOp>) -> StorageResult<()> {
        let store = Arc::clone(&self.store);
        run_blocking(move || store.batch(&ops)).await
    }

    pub async fn scan_prefix(&self, prefix: Vec<u8>) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let store = Arc::clone(&self.store);
        run_blocking(move || store.scan_prefix(&prefix)).await
    }

    /// Close the store. Clones of this handle fail afterwards.
    pub async fn close(&self) -> StorageResult<()> {
        let store = Arc::clone(&self.store);
        run_blocking(move || store.close()).await
    }
}

async fn run_blocking<T, F>(f: F) -> StorageResult<T>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::read_failed_no_source(format!("store task failed: {}", e)))?
}
