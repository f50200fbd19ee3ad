//! The ordered key-value store seam
//!
//! Everything above this trait sees only byte keys, byte values and atomic
//! batches. Implementations decide durability and on-disk layout.

use std::fmt;

use super::errors::StorageResult;
use super::record::BatchOp;

/// Ordered, byte-keyed store with an all-or-nothing batch primitive.
///
/// `get` returns `Ok(None)` for an absent key; `Err` is reserved for real
/// store failures so callers can tell "not found" from "could not read".
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read one key
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Apply every operation or none of them
    fn batch(&self, ops: &[BatchOp]) -> StorageResult<()>;

    /// All entries whose key starts with `prefix`, in ascending key order
    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Flush and release the underlying resources. Later calls fail.
    fn close(&self) -> StorageResult<()>;

    /// Write one key
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.batch(&[BatchOp::put(key, value)])
    }

    /// Remove one key
    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.batch(&[BatchOp::delete(key)])
    }
}
