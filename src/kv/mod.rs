//! Embedded key-value store
//!
//! An ordered, byte-keyed store with an atomic batch primitive. Posts,
//! indexes and subscriptions are all plain keys in here; the post layer
//! never touches files directly.
//!
//! # Design Principles
//!
//! - Batches are all-or-nothing
//! - Append-only log, checksum-verified on replay
//! - Absent key is `Ok(None)`, never an error
//! - One long-lived handle per process

mod checksum;
mod errors;
mod handle;
mod log_store;
mod memory;
mod reader;
mod record;
mod store;

pub use checksum::compute_checksum;
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use handle::{StoreHandle, WriterLock};
pub use log_store::LogStore;
pub use memory::MemoryStore;
pub use reader::LogReader;
pub use record::{BatchOp, BatchRecord};
pub use store::KeyValueStore;
