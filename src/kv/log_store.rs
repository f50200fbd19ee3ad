//! Append-only log store
//!
//! Each atomic batch is appended to `<data_dir>/store.log` as one
//! checksummed record and fsynced before it becomes visible. The ordered
//! key space lives in memory and is rebuilt by replaying the log on open.
//!
//! # Atomicity
//!
//! - A batch is visible only after its record is fully written and synced
//! - A failed append truncates the partial record and changes nothing
//! - A torn final record found on open never committed; it is cut off

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::errors::{StorageError, StorageResult};
use super::reader::LogReader;
use super::record::{BatchOp, BatchRecord};
use super::store::KeyValueStore;
use crate::observability::{log_event_with_fields, Event};

const LOG_FILE_NAME: &str = "store.log";

#[derive(Debug)]
struct LogState {
    /// `None` once the store is closed
    file: Option<File>,
    /// Length of the committed log
    offset: u64,
    /// A partial record could not be cut off; the file no longer ends at
    /// `offset`, so nothing more may be appended
    rollback_failed: bool,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// Durable store backed by a single append-only batch log.
#[derive(Debug)]
pub struct LogStore {
    log_path: PathBuf,
    state: Mutex<LogState>,
}

impl LogStore {
    /// Opens or creates the log under `data_dir` and replays it.
    ///
    /// # Errors
    ///
    /// Returns `PL_DATA_CORRUPTION` if a complete record fails its checksum,
    /// and `PL_STORAGE_WRITE_FAILED` if the directory or file cannot be
    /// created.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        if !data_dir.exists() {
            fs::create_dir_all(data_dir).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create data directory: {}", data_dir.display()),
                    e,
                )
            })?;
        }

        let log_path = data_dir.join(LOG_FILE_NAME);
        let (entries, offset, records) = Self::replay(&log_path)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open log: {}", log_path.display()),
                    e,
                )
            })?;

        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("path", &log_path.display().to_string()),
                ("batches", &records.to_string()),
                ("keys", &entries.len().to_string()),
            ],
        );

        Ok(Self {
            log_path,
            state: Mutex::new(LogState {
                file: Some(file),
                offset,
                rollback_failed: false,
                entries,
            }),
        })
    }

    /// Rebuilds the key space from the log, cutting off a torn tail.
    fn replay(log_path: &Path) -> StorageResult<(BTreeMap<Vec<u8>, Vec<u8>>, u64, usize)> {
        let mut entries = BTreeMap::new();

        let len = match fs::metadata(log_path) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((entries, 0, 0)),
            Err(e) => return Err(StorageError::read_failed("Failed to read log metadata", e)),
        };
        if len == 0 {
            return Ok((entries, 0, 0));
        }

        let mut reader = LogReader::open(log_path)?;
        let mut records = 0;
        while let Some(record) = reader.read_next()? {
            apply_ops(&mut entries, &record.ops);
            records += 1;
        }

        let valid_len = reader.current_offset();
        if reader.hit_torn_tail() {
            let discarded = reader.trailing_bytes();
            let file = OpenOptions::new().write(true).open(log_path).map_err(|e| {
                StorageError::write_failed("Failed to open log for tail truncation", e)
            })?;
            file.set_len(valid_len)
                .and_then(|_| file.sync_all())
                .map_err(|e| StorageError::write_failed("Failed to truncate torn tail", e))?;

            log_event_with_fields(
                Event::StoreTornTailDiscarded,
                &[
                    ("discarded_bytes", &discarded.to_string()),
                    ("offset", &valid_len.to_string()),
                ],
            );
        }

        Ok((entries, valid_len, records))
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Number of live keys.
    pub fn key_count(&self) -> StorageResult<usize> {
        Ok(self.lock()?.entries.len())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, LogState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::read_failed_no_source("log store lock poisoned"))
    }
}

fn apply_ops(entries: &mut BTreeMap<Vec<u8>, Vec<u8>>, ops: &[BatchOp]) {
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
}

impl KeyValueStore for LogStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let state = self.lock()?;
        if state.file.is_none() {
            return Err(StorageError::closed());
        }
        Ok(state.entries.get(key).cloned())
    }

    fn batch(&self, ops: &[BatchOp]) -> StorageResult<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut state = self.lock()?;
        let committed = state.offset;
        let serialized = BatchRecord::new(ops.to_vec()).serialize();

        if state.file.is_some() && state.rollback_failed {
            return Err(StorageError::write_failed_no_source(format!(
                "Log {} holds an unremovable partial record past offset {}; reopen the store",
                self.log_path.display(),
                committed
            )));
        }
        let file = state.file.as_mut().ok_or_else(StorageError::closed)?;

        let written = file
            .write_all(&serialized)
            .map_err(|e| StorageError::write_failed("Failed to append batch", e))
            .and_then(|_| {
                file.sync_data()
                    .map_err(|e| StorageError::write_failed("fsync failed after batch append", e))
            });

        if let Err(e) = written {
            // Cut the partial record so the next append starts on a boundary.
            if let Err(rollback) = file.set_len(committed) {
                state.rollback_failed = true;
                log_event_with_fields(
                    Event::StoreRollbackFailed,
                    &[
                        ("path", &self.log_path.display().to_string()),
                        ("offset", &committed.to_string()),
                        ("error", &rollback.to_string()),
                    ],
                );
            }
            return Err(e);
        }

        state.offset = committed + serialized.len() as u64;
        apply_ops(&mut state.entries, ops);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let state = self.lock()?;
        if state.file.is_none() {
            return Err(StorageError::closed());
        }
        Ok(state
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn close(&self) -> StorageResult<()> {
        let mut state = self.lock()?;
        if let Some(file) = state.file.take() {
            file.sync_all()
                .map_err(|e| StorageError::io_error("Failed to sync log on close", e))?;
            log_event_with_fields(
                Event::StoreClosed,
                &[("path", &self.log_path.display().to_string())],
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::errors::StorageErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory_and_log() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");

        let store = LogStore::open(&data_dir).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.key_count().unwrap(), 0);
    }

    #[test]
    fn test_batch_then_get() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path()).unwrap();

        store
            .batch(&[BatchOp::put("a", "1"), BatchOp::put("b", "2"), BatchOp::delete("a")])
            .unwrap();

        assert_eq!(store.get(b"a").unwrap(), None);
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_reopen_restores_state() {
        let dir = TempDir::new().unwrap();
        {
            let store = LogStore::open(dir.path()).unwrap();
            store.put(b"alice!ids", b"2").unwrap();
            store.put(b"alice!post!1", b"{}").unwrap();
            store.delete(b"alice!post!1").unwrap();
            store.close().unwrap();
        }

        let store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"alice!ids").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"alice!post!1").unwrap(), None);
        assert_eq!(store.key_count().unwrap(), 1);
    }

    #[test]
    fn test_failed_rollback_blocks_later_batches() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path()).unwrap();
        store.put(b"a", b"1").unwrap();

        let log_path = dir.path().join(LOG_FILE_NAME);
        let committed_len = fs::metadata(&log_path).unwrap().len();

        // A read-only handle fails both the append and the truncate
        store.lock().unwrap().file = Some(File::open(&log_path).unwrap());
        assert!(store.put(b"b", b"2").is_err());

        // A working handle does not re-enable appends
        store.lock().unwrap().file = Some(
            OpenOptions::new()
                .append(true)
                .open(&log_path)
                .unwrap(),
        );
        let err = store.put(b"c", b"3").unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::WriteFailed);

        assert_eq!(fs::metadata(&log_path).unwrap().len(), committed_len);
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), None);
        assert_eq!(store.get(b"c").unwrap(), None);
    }

    #[test]
    fn test_torn_tail_discarded_on_open() {
        let dir = TempDir::new().unwrap();
        {
            let store = LogStore::open(dir.path()).unwrap();
            store.put(b"kept", b"yes").unwrap();
        }

        let log_path = dir.path().join(LOG_FILE_NAME);
        let committed_len = fs::metadata(&log_path).unwrap().len();
        let torn = BatchRecord::new(vec![BatchOp::put("lost", "no")]).serialize();
        let mut bytes = fs::read(&log_path).unwrap();
        bytes.extend_from_slice(&torn[..torn.len() / 2]);
        fs::write(&log_path, bytes).unwrap();

        let store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"kept").unwrap(), Some(b"yes".to_vec()));
        assert_eq!(store.get(b"lost").unwrap(), None);
        assert_eq!(fs::metadata(&log_path).unwrap().len(), committed_len);

        store.put(b"after", b"ok").unwrap();
        drop(store);
        let store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"after").unwrap(), Some(b"ok".to_vec()));
    }

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path()).unwrap();
        store
            .batch(&[
                BatchOp::put("bob!ids", "1"),
                BatchOp::put("alice!post!2", "b"),
                BatchOp::put("alice!ids", "2"),
                BatchOp::put("alice!post!1", "a"),
            ])
            .unwrap();

        let keys: Vec<Vec<u8>> = store
            .scan_prefix(b"alice!")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            keys,
            vec![
                b"alice!ids".to_vec(),
                b"alice!post!1".to_vec(),
                b"alice!post!2".to_vec()
            ]
        );
    }

    #[test]
    fn test_closed_store_rejects_calls() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path()).unwrap();
        store.close().unwrap();

        assert_eq!(store.get(b"a").unwrap_err().code(), StorageErrorCode::Closed);
        assert_eq!(
            store.put(b"a", b"1").unwrap_err().code(),
            StorageErrorCode::Closed
        );
        // Closing twice is harmless
        store.close().unwrap();
    }
}
