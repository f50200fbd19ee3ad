//! Sequential log reader used to replay the store on open
//!
//! - Every record's checksum is validated
//! - A complete record that fails validation is corruption (FATAL)
//! - An incomplete final record is a torn tail: the batch never committed,
//!   so replay stops before it and reports where valid data ends

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::errors::{StorageError, StorageResult};
use super::record::{is_unfinished_append, BatchRecord, MIN_RECORD_SIZE};

/// Log reader for replay on open.
pub struct LogReader {
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
    torn_tail: bool,
}

impl LogReader {
    /// Opens the log file for reading.
    pub fn open(log_path: &Path) -> StorageResult<Self> {
        let file = File::open(log_path).map_err(|e| {
            StorageError::read_failed(format!("Failed to open log: {}", log_path.display()), e)
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read log metadata", e))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
            torn_tail: false,
        })
    }

    /// Offset just past the last valid record read so far.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Whether reading stopped at an incomplete final record.
    pub fn hit_torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Bytes between the last valid record and the end of the file.
    pub fn trailing_bytes(&self) -> u64 {
        self.file_size - self.current_offset
    }

    /// Reads the next committed batch.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of log or at a torn tail
    /// - `Err(PL_DATA_CORRUPTION)` if a complete record fails validation
    pub fn read_next(&mut self) -> StorageResult<Option<BatchRecord>> {
        if self.torn_tail || self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            self.torn_tail = true;
            return Ok(None);
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to read record length at offset {}", self.current_offset),
                e,
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > remaining {
            return self.classify_short_record(len_buf, record_length, remaining);
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to read record body at offset {}", self.current_offset),
                e,
            )
        })?;

        let (record, consumed) = BatchRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += consumed as u64;
        Ok(Some(record))
    }

    /// A record that claims more bytes than the file holds is a torn tail
    /// only if the bytes present are the start of one unfinished append.
    /// Anything else is a damaged length field in front of committed data.
    fn classify_short_record(
        &mut self,
        len_buf: [u8; 4],
        record_length: u64,
        remaining: u64,
    ) -> StorageResult<Option<BatchRecord>> {
        let mut tail = vec![0u8; remaining as usize];
        tail[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut tail[4..]).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to read log tail at offset {}", self.current_offset),
                e,
            )
        })?;

        if is_unfinished_append(&tail) {
            self.torn_tail = true;
            return Ok(None);
        }

        Err(StorageError::corruption_at_offset(
            self.current_offset,
            format!(
                "Record length {} exceeds the {} bytes left but a complete record is present",
                record_length, remaining
            ),
        ))
    }

    /// Reads every committed batch.
    pub fn read_all(&mut self) -> StorageResult<Vec<BatchRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}
