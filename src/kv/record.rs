//! Batch operations and their on-disk record format
//!
//! One atomic batch is one log record:
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record including this field)
//! +------------------+
//! | Op Count         | (u32 LE)
//! +------------------+
//! | Ops              | tag u8 (1 = put, 2 = delete)
//! |                  | key (length-prefixed bytes)
//! |                  | value (length-prefixed bytes, put only)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use super::checksum::compute_checksum;

const TAG_PUT: u8 = 1;
const TAG_DELETE: u8 = 2;

/// Smallest valid record: length + op count + checksum.
pub const MIN_RECORD_SIZE: usize = 4 + 4 + 4;

/// A single pending mutation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Set `key` to `value`
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key`; removing an absent key is not an error
    Delete { key: Vec<u8> },
}

impl BatchOp {
    /// Create a put operation
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOp::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a delete operation
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOp::Delete { key: key.into() }
    }

    /// The key this operation touches
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

/// A committed batch as stored in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    /// Operations in application order
    pub ops: Vec<BatchOp>,
}

impl BatchRecord {
    /// Wrap a list of operations
    pub fn new(ops: Vec<BatchOp>) -> Self {
        Self { ops }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.ops.len() as u32).to_le_bytes());

        for op in &self.ops {
            match op {
                BatchOp::Put { key, value } => {
                    buf.push(TAG_PUT);
                    write_bytes(&mut buf, key);
                    write_bytes(&mut buf, value);
                }
                BatchOp::Delete { key } => {
                    buf.push(TAG_DELETE);
                    write_bytes(&mut buf, key);
                }
            }
        }

        buf
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);

        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed. Short input is
    /// reported as `UnexpectedEof` so callers can tell a torn tail from
    /// corruption (`InvalidData`).
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = compute_checksum(&data[0..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let mut count_buf = [0u8; 4];
        cursor.read_exact(&mut count_buf)?;
        let op_count = u32::from_le_bytes(count_buf) as usize;

        let mut ops = Vec::with_capacity(op_count.min(1024));
        for _ in 0..op_count {
            let mut tag = [0u8; 1];
            cursor.read_exact(&mut tag)?;
            let op = match tag[0] {
                TAG_PUT => {
                    let key = read_bytes(&mut cursor)?;
                    let value = read_bytes(&mut cursor)?;
                    BatchOp::Put { key, value }
                }
                TAG_DELETE => BatchOp::Delete {
                    key: read_bytes(&mut cursor)?,
                },
                other => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Unknown op tag: {}", other),
                    ))
                }
            };
            ops.push(op);
        }

        Ok((Self { ops }, record_length))
    }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// Whether `data` can only be the start of a record whose append was cut
/// short.
///
/// The declared op count is walked over the bytes present. Running out of
/// bytes before the checksum means the writer stopped mid-record. A body
/// and checksum that are already complete mean the length field is wrong,
/// which is corruption.
pub fn is_unfinished_append(data: &[u8]) -> bool {
    let mut pos = 4;
    let Some(op_count) = take_u32(data, &mut pos) else {
        return true;
    };

    for _ in 0..op_count {
        let Some(&tag) = data.get(pos) else {
            return true;
        };
        pos += 1;

        let fields = match tag {
            TAG_PUT => 2,
            TAG_DELETE => 1,
            _ => return false,
        };
        for _ in 0..fields {
            let Some(len) = take_u32(data, &mut pos) else {
                return true;
            };
            pos = pos.saturating_add(len as usize);
            if pos > data.len() {
                return true;
            }
        }
    }

    data.len() < pos + 4
}

fn take_u32(data: &[u8], pos: &mut usize) -> Option<u32> {
    let bytes = data.get(*pos..*pos + 4)?;
    *pos += 4;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
