//! CRC32 checksums for log records
//!
//! Every batch record carries a CRC32 (IEEE) over its length prefix and body.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
