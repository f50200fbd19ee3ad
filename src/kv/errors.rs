//! Store error types
//!
//! Error codes:
//! - PL_STORAGE_IO_ERROR (ERROR severity)
//! - PL_STORAGE_WRITE_FAILED (ERROR severity)
//! - PL_STORAGE_READ_FAILED (ERROR severity)
//! - PL_STORAGE_CLOSED (ERROR severity)
//! - PL_DATA_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, process continues
    Error,
    /// The store must not be used further
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure
    IoError,
    /// Batch append or fsync failed
    WriteFailed,
    /// Read failed
    ReadFailed,
    /// Handle used after `close()`
    Closed,
    /// Checksum failure or undecodable value
    DataCorruption,
}

impl StorageErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::IoError => "PL_STORAGE_IO_ERROR",
            StorageErrorCode::WriteFailed => "PL_STORAGE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "PL_STORAGE_READ_FAILED",
            StorageErrorCode::Closed => "PL_STORAGE_CLOSED",
            StorageErrorCode::DataCorruption => "PL_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with code, message and optional context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    fn with_code(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::with_code(StorageErrorCode::IoError, message)
        }
    }

    /// Create a write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::with_code(StorageErrorCode::WriteFailed, message)
        }
    }

    /// Create a write failed error without IO source
    pub fn write_failed_no_source(message: impl Into<String>) -> Self {
        Self::with_code(StorageErrorCode::WriteFailed, message)
    }

    /// Create a read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::with_code(StorageErrorCode::ReadFailed, message)
        }
    }

    /// Create a read failed error without IO source
    pub fn read_failed_no_source(message: impl Into<String>) -> Self {
        Self::with_code(StorageErrorCode::ReadFailed, message)
    }

    /// The handle was used after close
    pub fn closed() -> Self {
        Self::with_code(StorageErrorCode::Closed, "store is closed")
    }

    /// Create a data corruption error (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self::with_code(StorageErrorCode::DataCorruption, message)
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            details: Some(format!("byte_offset: {}", offset)),
            ..Self::data_corruption(reason)
        }
    }

    /// Create a data corruption error for a stored value
    pub fn corruption_for_key(key: &[u8], reason: impl Into<String>) -> Self {
        Self {
            details: Some(format!("key: {}", String::from_utf8_lossy(key))),
            ..Self::data_corruption(reason)
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StorageResult<T> = Result<T, StorageError>;
