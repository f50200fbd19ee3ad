//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::kv::StorageError;
use crate::post::PostError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing or invalid
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Malformed document on stdin
    InvalidInput,
    /// Store could not be opened or closed
    BootFailed,
    /// Destructive command run without confirmation
    ConfirmationRequired,
    /// The operation itself failed; the response line carries the detail
    CommandFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "PL_CLI_CONFIG_ERROR",
            Self::IoError => "PL_CLI_IO_ERROR",
            Self::InvalidInput => "PL_CLI_INVALID_INPUT",
            Self::BootFailed => "PL_CLI_BOOT_FAILED",
            Self::ConfirmationRequired => "PL_CLI_CONFIRMATION_REQUIRED",
            Self::CommandFailed => "PL_CLI_COMMAND_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn confirmation_required(command: &str) -> Self {
        Self::new(
            CliErrorCode::ConfirmationRequired,
            format!("'{}' is irreversible; pass --yes to confirm", command),
        )
    }

    pub fn command_failed(err: &PostError) -> Self {
        Self::new(
            CliErrorCode::CommandFailed,
            format!("{}: {}", err.code(), err),
        )
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
