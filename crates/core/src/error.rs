//! Unified error types for the usage statistics engine.
//!
//! Error codes:
//! - DB_001-003: Storage errors (fatal for the current file or report)
//! - INPUT_001-003: Malformed input (fatal for the containing file)
//!
//! Data-quality discards are not errors; see `IngestOutcome` in the ingest crate.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Storage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Query or statement failed
    QueryFailed,
    /// DB_002: Uniqueness or other constraint violated
    ConstraintViolation,
    /// DB_003: Stored value could not be decoded
    Decode,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::QueryFailed => "DB_001",
            Self::ConstraintViolation => "DB_002",
            Self::Decode => "DB_003",
        }
    }
}

/// Malformed input error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputErrorCode {
    /// INPUT_001: Snapshot timestamp could not be parsed
    InvalidTimestamp,
    /// INPUT_002: Snapshot line could not be decoded
    MalformedLine,
    /// INPUT_003: Daily file could not be read or decompressed
    UnreadableFile,
}

impl InputErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimestamp => "INPUT_001",
            Self::MalformedLine => "INPUT_002",
            Self::UnreadableFile => "INPUT_003",
        }
    }
}

/// Unified error type for the usage statistics engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error with code.
    #[error("[{code}] {message}")]
    Database { code: &'static str, message: String },

    /// Malformed input error with code.
    #[error("[{code}] {message}")]
    Input { code: &'static str, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a storage error.
    pub fn database(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Database {
            code: code.code(),
            message: msg.into(),
        }
    }

    /// Create a malformed input error.
    pub fn input(code: InputErrorCode, msg: impl Into<String>) -> Self {
        Self::Input {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Database { code, .. } => Some(code),
            Self::Input { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the error came from the backing store.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Database { .. })
    }
}
