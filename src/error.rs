//! Error types for filedb
//!
//! Every fallible operation returns `DbResult<T>`. Errors carry a stable
//! `FILEDB_*` code for machine consumers (the CLI prints it verbatim).
//!
//! `InvalidIndexFile` is produced while loading an index mirror and is
//! handled by the index engine itself (it triggers a rebuild); callers of
//! `FileDb` never observe it from `open`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filedb operations
pub type DbResult<T> = Result<T, DbError>;

/// Storage engine error
#[derive(Debug, Error)]
pub enum DbError {
    /// No record file exists for the identifier
    #[error("record not found: {0}")]
    NotFound(u64),

    /// A unique-indexed value is already held by a live record
    #[error("unique index violation: {field}")]
    UniqueViolation { field: String },

    /// Index mirror does not match the configured layout
    #[error("invalid index file for '{field}' at line {line}: {reason}")]
    InvalidIndexFile {
        field: String,
        line: usize,
        reason: String,
    },

    /// Ledger stat file could not be parsed
    #[error("invalid stat file {}: {reason}", path.display())]
    InvalidStatFile { path: PathBuf, reason: String },

    /// Record bytes could not be decoded
    #[error("failed to decode record {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Record could not be encoded
    #[error("failed to encode record {id}: {message}")]
    Encode { id: u64, message: String },

    /// Underlying filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Store configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A previous mutation failed part-way; reopen the store to recover
    #[error("store requires recovery: {0}")]
    RecoveryRequired(String),
}

impl DbError {
    /// Wrap an I/O error with a short description of what was attempted
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Unique violation on `field`
    pub fn unique_violation(field: impl Into<String>) -> Self {
        Self::UniqueViolation {
            field: field.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "FILEDB_NOT_FOUND",
            Self::UniqueViolation { .. } => "FILEDB_UNIQUE_VIOLATION",
            Self::InvalidIndexFile { .. } => "FILEDB_INVALID_INDEX_FILE",
            Self::InvalidStatFile { .. } => "FILEDB_INVALID_STAT_FILE",
            Self::Decode { .. } => "FILEDB_DECODE_ERROR",
            Self::Encode { .. } => "FILEDB_ENCODE_ERROR",
            Self::Io { .. } => "FILEDB_IO_ERROR",
            Self::InvalidConfig(_) => "FILEDB_INVALID_CONFIG",
            Self::RecoveryRequired(_) => "FILEDB_RECOVERY_REQUIRED",
        }
    }
}
