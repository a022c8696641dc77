//! CLI error types

use std::io;

use thiserror::Error;

use crate::error::DbError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading stdin or writing stdout failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Request body was not a usable JSON object
    #[error("invalid input: {0}")]
    Input(String),

    /// Store operation failed
    #[error(transparent)]
    Db(#[from] DbError),
}

impl CliError {
    /// Invalid input
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "FILEDB_CLI_IO_ERROR",
            Self::Input(_) => "FILEDB_CLI_INVALID_INPUT",
            Self::Db(e) => e.code(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Input(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_code_passes_through() {
        let err = CliError::from(DbError::NotFound(4));
        assert_eq!(err.code(), "FILEDB_NOT_FOUND");
        assert_eq!(err.to_string(), "record not found: 4");
    }

    #[test]
    fn test_input_code() {
        assert_eq!(CliError::input("empty").code(), "FILEDB_CLI_INVALID_INPUT");
    }
}
