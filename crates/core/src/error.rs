//! Error types for the migration engine
//!
//! Every fallible operation in the crate returns [`LadderResult`]; failures
//! abort the whole run and surface to the CLI, which exits non-zero.

use thiserror::Error;

/// Result type alias for migration operations
pub type LadderResult<T> = Result<T, LadderError>;

#[derive(Debug, Error)]
pub enum LadderError {
    /// Violated precondition: malformed filename, empty migration
    /// directory, invalid target. Raised before any database mutation.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Failing database statement: connection, script execution, or a
    /// constraint violation on the version bookkeeping write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Bad environment configuration (URL, port, missing values).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for LadderError {
    fn from(err: sqlx::Error) -> Self {
        LadderError::Storage(err.to_string())
    }
}
