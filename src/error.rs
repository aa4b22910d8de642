//! Error types for filedock.

use thiserror::Error;
use tracing::debug;

/// Common error type for filedock.
#[derive(Error, Debug)]
pub enum FiledockError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error from the storage root.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The request conflicts with existing state (duplicate name, same folder).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Upload exceeded the configured size limit (in bytes).
    #[error("upload exceeds the maximum size of {0} bytes")]
    TooLarge(u64),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Unique constraint violations are the database-side backstop for the
// name pre-checks, so they surface as conflicts rather than opaque failures.
impl From<sqlx::Error> for FiledockError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                debug!(constraint = db_err.message(), "Unique constraint violated");
                FiledockError::Conflict("name is already taken".to_string())
            }
            _ => FiledockError::Database(e.to_string()),
        }
    }
}

impl FiledockError {
    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FiledockError::NotFound(_))
    }

    /// Whether this is a `Conflict` error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, FiledockError::Conflict(_))
    }
}

/// Result type alias for filedock operations.
pub type Result<T> = std::result::Result<T, FiledockError>;
