//! Error types for the word store.

use thiserror::Error;

/// Result type alias using our StoreError type.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite reported an error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A unique value (username or word) already exists.
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Failed to prepare the database location.
    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    /// A previous holder of the connection panicked.
    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// Whether SQLite rejected a write because of a constraint.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
