//! Common error types for the audit backend

use thiserror::Error;

/// Common result type for backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the storage and configuration layers
///
/// The API crate maps these onto HTTP responses; `NotFound` keeps its
/// meaning across that boundary (a vanished task row during result commit
/// becomes a worker error, an unknown user id becomes a 404).
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error from data directory or config file handling
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Row looked up by id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invariant breakage inside the backend (bad JSON column, timestamp)
    #[error("Internal error: {0}")]
    Internal(String),
}
