//! Common error types for hostfacts

use thiserror::Error;

/// Common result type for hostfacts operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across hostfacts crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored identifier could not be parsed
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more facts could not be added; the other phases still ran
    #[error("Import of facts failed for host {host}")]
    ImportFailed { host: String },
}
