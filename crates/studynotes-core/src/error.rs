//! Error types for studynotes.

use thiserror::Error;

/// Result type alias using studynotes' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for studynotes operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage backend operation failed (wraps sqlx::Error)
    #[error("Backend error: {0}")]
    Backend(#[from] sqlx::Error),

    /// Storage backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// Subject not found
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    /// Object (blob) not found in the object store
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Upload rejected before any backend call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Attribute item encoding/decoding error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Conditional write lost the race too many times
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
