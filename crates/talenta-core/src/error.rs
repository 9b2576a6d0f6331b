//! Error types for talenta.

use thiserror::Error;

/// Result type alias using talenta's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for talenta operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored file not found
    #[error("File not found: {0}")]
    FileNotFound(uuid::Uuid),

    /// Evaluation job not found
    #[error("Job not found: {0}")]
    JobNotFound(uuid::Uuid),

    /// Document text extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Provider reported a transient condition (rate limit / overload).
    /// The only error kind the model-call retry policy acts on.
    #[error("Transient provider error ({status}): {message}")]
    Transient { status: u16, message: String },

    /// Vector index operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error represents a transient provider condition
    /// worth retrying (rate-limited or temporarily unavailable).
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
