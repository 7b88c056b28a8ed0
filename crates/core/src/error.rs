//! Error types for s3fc-core
//!
//! One error enum shared by every crate in the workspace. Storage adapters
//! map their SDK failures onto these variants so callers can decide what to
//! do without knowing which backend produced the error.

use thiserror::Error;

/// Result alias used across s3fc
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by s3fc operations
#[derive(Debug, Error)]
pub enum Error {
    /// Missing, incomplete or rejected credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Remote call failed in transit or was rejected by the service
    #[error("Network error: {0}")]
    Network(String),

    /// Bucket, object or local file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Regular expression failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Remote path or key could not be parsed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration file or override is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Object content could not be turned into a table
    #[error("Table error: {0}")]
    Table(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// True for errors caused by credentials rather than the request itself
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// True when the addressed resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
