//! Error types for the client layer.

use sentra_license::LicenseError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An HTTP request failed or returned an unusable response.
    #[error("http error: {0}")]
    Http(String),

    /// A background task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    License(#[from] LicenseError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url().to_string())
    }
}
