//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
///
/// Display strings are user-facing; none of them ever contain a license key.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The codec key is empty.
    #[error("codec key must not be empty")]
    InvalidKey,

    /// The blob is not valid base64.
    #[error("malformed license blob: {0}")]
    MalformedBlob(String),

    /// The license key string is empty or unusable.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Machine or user identity could not be determined.
    #[error("device identity unavailable: {0}")]
    IdentityUnavailable(String),

    /// The authority refused the login; carries the server's message.
    #[error("{0}")]
    LoginRejected(String),

    /// The session ran out of time.
    #[error("session expired")]
    SessionExpired,

    /// The session was ended by logout or a protection event.
    #[error("session ended")]
    SessionTerminated,

    /// No session has been authenticated yet.
    #[error("not logged in")]
    NotAuthenticated,

    /// The login was replaced by a newer one before it completed.
    #[error("login cancelled")]
    LoginCancelled,

    /// Network error talking to the authority.
    #[error("network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
