//! Error types for movement injection.

use thiserror::Error;

/// Result type for injection operations.
pub type InjectionResult<T> = Result<T, InjectionError>;

/// Errors that abort a single movement command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    /// The movement driver is not installed or not ready.
    #[error("movement driver unavailable")]
    DriverUnavailable,

    /// The command cannot be executed as given.
    #[error("invalid movement command: {0}")]
    InvalidCommand(String),

    /// The driver refused a delta.
    #[error("driver rejected movement: {0}")]
    Emit(String),
}
