//! Error types for the guard.

use sentra_types::{ThreatEvent, ThreatKind};
use thiserror::Error;

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors raised by checks, probes and sinks.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A check did not finish within its time budget. Treated as inconclusive.
    #[error("check timed out: {0}")]
    CheckTimeout(String),

    /// The running binary's digest differs from the known-good value.
    #[error("integrity mismatch")]
    IntegrityMismatch,

    /// An unexpected module is loaded into the process.
    #[error("injected code detected: {0}")]
    InjectedCodeDetected(String),

    /// A warn-level finding repeated often enough to become fatal.
    #[error("repeated {0} findings")]
    Escalated(ThreatKind),

    /// The system probe could not answer.
    #[error("probe failed: {0}")]
    Probe(String),

    /// A threat report could not be delivered.
    #[error("report delivery failed: {0}")]
    Report(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GuardError {
    /// The error describing why a fatal event ended the session.
    #[must_use]
    pub fn for_fatal(event: &ThreatEvent) -> Self {
        match event.kind {
            ThreatKind::IntegrityMismatch => Self::IntegrityMismatch,
            ThreatKind::InjectedCode => Self::InjectedCodeDetected(event.details.clone()),
            kind => Self::Escalated(kind),
        }
    }
}
