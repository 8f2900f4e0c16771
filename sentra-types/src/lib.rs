//! Shared value types for the Sentra protected client.
//!
//! This crate defines the plain data exchanged between the three core
//! subsystems and the presentation layer:
//! - Session identifiers and observable session status
//! - Threat events produced by the anti-tamper guard
//! - Movement commands consumed by the input injection engine
//! - Key bindings and virtual-key naming
//! - A clock abstraction so time-dependent logic can be driven by tests
//!
//! Nothing here performs I/O.

mod clock;
mod ids;
mod keys;
mod movement;
mod session;
mod threat;

pub use clock::{format_duration, format_timestamp, Clock, ManualClock, SystemClock};
pub use ids::{SessionId, ThreatId};
pub use keys::{Action, KeyBinding, KeyBindings, KeyCode};
pub use movement::{EasingKind, MovementCommand};
pub use session::{SessionState, SessionStatus};
pub use threat::{Severity, ThreatEvent, ThreatKind};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur constructing or parsing shared types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown key name: {0}")]
    UnknownKey(String),

    #[error("invalid movement command: {0}")]
    InvalidCommand(String),
}
