//! Licensing and session lifecycle for Sentra.
//!
//! This crate handles:
//! - Obfuscating license keys for transport (the license codec)
//! - Device fingerprinting for session binding
//! - The license session state machine and its serialized manager
//! - The seam to the remote session authority
//!
//! # Session lifecycle
//!
//! ```text
//! begin_login ──> Authenticating ──accepted──> Authenticated ──> Expired
//!                       │                            │
//!                       └──rejected──> Unauthenticated └──> Terminated
//! ```
//!
//! Only one session instance is live per manager. Every transition goes
//! through a single lock and is published on a `watch` channel, so observers
//! (the injection gate, a presentation layer) never see interleaved states.
//!
//! # Codec
//!
//! The license codec is obfuscation, not encryption. See [`codec`] for the
//! exact scheme and its limits.

mod authority;
pub mod codec;
mod device;
mod error;
mod key;
mod manager;
mod session;

pub use authority::{LoginPayload, LoginResponse, RemoteAuthority, TrialPayload};
pub use codec::LicenseCodec;
pub use device::{DeviceFingerprint, DeviceId, HostIdentity, StaticIdentity, SystemIdentity};
pub use error::{LicenseError, LicenseResult};
pub use key::LicenseKey;
pub use manager::{PendingLogin, SessionConfig, SessionManager, SessionSnapshot};
pub use session::{LicenseSession, TerminationReason};
