//! Client layer for Sentra.
//!
//! Wires the license session, the anti-tamper guard and the input injection
//! engine together:
//! - [`ClientConfig`]: JSON configuration with defaults and validation
//! - [`logging::init`]: tracing subscriber setup
//! - [`HttpAuthority`]: the license authority over HTTP
//! - [`WebhookSink`]: threat reports over HTTP
//! - [`SettingsStore`]: persisted user settings
//! - [`Client`]: starts the background tasks and shuts them down

mod authority;
mod client;
mod config;
mod error;
pub mod logging;
mod settings;
mod webhook;

pub use authority::HttpAuthority;
pub use client::{Capabilities, Client};
pub use config::{
    ClientConfig, GuardSettings, InputSettings, LicenseSettings, LoggingConfig, WebhookSettings,
};
pub use error::{ClientError, ClientResult};
pub use settings::{MemorySettings, SettingsStore};
pub use webhook::{fetch_text, with_token, WebhookReport, WebhookSink};
