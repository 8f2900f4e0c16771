//! Seam to the remote session authority and its wire payloads.

use crate::device::DeviceId;
use crate::error::LicenseResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login request body: `{ "encodedKey": ..., "deviceId": ... }`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    /// The license key run through the license codec.
    pub encoded_key: String,
    pub device_id: DeviceId,
}

impl fmt::Debug for LoginPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginPayload")
            .field("encoded_key", &"<redacted>")
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// Free-trial request body: `{ "deviceId": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialPayload {
    pub device_id: DeviceId,
}

/// Authority verdict: `{ "success", "durationSeconds", "errorMessage" }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    /// Granted session length. Negative grants are treated as zero.
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub error_message: String,
}

impl LoginResponse {
    /// An accepted login granting `duration_seconds`.
    #[must_use]
    pub fn granted(duration_seconds: i64) -> Self {
        Self {
            success: true,
            duration_seconds,
            error_message: String::new(),
        }
    }

    /// A rejected login with the authority's message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            duration_seconds: 0,
            error_message: message.into(),
        }
    }

    /// Granted duration clamped to be non-negative.
    #[must_use]
    pub fn granted_secs(&self) -> u64 {
        u64::try_from(self.duration_seconds).unwrap_or(0)
    }
}

/// The remote service that validates keys and issues duration grants.
///
/// Implementations may block on the network; the session manager always
/// calls them from a spawned task with a timeout.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Validates a license login.
    async fn validate(&self, payload: &LoginPayload) -> LicenseResult<LoginResponse>;

    /// Requests a free-trial grant for a device.
    async fn start_trial(&self, payload: &TrialPayload) -> LicenseResult<LoginResponse>;
}
