//! Device fingerprinting for session binding.
//!
//! The device ID is the hex SHA-256 of `computer_name + "-" + user_name`.
//! It is recomputed on demand and never stored as mutable state.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;

/// Source of the machine and user identity a fingerprint is derived from.
pub trait SystemIdentity: Send + Sync {
    /// The machine's name.
    fn computer_name(&self) -> LicenseResult<String>;

    /// The logged-in user's name.
    fn user_name(&self) -> LicenseResult<String>;
}

/// Identity of the current host, read from the environment and hostname.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostIdentity;

impl SystemIdentity for HostIdentity {
    fn computer_name(&self) -> LicenseResult<String> {
        if let Some(name) = non_empty_var("COMPUTERNAME") {
            return Ok(name);
        }
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| LicenseError::IdentityUnavailable("computer name".to_string()))
    }

    fn user_name(&self) -> LicenseResult<String> {
        non_empty_var("USERNAME")
            .or_else(|| non_empty_var("USER"))
            .ok_or_else(|| LicenseError::IdentityUnavailable("user name".to_string()))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// A fixed identity, for tests and headless deployments.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    pub computer_name: String,
    pub user_name: String,
}

impl StaticIdentity {
    pub fn new(computer_name: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            computer_name: computer_name.into(),
            user_name: user_name.into(),
        }
    }
}

impl SystemIdentity for StaticIdentity {
    fn computer_name(&self) -> LicenseResult<String> {
        Ok(self.computer_name.clone())
    }

    fn user_name(&self) -> LicenseResult<String> {
        Ok(self.user_name.clone())
    }
}

/// A 64-character lowercase hex digest identifying one machine/user pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives device IDs.
pub struct DeviceFingerprint;

impl DeviceFingerprint {
    /// Generates the device ID for `identity`.
    ///
    /// # Errors
    ///
    /// Propagates [`LicenseError::IdentityUnavailable`] from the identity source.
    pub fn generate(identity: &dyn SystemIdentity) -> LicenseResult<DeviceId> {
        let seed = format!("{}-{}", identity.computer_name()?, identity.user_name()?);
        Ok(Self::from_seed(&seed))
    }

    /// Generates the device ID for the current host.
    pub fn current() -> LicenseResult<DeviceId> {
        Self::generate(&HostIdentity)
    }

    fn from_seed(seed: &str) -> DeviceId {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        DeviceId(hex::encode(hasher.finalize()))
    }
}
