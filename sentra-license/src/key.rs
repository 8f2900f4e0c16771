//! License key handling.
//!
//! The raw key is a secret: it is only ever exposed to the codec, and every
//! formatting path prints a redacted placeholder instead.

use crate::codec::LicenseCodec;
use crate::error::{LicenseError, LicenseResult};
use std::fmt;

/// A user-supplied license key.
#[derive(Clone, PartialEq, Eq)]
pub struct LicenseKey {
    raw: String,
}

impl LicenseKey {
    /// Parses a key as typed by the user.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or contains control characters.
    pub fn parse(key: &str) -> LicenseResult<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LicenseError::InvalidKeyFormat(
                "license key must not be empty".to_string(),
            ));
        }
        if key.chars().any(char::is_control) {
            return Err(LicenseError::InvalidKeyFormat(
                "license key contains control characters".to_string(),
            ));
        }
        Ok(Self {
            raw: key.to_string(),
        })
    }

    /// Produces the wire blob for this key.
    #[must_use]
    pub fn encode(&self, codec: &LicenseCodec) -> String {
        codec.encode(&self.raw)
    }

    /// Returns the raw key string.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.raw
    }

    /// Number of characters in the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl fmt::Debug for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LicenseKey(<redacted>)")
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
