//! License blob codec.
//!
//! Blobs are produced as `base64(plaintext XOR repeat(key))`: byte `i` of the
//! UTF-8 plaintext is XORed with byte `i mod len(key)` of the key, and the
//! result is encoded with the standard padded base64 alphabet. Decoding
//! reverses the base64 step and re-applies the same XOR stream.
//!
//! # Security
//!
//! This is obfuscation, not confidentiality. The scheme is symmetric and the
//! key ships with the client, so anyone who can run the client can recover
//! any blob. It exists to keep keys out of casual view on the wire and on
//! disk, and must not be relied on against an adversary who controls the
//! client. The format is kept as-is for compatibility with the authority.
//!
//! A wrong key does not produce an error; it produces a different plaintext.

use crate::error::{LicenseError, LicenseResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// A codec bound to one shared key.
#[derive(Clone)]
pub struct LicenseCodec {
    key: Vec<u8>,
}

impl LicenseCodec {
    /// Creates a codec for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKey`] if `key` is empty.
    pub fn new(key: &str) -> LicenseResult<Self> {
        if key.is_empty() {
            return Err(LicenseError::InvalidKey);
        }
        Ok(Self {
            key: key.as_bytes().to_vec(),
        })
    }

    /// Encodes `plaintext` into a transport-safe blob.
    #[must_use]
    pub fn encode(&self, plaintext: &str) -> String {
        BASE64.encode(xor_stream(plaintext.as_bytes(), &self.key))
    }

    /// Decodes a blob produced by [`LicenseCodec::encode`].
    ///
    /// Bytes that are not valid UTF-8 after unmasking (which only happens
    /// with the wrong key) are replaced with U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::MalformedBlob`] if `blob` is not valid base64.
    pub fn decode(&self, blob: &str) -> LicenseResult<String> {
        let bytes = self.decode_bytes(blob)?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Decodes a blob to raw unmasked bytes.
    pub fn decode_bytes(&self, blob: &str) -> LicenseResult<Vec<u8>> {
        let masked = BASE64
            .decode(blob.trim())
            .map_err(|e| LicenseError::MalformedBlob(e.to_string()))?;
        Ok(xor_stream(&masked, &self.key))
    }
}

impl std::fmt::Debug for LicenseCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseCodec")
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Encodes `plaintext` with `key`.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidKey`] if `key` is empty.
pub fn encode(plaintext: &str, key: &str) -> LicenseResult<String> {
    Ok(LicenseCodec::new(key)?.encode(plaintext))
}

/// Decodes `blob` with `key`.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidKey`] if `key` is empty, or
/// [`LicenseError::MalformedBlob`] if `blob` is not valid base64.
pub fn decode(blob: &str, key: &str) -> LicenseResult<String> {
    LicenseCodec::new(key)?.decode(blob)
}

fn xor_stream(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}
