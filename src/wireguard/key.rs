//! `WireGuard` public keys
//!
//! Keys are compared on their raw 32 bytes. Two text encodings exist:
//! standard base64 as printed by `wg`, and padded URL-safe base64 used as
//! the store key.

use std::fmt;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

use crate::error::{ReconcileError, WgError};

/// `WireGuard` key length in bytes
pub const WG_KEY_LENGTH: usize = 32;

/// A Curve25519 public key
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; WG_KEY_LENGTH]);

impl PublicKey {
    /// Wrap raw key bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; WG_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; WG_KEY_LENGTH] {
        &self.0
    }

    /// Encode in the store key format (padded URL-safe base64)
    #[must_use]
    pub fn to_store_key(&self) -> String {
        URL_SAFE.encode(self.0)
    }

    /// Encode the way `wg` prints keys (padded standard base64)
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode a store key
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError` if the key is not URL-safe base64 or does
    /// not decode to exactly 32 bytes.
    pub fn from_store_key(key: &str) -> Result<Self, ReconcileError> {
        let decoded = URL_SAFE
            .decode(key)
            .map_err(|_| ReconcileError::InvalidKeyEncoding { key: key.into() })?;

        let bytes: [u8; WG_KEY_LENGTH] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| ReconcileError::InvalidKeyLength {
                    key: key.into(),
                    length: decoded.len(),
                })?;

        Ok(Self(bytes))
    }

    /// Decode a key printed by `wg`
    ///
    /// # Errors
    ///
    /// Returns `WgError::InvalidKey` for malformed input.
    pub fn from_base64(key: &str) -> Result<Self, WgError> {
        let decoded = STANDARD
            .decode(key)
            .map_err(|e| WgError::InvalidKey(format!("{key}: {e}")))?;

        let bytes: [u8; WG_KEY_LENGTH] = decoded.as_slice().try_into().map_err(|_| {
            WgError::InvalidKey(format!("{key}: expected 32 bytes, got {}", decoded.len()))
        })?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}
