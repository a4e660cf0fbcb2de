//! # Keyed-MAC Security Module
//!
//! The single implementation of the HMAC primitives used by the kernel.
//! Capability tokens are authenticated with it; no subsystem carries its
//! own MAC code.
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256**: 32-byte tags over canonical byte encodings
//! - **Constant-Time Verification**: tags are compared with `verify_slice`
//! - **Opaque Keys**: [`SigningKey`] zeroizes on drop, redacts its `Debug`
//!   output and never returns its bytes

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Length of a signing key and of a MAC tag, in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte HMAC-SHA256 tag.
pub type MacTag = [u8; 32];

/// Errors from keyed-MAC operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key bytes were rejected by the MAC implementation.
    #[error("invalid key length: {0}")]
    InvalidLength(usize),
}

/// Computes HMAC-SHA256 over `message` with `key`.
pub fn compute_mac(key: &[u8], message: &[u8]) -> Result<MacTag, KeyError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|_| KeyError::InvalidLength(key.len()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().into())
}

/// Validates an HMAC-SHA256 tag.
///
/// Returns `false` on any mismatch or unusable key. Uses constant-time
/// comparison.
pub fn verify_mac(key: &[u8], message: &[u8], tag: &MacTag) -> bool {
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(m) => m,
        Err(_) => return false,
    };

    mac.update(message);

    mac.verify_slice(tag).is_ok()
}

/// Secret key for the kernel's keyed MAC.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    bytes: [u8; KEY_LEN],
}

impl SigningKey {
    /// Generates a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Computes the tag for `message` under this key.
    pub fn mac(&self, message: &[u8]) -> Result<MacTag, KeyError> {
        compute_mac(&self.bytes, message)
    }

    /// Verifies `tag` for `message` in constant time.
    pub fn verify(&self, message: &[u8], tag: &MacTag) -> bool {
        verify_mac(&self.bytes, message, tag)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_roundtrip() {
        let key = SigningKey::generate();
        let tag = key.mac(b"hello world").unwrap();
        assert!(key.verify(b"hello world", &tag));
    }

    #[test]
    fn test_mac_wrong_key() {
        let key1 = SigningKey::from_bytes([1u8; 32]);
        let key2 = SigningKey::from_bytes([2u8; 32]);

        let tag = key1.mac(b"hello world").unwrap();
        assert!(!key2.verify(b"hello world", &tag));
    }

    #[test]
    fn test_mac_tampered_message() {
        let key = SigningKey::from_bytes([7u8; 32]);
        let tag = key.mac(b"hello world").unwrap();
        assert!(!key.verify(b"hello World", &tag)); // Capital W
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = SigningKey::from_bytes([0xAB; 32]);
        assert_eq!(format!("{:?}", key), "SigningKey(<redacted>)");
    }
}
