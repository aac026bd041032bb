//! Password-based key derivation using PBKDF2-HMAC-SHA512.
//!
//! The round count is part of the envelope version, not a user setting:
//! changing it would make existing documents unreadable.  A new count
//! means a new strategy entry in `strategy`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroize;

use crate::errors::{NotelockError, Result};

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum round count accepted by `derive_key`.
const MIN_ITERATIONS: u32 = 100_000;

/// A derived 32-byte key that is wiped from memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Derive a 32-byte key from a password and salt.
///
/// The same password + salt + iterations always produce the same key.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<DerivedKey> {
    if iterations < MIN_ITERATIONS {
        return Err(NotelockError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {iterations})"
        )));
    }
    if salt.is_empty() {
        return Err(NotelockError::KeyDerivationFailed(
            "salt must not be empty".into(),
        ));
    }

    let mut key = DerivedKey {
        bytes: [0u8; KEY_LEN],
    };
    pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut key.bytes);
    Ok(key)
}

/// Fill a buffer of `N` bytes from the thread-local CSPRNG.
///
/// Used for both salts and nonces.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}
