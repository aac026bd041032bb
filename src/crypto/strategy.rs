//! Envelope version → crypto strategy dispatch.
//!
//! The table is closed: each supported `version` string maps to exactly
//! one `Strategy` value.  Supporting a new format means adding a variant
//! and a table row; nothing is ever picked by fallback.
//!
//! Payload layout for `Pbkdf2AesGcm` (base64 of the concatenation):
//!
//! ```text
//! [nonce: 16 bytes][salt: 16 bytes][AES-256-GCM ciphertext + 16-byte tag]
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use super::encryption::{self, NONCE_LEN, TAG_LEN};
use super::kdf::{derive_key, random_bytes};
use crate::errors::{NotelockError, Result};

/// Version written by `default_strategy`.
pub const DEFAULT_VERSION: &str = "2.0";

/// Salt length for the current format.
pub const SALT_LEN: usize = 16;

/// PBKDF2 round count for the current format.
pub const V2_ITERATIONS: u32 = 210_000;

/// A concrete algorithm bound to one envelope version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// PBKDF2-HMAC-SHA512 → AES-256-GCM, random salt and nonce per call.
    Pbkdf2AesGcm { iterations: u32 },
}

static REGISTRY: &[(&str, Strategy)] = &[(
    DEFAULT_VERSION,
    Strategy::Pbkdf2AesGcm {
        iterations: V2_ITERATIONS,
    },
)];

/// The strategy new envelopes are written with, and its version tag.
pub fn default_strategy() -> (&'static str, Strategy) {
    let (version, strategy) = REGISTRY[0];
    (version, strategy)
}

/// Look up a strategy, returning `None` for unknown versions.
pub fn strategy_for(version: &str) -> Option<Strategy> {
    REGISTRY
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, s)| *s)
}

/// Look up a strategy, failing with `UnsupportedVersion` for unknown versions.
pub fn strategy_for_or_err(version: &str) -> Result<Strategy> {
    strategy_for(version).ok_or_else(|| NotelockError::UnsupportedVersion(version.to_string()))
}

/// All versions this build can read.
pub fn supported_versions() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(v, _)| *v)
}

impl Strategy {
    /// Encrypt `plaintext` under `password`, returning base64 text.
    ///
    /// Every call draws a fresh salt and nonce, so identical inputs never
    /// produce identical output.
    pub fn encrypt_to_base64(&self, plaintext: &[u8], password: &str) -> Result<String> {
        match *self {
            Strategy::Pbkdf2AesGcm { iterations } => {
                let nonce: [u8; NONCE_LEN] = random_bytes();
                let salt: [u8; SALT_LEN] = random_bytes();

                let key = derive_key(password.as_bytes(), &salt, iterations)?;
                let ciphertext = encryption::encrypt(key.as_bytes(), &nonce, plaintext)?;

                let mut payload = Vec::with_capacity(NONCE_LEN + SALT_LEN + ciphertext.len());
                payload.extend_from_slice(&nonce);
                payload.extend_from_slice(&salt);
                payload.extend_from_slice(&ciphertext);
                Ok(BASE64.encode(payload))
            }
        }
    }

    /// Decrypt base64 text produced by `encrypt_to_base64`.
    ///
    /// Malformed base64, a short payload, a wrong password and tampering
    /// all surface as `AuthenticationFailed`.
    pub fn decrypt_from_base64(&self, encoded: &str, password: &str) -> Result<Vec<u8>> {
        match *self {
            Strategy::Pbkdf2AesGcm { iterations } => {
                let mut payload = BASE64
                    .decode(encoded.trim())
                    .map_err(|_| NotelockError::AuthenticationFailed)?;

                if payload.len() < NONCE_LEN + SALT_LEN + TAG_LEN {
                    return Err(NotelockError::AuthenticationFailed);
                }

                let mut nonce = [0u8; NONCE_LEN];
                nonce.copy_from_slice(&payload[..NONCE_LEN]);
                let salt = &payload[NONCE_LEN..NONCE_LEN + SALT_LEN];
                let ciphertext = &payload[NONCE_LEN + SALT_LEN..];

                let key = derive_key(password.as_bytes(), salt, iterations)?;
                let plaintext = encryption::decrypt(key.as_bytes(), &nonce, ciphertext);
                payload.zeroize();
                plaintext
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_version_two() {
        let (version, strategy) = default_strategy();
        assert_eq!(version, "2.0");
        assert_eq!(strategy_for(version), Some(strategy));
    }

    #[test]
    fn unknown_version_both_forms() {
        assert!(strategy_for("9.9").is_none());
        let err = strategy_for_or_err("9.9").unwrap_err();
        assert!(matches!(&err, NotelockError::UnsupportedVersion(v) if v == "9.9"));
        assert_eq!(
            err.to_string(),
            "Unsupported envelope version '9.9' (supported: 2.0)"
        );
    }

    #[test]
    fn lookup_is_exact() {
        assert!(strategy_for("2").is_none());
        assert!(strategy_for("2.0 ").is_none());
        assert!(strategy_for("").is_none());
    }

    #[test]
    fn payload_layout() {
        let (_, strategy) = default_strategy();
        let encoded = strategy.encrypt_to_base64(b"abc", "pw").unwrap();
        let raw = BASE64.decode(encoded).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + SALT_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn garbage_base64_is_authentication_failure() {
        let (_, strategy) = default_strategy();
        let err = strategy.decrypt_from_base64("!!!not base64", "pw").unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn supported_versions_lists_table() {
        assert_eq!(supported_versions().collect::<Vec<_>>(), vec!["2.0"]);
    }
}
