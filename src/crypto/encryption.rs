//! AES-256-GCM authenticated encryption with a 16-byte nonce.
//!
//! The nonce is twice the usual 96 bits so the output stays compatible
//! with envelopes written by earlier WebCrypto-based clients.  GCM
//! accepts any nonce length; longer nonces are hashed through GHASH.
//!
//! The caller supplies the nonce.  A nonce must never be reused with
//! the same key, so `strategy` draws a fresh one for every envelope.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};

use crate::errors::{NotelockError, Result};

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 16;

/// Size of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt `plaintext` with a 32-byte `key` under `nonce`.
///
/// Returns ciphertext with the 16-byte tag appended.
pub fn encrypt(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm16::new_from_slice(key)
        .map_err(|e| NotelockError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(Nonce::<U16>::from_slice(nonce), plaintext)
        .map_err(|e| NotelockError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Decrypt and authenticate data produced by `encrypt`.
///
/// Any mismatch (wrong key, flipped bit, truncated tag) is reported as
/// `AuthenticationFailed`; no partial plaintext is ever returned.
pub fn decrypt(key: &[u8], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(NotelockError::AuthenticationFailed);
    }

    let cipher =
        Aes256Gcm16::new_from_slice(key).map_err(|_| NotelockError::AuthenticationFailed)?;

    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce), ciphertext)
        .map_err(|_| NotelockError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: [u8; NONCE_LEN] = [7u8; NONCE_LEN];

    #[test]
    fn roundtrip() {
        let key = [0xABu8; 32];
        let ct = encrypt(&key, &NONCE, b"# Journal\nday one").unwrap();
        assert_eq!(ct.len(), 17 + TAG_LEN);
        assert_eq!(decrypt(&key, &NONCE, &ct).unwrap(), b"# Journal\nday one");
    }

    #[test]
    fn wrong_key_is_authentication_failure() {
        let ct = encrypt(&[1u8; 32], &NONCE, b"secret").unwrap();
        let err = decrypt(&[2u8; 32], &NONCE, &ct).unwrap_err();
        assert!(matches!(err, NotelockError::AuthenticationFailed));
    }

    #[test]
    fn flipped_bit_is_detected() {
        let key = [3u8; 32];
        let mut ct = encrypt(&key, &NONCE, b"secret").unwrap();
        ct[0] ^= 0x01;
        assert!(decrypt(&key, &NONCE, &ct).is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        assert!(decrypt(&[3u8; 32], &NONCE, &[0u8; 5]).is_err());
    }

    #[test]
    fn short_key_is_rejected() {
        assert!(encrypt(&[0u8; 16], &NONCE, b"x").is_err());
    }
}
