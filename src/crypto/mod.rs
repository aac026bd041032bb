//! Cryptographic primitives for Notelock.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - PBKDF2-HMAC-SHA512 password-based key derivation (`kdf`)
//! - The version → algorithm dispatch table (`strategy`)

pub mod encryption;
pub mod kdf;
pub mod strategy;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{strategy_for, default_strategy, ...};
pub use kdf::{derive_key, random_bytes, DerivedKey};
pub use strategy::{
    default_strategy, strategy_for, strategy_for_or_err, supported_versions, Strategy,
    DEFAULT_VERSION,
};
