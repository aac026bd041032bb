//! Configuration loaded from `.notelock.toml` in the vault root.

pub mod settings;

pub use settings::{SavePolicyKind, Settings};
