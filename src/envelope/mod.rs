//! The encrypted on-disk representation of a document.
//!
//! This module provides:
//! - The `Envelope` wire type and content sniffing (`format`)
//! - Text/binary sealing and opening, plus presentation mode (`codec`)

pub mod codec;
pub mod format;

// Re-export the most commonly used items.
pub use codec::{view_mode, ContentKind, ViewMode, BINARY_KINDS, DEFAULT_KIND};
pub use format::{looks_encrypted, looks_encrypted_bytes, Envelope};
