//! Sealing plaintext into envelopes and opening them again.
//!
//! Text and binary content share one strategy interface: binary bytes
//! are base64-transcoded to text first, then encrypted exactly like a
//! note.  `originalKind` records which path was taken.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use super::format::Envelope;
use crate::crypto::{default_strategy, strategy_for_or_err};
use crate::errors::{NotelockError, Result};

/// Extensions whose content is sealed through the binary path.
pub const BINARY_KINDS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "svg", "ico", "tiff", "tif",
];

/// Kind assumed when an envelope does not record one.
pub const DEFAULT_KIND: &str = "md";

/// How a document's plaintext is carried inside the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

impl ContentKind {
    /// Classify by original extension; unknown or absent kinds are text.
    pub fn from_original_kind(kind: Option<&str>) -> Self {
        match kind {
            Some(k) if BINARY_KINDS.iter().any(|b| b.eq_ignore_ascii_case(k)) => {
                ContentKind::Binary
            }
            _ => ContentKind::Text,
        }
    }
}

/// Which presentation should display a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Still encrypted: show only the hint and a password prompt.
    Locked,
    /// Editable text buffer.
    Text,
    /// Decoded image bytes with their MIME type.
    Image { mime: &'static str },
}

/// Pick the presentation for a document from its kind and decrypted state.
pub fn view_mode(original_kind: Option<&str>, decrypted: bool) -> ViewMode {
    if !decrypted {
        return ViewMode::Locked;
    }
    match (ContentKind::from_original_kind(original_kind), original_kind) {
        (ContentKind::Binary, Some(kind)) => ViewMode::Image {
            mime: mime_for(kind),
        },
        _ => ViewMode::Text,
    }
}

fn mime_for(kind: &str) -> &'static str {
    match kind.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "tiff" | "tif" => "image/tiff",
        _ => "image/png",
    }
}

impl Envelope {
    /// Which decode path this envelope's content takes.
    pub fn content_kind(&self) -> ContentKind {
        ContentKind::from_original_kind(self.original_kind.as_deref())
    }

    /// Encrypt `plaintext` with the current default strategy.
    ///
    /// The kind decides whether the bytes are base64-transcoded first.
    pub fn seal(
        plaintext: &[u8],
        password: &str,
        hint: &str,
        original_kind: Option<&str>,
    ) -> Result<Self> {
        let (version, strategy) = default_strategy();

        let encoded_data = match ContentKind::from_original_kind(original_kind) {
            ContentKind::Text => strategy.encrypt_to_base64(plaintext, password)?,
            ContentKind::Binary => {
                let mut transcoded = BASE64.encode(plaintext);
                let sealed = strategy.encrypt_to_base64(transcoded.as_bytes(), password);
                transcoded.zeroize();
                sealed?
            }
        };

        Ok(Self {
            version: version.to_string(),
            hint: hint.to_string(),
            encoded_data,
            original_kind: original_kind.map(str::to_string),
        })
    }

    /// Decrypt back to the original bytes.
    ///
    /// Empty `encodedData` short-circuits to empty plaintext without any
    /// crypto.  An unknown version is `UnsupportedVersion`, distinct from
    /// the `AuthenticationFailed` of a wrong password.
    pub fn open(&self, password: &str) -> Result<Vec<u8>> {
        if self.encoded_data.is_empty() {
            return Ok(Vec::new());
        }

        let strategy = strategy_for_or_err(&self.version)?;
        let mut decrypted = strategy.decrypt_from_base64(&self.encoded_data, password)?;

        match self.content_kind() {
            ContentKind::Text => Ok(decrypted),
            ContentKind::Binary => {
                let bytes = BASE64.decode(&decrypted).map_err(|e| {
                    NotelockError::InvalidContent(format!("binary payload is not base64: {e}"))
                });
                decrypted.zeroize();
                bytes
            }
        }
    }

    /// Decrypt a text envelope into a `String`.
    pub fn open_text(&self, password: &str) -> Result<String> {
        let bytes = self.open(password)?;
        String::from_utf8(bytes).map_err(|e| {
            let mut bad = e.into_bytes();
            bad.zeroize();
            NotelockError::InvalidContent("decrypted text is not valid UTF-8".into())
        })
    }
}
