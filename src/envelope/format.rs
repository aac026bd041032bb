//! On-disk envelope format.
//!
//! An encrypted document is a pretty-printed JSON object:
//!
//! ```text
//! {
//!   "version": "2.0",
//!   "hint": "the usual one",
//!   "encodedData": "<base64 nonce|salt|ciphertext>",
//!   "originalKind": "md"
//! }
//! ```
//!
//! - **version**: selects the crypto strategy; unknown values are fatal.
//! - **hint**: shown to the user when prompting, never derived from the secret.
//! - **encodedData**: strategy output; `""` means empty plaintext.
//! - **originalKind**: extension of the document before encryption.
//!   Older writers used the key `originalFileExtension`.

use serde::{Deserialize, Serialize};

use crate::crypto::strategy::DEFAULT_VERSION;
use crate::errors::{NotelockError, Result};

/// The persisted, versioned container around one document's ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub version: String,

    #[serde(default)]
    pub hint: String,

    pub encoded_data: String,

    #[serde(
        default,
        alias = "originalFileExtension",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_kind: Option<String>,
}

impl Envelope {
    /// An envelope holding empty plaintext under the default version.
    pub fn empty() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            hint: String::new(),
            encoded_data: String::new(),
            original_kind: None,
        }
    }

    /// Parse the serialized form.
    ///
    /// Empty (or whitespace-only) input yields `Envelope::empty()`.
    /// Anything that is not an envelope object is `EnvelopeFormat`; the
    /// caller should then treat the content as plain data.
    pub fn decode(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }

        serde_json::from_str(trimmed).map_err(|e| NotelockError::EnvelopeFormat(e.to_string()))
    }

    /// Parse raw store bytes; non-UTF-8 input is not an envelope.
    pub fn decode_bytes(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|_| NotelockError::EnvelopeFormat("content is not UTF-8 text".into()))?;
        Self::decode(text)
    }

    /// Serialize to the wire form (two-space indented JSON).
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NotelockError::SerializationError(format!("envelope: {e}")))
    }
}

/// Content sniffing: does `text` look like an encrypted envelope?
///
/// True when the trimmed text is a JSON object with a non-empty
/// `version` and a non-empty string `encodedData`.  A plain note that
/// happens to be JSON with those same fields is indistinguishable from
/// a real envelope; that ambiguity is inherent to the format.
pub fn looks_encrypted(text: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text.trim()) else {
        return false;
    };

    let version_ok = value
        .get("version")
        .and_then(|v| v.as_str())
        .is_some_and(|v| !v.is_empty());
    let data_ok = value
        .get("encodedData")
        .and_then(|v| v.as_str())
        .is_some_and(|v| !v.is_empty());

    version_ok && data_ok
}

/// Byte-level variant of `looks_encrypted` for raw store content.
pub fn looks_encrypted_bytes(raw: &[u8]) -> bool {
    std::str::from_utf8(raw).is_ok_and(looks_encrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            version: "2.0".into(),
            hint: "pet name".into(),
            encoded_data: "QUJD".into(),
            original_kind: Some("md".into()),
        }
    }

    #[test]
    fn wire_field_names() {
        let json = sample().encode().unwrap();
        assert!(json.contains("\"version\": \"2.0\""));
        assert!(json.contains("\"hint\": \"pet name\""));
        assert!(json.contains("\"encodedData\": \"QUJD\""));
        assert!(json.contains("\"originalKind\": \"md\""));
    }

    #[test]
    fn encode_then_decode() {
        let env = sample();
        assert_eq!(Envelope::decode(&env.encode().unwrap()).unwrap(), env);
    }

    #[test]
    fn missing_kind_is_omitted() {
        let mut env = sample();
        env.original_kind = None;
        assert!(!env.encode().unwrap().contains("originalKind"));
    }

    #[test]
    fn empty_input_is_empty_envelope() {
        let env = Envelope::decode("  \n").unwrap();
        assert_eq!(env.version, DEFAULT_VERSION);
        assert_eq!(env.encoded_data, "");
        assert_eq!(env.hint, "");
    }

    #[test]
    fn legacy_extension_field_is_accepted() {
        let raw = r#"{"version":"2.0","hint":"","encodedData":"x","originalFileExtension":"png"}"#;
        let env = Envelope::decode(raw).unwrap();
        assert_eq!(env.original_kind.as_deref(), Some("png"));
    }

    #[test]
    fn malformed_input_is_format_error() {
        let err = Envelope::decode("# just a note").unwrap_err();
        assert!(matches!(err, NotelockError::EnvelopeFormat(_)));

        let err = Envelope::decode(r#"{"hint":"no version"}"#).unwrap_err();
        assert!(matches!(err, NotelockError::EnvelopeFormat(_)));
    }

    #[test]
    fn non_utf8_bytes_are_format_error() {
        assert!(Envelope::decode_bytes(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn sniffing() {
        assert!(looks_encrypted(&sample().encode().unwrap()));
        assert!(looks_encrypted("  {\"version\":\"2.0\",\"encodedData\":\"a\"}\n"));
        assert!(!looks_encrypted("{\"version\":\"2.0\",\"encodedData\":\"\"}"));
        assert!(!looks_encrypted("{\"version\":\"\",\"encodedData\":\"a\"}"));
        assert!(!looks_encrypted("{\"encodedData\":\"a\"}"));
        assert!(!looks_encrypted("[1, 2, 3]"));
        assert!(!looks_encrypted("# Heading\n\nbody"));
        assert!(!looks_encrypted(""));
    }
}
