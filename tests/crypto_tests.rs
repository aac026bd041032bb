//! Integration tests for the envelope codec and strategy registry.

use notelock::crypto::{default_strategy, strategy_for, strategy_for_or_err, DEFAULT_VERSION};
use notelock::envelope::{looks_encrypted, Envelope};
use notelock::errors::NotelockError;

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn text_round_trip() {
    let plaintext = "# Diary\n\nNothing happened today. ünïcödé too.";
    let envelope = Envelope::seal(plaintext.as_bytes(), "correct horse", "usual", Some("md"))
        .expect("seal should succeed");

    let wire = envelope.encode().expect("encode");
    let decoded = Envelope::decode(&wire).expect("decode");
    assert_eq!(decoded, envelope);
    assert_eq!(decoded.open_text("correct horse").unwrap(), plaintext);
}

#[test]
fn empty_content_round_trip() {
    let envelope = Envelope::seal(b"", "pw", "", Some("md")).unwrap();
    assert_eq!(envelope.open_text("pw").unwrap(), "");
}

#[test]
fn empty_encoded_data_skips_crypto() {
    let envelope = Envelope::decode("").unwrap();
    assert_eq!(envelope.version, DEFAULT_VERSION);
    assert!(envelope.encoded_data.is_empty());
    // Any password "opens" the empty sentinel.
    assert!(envelope.open("whatever").unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn wrong_password_is_authentication_failure() {
    let envelope = Envelope::seal(b"secret", "right", "", None).unwrap();
    let err = envelope.open("wrong").unwrap_err();
    assert!(matches!(err, NotelockError::AuthenticationFailed));
    assert!(err.is_recoverable());
}

#[test]
fn tampered_ciphertext_is_authentication_failure() {
    let mut envelope = Envelope::seal(b"secret", "pw", "", None).unwrap();
    let mut chars: Vec<char> = envelope.encoded_data.chars().collect();
    let last = chars.len() - 3;
    chars[last] = if chars[last] == 'A' { 'B' } else { 'A' };
    envelope.encoded_data = chars.into_iter().collect();

    assert!(matches!(
        envelope.open("pw"),
        Err(NotelockError::AuthenticationFailed)
    ));
}

#[test]
fn identical_inputs_encrypt_differently() {
    let a = Envelope::seal(b"same", "pw", "", None).unwrap();
    let b = Envelope::seal(b"same", "pw", "", None).unwrap();
    assert_ne!(
        a.encoded_data, b.encoded_data,
        "fresh salt and nonce must be drawn every time"
    );
}

#[test]
fn unknown_version_is_rejected_both_ways() {
    assert!(strategy_for("9.9").is_none());
    assert!(matches!(
        strategy_for_or_err("9.9"),
        Err(NotelockError::UnsupportedVersion(v)) if v == "9.9"
    ));

    let mut envelope = Envelope::seal(b"x", "pw", "", None).unwrap();
    envelope.version = "9.9".into();
    let err = envelope.open("pw").unwrap_err();
    assert!(matches!(err, NotelockError::UnsupportedVersion(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn default_strategy_is_current_version() {
    let (version, _) = default_strategy();
    assert_eq!(version, "2.0");
    assert!(strategy_for(version).is_some());
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[test]
fn wire_format_uses_camel_case_fields() {
    let envelope = Envelope::seal(b"x", "pw", "my hint", Some("md")).unwrap();
    let wire = envelope.encode().unwrap();
    let value: serde_json::Value = serde_json::from_str(&wire).unwrap();

    assert_eq!(value["version"], "2.0");
    assert_eq!(value["hint"], "my hint");
    assert_eq!(value["originalKind"], "md");
    assert!(value["encodedData"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(looks_encrypted(&wire));
}

#[test]
fn legacy_extension_field_is_accepted() {
    let sealed = Envelope::seal(b"old", "pw", "", Some("md")).unwrap();
    let legacy = format!(
        r#"{{"version":"2.0","hint":"","encodedData":"{}","originalFileExtension":"md"}}"#,
        sealed.encoded_data
    );
    let decoded = Envelope::decode(&legacy).unwrap();
    assert_eq!(decoded.original_kind.as_deref(), Some("md"));
    assert_eq!(decoded.open_text("pw").unwrap(), "old");
}

#[test]
fn plain_text_is_not_an_envelope() {
    assert!(!looks_encrypted("# Just a note"));
    assert!(matches!(
        Envelope::decode("# Just a note"),
        Err(NotelockError::EnvelopeFormat(_))
    ));
}
