use thiserror::Error;

/// All errors that can occur in Notelock.
#[derive(Debug, Error)]
pub enum NotelockError {
    // --- Envelope errors ---
    #[error("Not an encrypted envelope: {0}")]
    EnvelopeFormat(String),

    #[error(
        "Unsupported envelope version '{0}' (supported: {supported})",
        supported = crate::crypto::supported_versions().collect::<Vec<_>>().join(", ")
    )]
    UnsupportedVersion(String),

    // --- Crypto errors ---
    #[error("Decryption failed: wrong password or corrupted data")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Store errors ---
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document already exists: {0}")]
    DocumentExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Session errors ---
    #[error("Session for '{0}' is closed")]
    SessionClosed(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Document is already encrypted: {0}")]
    AlreadyEncrypted(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Editor error: {0}")]
    EditorError(String),
}

impl NotelockError {
    /// Wrong password or tampered ciphertext; the caller may re-prompt.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NotelockError::AuthenticationFailed)
    }

    /// The user backed out. Not a failure, nothing was changed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NotelockError::UserCancelled)
    }
}

/// Convenience type alias for Notelock results.
pub type Result<T> = std::result::Result<T, NotelockError>;
