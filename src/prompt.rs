//! Password prompting collaborator.
//!
//! The core never draws a dialog.  Interactive flows that need a
//! password ask a `PasswordPrompter`; returning `None` means the user
//! cancelled, which aborts only the operation that asked.

use async_trait::async_trait;

use crate::cache::Credential;
use crate::store::Document;

/// What the prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Unlock existing ciphertext; no confirmation, hint is read-only.
    Decrypt,
    /// Choose a password for new ciphertext; may confirm and edit the hint.
    Encrypt,
}

#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub title: String,
    pub purpose: PromptPurpose,
    /// Ask for the password twice.
    pub confirm: bool,
    /// Hint to display (decrypt) or pre-fill (encrypt).
    pub hint: String,
    /// Document the prompt concerns, if any.
    pub document: Option<Document>,
    /// How many wrong passwords were entered before this prompt.
    pub failed_attempts: u32,
}

impl PromptRequest {
    pub fn decrypt(title: impl Into<String>, doc: &Document, hint: &str) -> Self {
        Self {
            title: title.into(),
            purpose: PromptPurpose::Decrypt,
            confirm: false,
            hint: hint.to_string(),
            document: Some(doc.clone()),
            failed_attempts: 0,
        }
    }

    /// One password meant for many documents.
    pub fn decrypt_shared(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            purpose: PromptPurpose::Decrypt,
            confirm: false,
            hint: String::new(),
            document: None,
            failed_attempts: 0,
        }
    }

    pub fn encrypt(title: impl Into<String>, doc: Option<&Document>, confirm: bool) -> Self {
        Self {
            title: title.into(),
            purpose: PromptPurpose::Encrypt,
            confirm,
            hint: String::new(),
            document: doc.cloned(),
            failed_attempts: 0,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn after_failures(mut self, failed_attempts: u32) -> Self {
        self.failed_attempts = failed_attempts;
        self
    }
}

#[async_trait]
pub trait PasswordPrompter: Send + Sync {
    /// Ask the user for a credential; `None` on cancel.
    async fn request(&self, request: PromptRequest) -> Option<Credential>;
}
