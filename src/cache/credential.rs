//! Password + hint pairs.

use std::fmt;

use zeroize::Zeroizing;

/// A password paired with its user-visible hint.
///
/// An empty password is the "unknown" sentinel returned by cache misses.
/// The password is wiped from memory on drop and never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    password: Zeroizing<String>,
    pub hint: String,
}

impl Credential {
    pub fn new(password: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            hint: hint.into(),
        }
    }

    /// The "unknown password" sentinel.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Sentinel carrying a hint, as shown when prompting for a document.
    pub fn unknown_with_hint(hint: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(String::new()),
            hint: hint.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_unknown(&self) -> bool {
        self.password.is_empty()
    }

    /// Same password, different hint.
    pub fn with_hint(&self, hint: impl Into<String>) -> Self {
        Self {
            password: self.password.clone(),
            hint: hint.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("password", &if self.is_unknown() { "" } else { "***" })
            .field("hint", &self.hint)
            .finish()
    }
}
