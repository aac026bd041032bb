//! Terminal password prompts.

use async_trait::async_trait;
use zeroize::Zeroizing;

use super::output;
use super::{NEW_PASSWORD_ENV, PASSWORD_ENV};
use crate::cache::Credential;
use crate::prompt::{PasswordPrompter, PromptPurpose, PromptRequest};

/// Asks on the terminal with dialoguer.
///
/// The password environment variable answers the first request without
/// prompting.  A repeated request means that password was wrong, so the
/// terminal is used from then on.
#[derive(Debug)]
pub struct DialoguerPrompter {
    /// Hint used for new passwords instead of asking.
    pub default_hint: Option<String>,
    env_var: &'static str,
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self {
            default_hint: None,
            env_var: PASSWORD_ENV,
        }
    }
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hint(hint: Option<&str>) -> Self {
        Self {
            default_hint: hint.map(str::to_string),
            ..Self::default()
        }
    }

    /// For the replacement password of a password change.
    pub fn for_new_password(hint: Option<&str>) -> Self {
        Self {
            default_hint: hint.map(str::to_string),
            env_var: NEW_PASSWORD_ENV,
        }
    }
}

#[async_trait]
impl PasswordPrompter for DialoguerPrompter {
    async fn request(&self, request: PromptRequest) -> Option<Credential> {
        if request.failed_attempts == 0 {
            if let Some(password) = password_from_env(self.env_var) {
                let hint = self.hint_for(&request);
                return Some(Credential::new(password.as_str(), hint));
            }
        }

        let default_hint = self.default_hint.clone();
        let answer = tokio::task::spawn_blocking(move || ask(&request, default_hint)).await;
        match answer {
            Ok(credential) => credential,
            Err(e) => {
                output::error(&format!("password prompt failed: {e}"));
                None
            }
        }
    }
}

impl DialoguerPrompter {
    fn hint_for(&self, request: &PromptRequest) -> String {
        match request.purpose {
            PromptPurpose::Decrypt => request.hint.clone(),
            PromptPurpose::Encrypt => self
                .default_hint
                .clone()
                .unwrap_or_else(|| request.hint.clone()),
        }
    }
}

fn password_from_env(var: &str) -> Option<Zeroizing<String>> {
    match std::env::var(var) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}

/// Blocking terminal dialog.  `None` on cancel or a closed terminal.
fn ask(request: &PromptRequest, default_hint: Option<String>) -> Option<Credential> {
    if request.failed_attempts > 0 {
        output::warning("Wrong password, try again (Ctrl-C or an empty password cancels).");
    }
    if !request.hint.is_empty() && request.purpose == PromptPurpose::Decrypt {
        output::tip(&format!("Hint: {}", request.hint));
    }

    let mut dialog = dialoguer::Password::new().with_prompt(request.title.as_str());
    if request.purpose == PromptPurpose::Encrypt && request.confirm {
        dialog = dialog.with_confirmation("Confirm password", "Passwords do not match, try again");
    }
    let password = Zeroizing::new(dialog.allow_empty_password(true).interact().ok()?);
    if password.is_empty() {
        return None;
    }

    let hint = match request.purpose {
        PromptPurpose::Decrypt => request.hint.clone(),
        PromptPurpose::Encrypt => match default_hint {
            Some(hint) => hint,
            None => dialoguer::Input::<String>::new()
                .with_prompt("Hint (optional)")
                .with_initial_text(request.hint.clone())
                .allow_empty(true)
                .interact_text()
                .ok()?,
        },
    };

    Some(Credential::new(password.as_str(), hint))
}
