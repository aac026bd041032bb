use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{PasswordCache, ScopeLevel};
use crate::errors::{NotelockError, Result};
use crate::session::SavePolicy;
use crate::store::Document;

/// Bounds for `save_delay_secs`.
pub const MIN_SAVE_DELAY_SECS: u64 = 1;
pub const MAX_SAVE_DELAY_SECS: u64 = 30;

/// Save policy names as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavePolicyKind {
    Immediate,
    #[default]
    Delayed,
    Manual,
}

/// Vault-level configuration, loaded from `.notelock.toml`.
///
/// Every field has a sensible default so Notelock works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Ask for new passwords twice when encrypting.
    #[serde(default = "default_true")]
    pub confirm_password: bool,

    /// Remember passwords for the rest of the process.
    #[serde(default = "default_true")]
    pub remember_password: bool,

    /// Minutes a remembered password lives after last use (0 = until exit).
    #[serde(default)]
    pub remember_password_timeout: u32,

    /// How widely a remembered password applies.
    #[serde(default)]
    pub remember_password_level: ScopeLevel,

    /// Vault-relative files whose content is the password (external-file level).
    #[serde(default)]
    pub external_file_paths: Vec<String>,

    #[serde(default)]
    pub save_policy: SavePolicyKind,

    /// Debounce delay for the delayed policy, 1 to 30 seconds.
    #[serde(default = "default_save_delay_secs")]
    pub save_delay_secs: u64,

    /// Glob patterns excluded from encrypt-all / decrypt-all.
    #[serde(default)]
    pub bulk_ignore_paths: Vec<String>,

    /// Extension given to documents converted to encrypted form.
    #[serde(default = "default_encrypted_extension")]
    pub encrypted_extension: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_save_delay_secs() -> u64 {
    2
}

fn default_encrypted_extension() -> String {
    "mdenc".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            confirm_password: true,
            remember_password: true,
            remember_password_timeout: 0,
            remember_password_level: ScopeLevel::default(),
            external_file_paths: Vec::new(),
            save_policy: SavePolicyKind::default(),
            save_delay_secs: default_save_delay_secs(),
            bulk_ignore_paths: Vec::new(),
            encrypted_extension: default_encrypted_extension(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the vault root.
    pub const FILE_NAME: &'static str = ".notelock.toml";

    /// Load settings from `<vault_root>/.notelock.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or holds out-of-range
    /// values, an error is returned.
    pub fn load(vault_root: &Path) -> Result<Self> {
        let config_path = vault_root.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            NotelockError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAVE_DELAY_SECS..=MAX_SAVE_DELAY_SECS).contains(&self.save_delay_secs) {
            return Err(NotelockError::ConfigError(format!(
                "save_delay_secs must be between {MIN_SAVE_DELAY_SECS} and {MAX_SAVE_DELAY_SECS} (got {})",
                self.save_delay_secs
            )));
        }

        let ext = self.encrypted_extension.as_str();
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(NotelockError::ConfigError(format!(
                "encrypted_extension '{ext}' must be a bare extension like \"mdenc\""
            )));
        }

        if self.remember_password_level == ScopeLevel::ExternalFile
            && self.external_file_paths.iter().all(|p| p.trim().is_empty())
        {
            return Err(NotelockError::ConfigError(
                "external-file password level needs at least one external_file_paths entry".into(),
            ));
        }

        Ok(())
    }

    /// Runtime save policy for sessions.
    pub fn save_policy(&self) -> SavePolicy {
        match self.save_policy {
            SavePolicyKind::Immediate => SavePolicy::Immediate,
            SavePolicyKind::Delayed => SavePolicy::Delayed(Duration::from_secs(
                self.save_delay_secs
                    .clamp(MIN_SAVE_DELAY_SECS, MAX_SAVE_DELAY_SECS),
            )),
            SavePolicyKind::Manual => SavePolicy::Manual,
        }
    }

    /// External secret sources as documents, blank lines dropped.
    pub fn external_documents(&self) -> Vec<Document> {
        self.external_file_paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(Document::new)
            .collect()
    }

    /// Push the remember-password settings into a cache.
    pub async fn apply_to(&self, cache: &PasswordCache) {
        cache.set_active(self.remember_password).await;
        cache.set_level(self.remember_password_level).await;
        cache.set_auto_expire(self.remember_password_timeout).await;
        cache.set_external_file_paths(self.external_documents()).await;
    }
}

// ── Tests ────────────────────────────────────────────────────────────
