//! Clap argument parser and the terminal side of the CLI.

pub mod commands;
pub mod output;
pub mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::Settings;
use crate::context::Context;
use crate::errors::{NotelockError, Result};
use crate::store::{Document, FsStore};

pub use output::ConsoleNotifier;
pub use prompt::DialoguerPrompter;

/// Environment variable read for passwords before prompting.
pub const PASSWORD_ENV: &str = "NOTELOCK_PASSWORD";

/// Same, for the new password of `change-password`.
pub const NEW_PASSWORD_ENV: &str = "NOTELOCK_NEW_PASSWORD";

/// Notelock CLI: password-encrypted notes in a plain folder vault.
#[derive(Parser)]
#[command(
    name = "notelock",
    about = "Password-encrypted notes and assets in a folder vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault root directory (default: current directory)
    #[arg(long, default_value = ".", global = true)]
    pub vault: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty encrypted note
    New {
        /// Vault-relative path (the encrypted extension is added if missing)
        path: String,
        /// Hint stored next to the ciphertext
        #[arg(long)]
        hint: Option<String>,
    },

    /// Encrypt one document in place of the original
    Encrypt {
        /// Vault-relative path of the plain document
        path: String,
        /// Hint stored next to the ciphertext
        #[arg(long)]
        hint: Option<String>,
    },

    /// Decrypt one document back to its original form
    Decrypt {
        /// Vault-relative path of the encrypted document
        path: String,
    },

    /// Print a decrypted note
    Cat {
        /// Vault-relative path of the encrypted document
        path: String,
    },

    /// Edit a decrypted note in $VISUAL / $EDITOR, re-encrypting on save
    Edit {
        /// Vault-relative path of the encrypted document
        path: String,
    },

    /// Re-encrypt a document with a new password
    ChangePassword {
        /// Vault-relative path of the encrypted document
        path: String,
        /// New hint (keeps the current one if omitted)
        #[arg(long)]
        hint: Option<String>,
    },

    /// Encrypt every plain note and image in the vault
    EncryptAll {
        /// Extra ignore patterns (added to bulk_ignore_paths)
        #[arg(long)]
        ignore: Vec<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Decrypt every encrypted document in the vault
    DecryptAll {
        /// Extra ignore patterns (added to bulk_ignore_paths)
        #[arg(long)]
        ignore: Vec<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check which external password files can be read
    CheckPaths,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// The vault root from the CLI arguments, which must exist.
pub fn vault_root(cli: &Cli) -> Result<PathBuf> {
    let root = PathBuf::from(&cli.vault);
    if !root.is_dir() {
        return Err(NotelockError::ConfigError(format!(
            "vault directory '{}' does not exist",
            root.display()
        )));
    }
    Ok(root)
}

/// Load settings and build the process context for a command.
pub async fn load_context(cli: &Cli) -> Result<Context> {
    let root = vault_root(cli)?;
    let settings = Settings::load(&root)?;
    let store = Arc::new(FsStore::new(root));
    Ok(Context::new(store, Arc::new(ConsoleNotifier), settings).await)
}

/// Turn a user-supplied path into a vault-relative document.
///
/// Rejects paths that leave the vault.
pub fn document_arg(path: &str) -> Result<Document> {
    let doc = Document::new(path);
    if doc.path().is_empty() || doc.path().split('/').any(|part| part == "..") {
        return Err(NotelockError::CommandFailed(format!(
            "'{path}' is not a path inside the vault"
        )));
    }
    Ok(doc)
}
