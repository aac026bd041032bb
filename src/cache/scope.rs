//! Scoping levels and the cache keys they derive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::NotelockError;
use crate::store::Document;

/// How widely a remembered password applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeLevel {
    /// One password for every document.
    #[default]
    Vault,
    /// One password per containing folder.
    #[serde(alias = "path")]
    Folder,
    /// One password per document.
    #[serde(alias = "filename")]
    File,
    /// The password is the content of a secondary document, read on demand.
    ExternalFile,
}

/// Cache lookup key.  `ExternalFile` has none: its secret is never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Vault,
    Folder(String),
    File(String),
}

impl ScopeLevel {
    /// The key `doc` maps to under this level.
    ///
    /// File keys drop the extension, so `a.md` and its encrypted
    /// `a.mdenc` share an entry across conversion.
    pub fn key_for(&self, doc: &Document) -> Option<ScopeKey> {
        match self {
            ScopeLevel::Vault => Some(ScopeKey::Vault),
            ScopeLevel::Folder => Some(ScopeKey::Folder(doc.parent().to_string())),
            ScopeLevel::File => Some(ScopeKey::File(doc.stem_path().to_string())),
            ScopeLevel::ExternalFile => None,
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScopeLevel::Vault => "vault",
            ScopeLevel::Folder => "folder",
            ScopeLevel::File => "file",
            ScopeLevel::ExternalFile => "external-file",
        };
        f.write_str(s)
    }
}

impl FromStr for ScopeLevel {
    type Err = NotelockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vault" => Ok(ScopeLevel::Vault),
            "folder" | "path" => Ok(ScopeLevel::Folder),
            "file" | "filename" => Ok(ScopeLevel::File),
            "external-file" => Ok(ScopeLevel::ExternalFile),
            other => Err(NotelockError::ConfigError(format!(
                "unknown password scope '{other}' (expected vault, folder, file or external-file)"
            ))),
        }
    }
}
