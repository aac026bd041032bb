//! Vault-relative document paths.
//!
//! Paths always use `/` separators and never start with one, whatever
//! the host platform.  `Document` only wraps the path; content is
//! fetched through a `DocumentStore`.

use std::fmt;

/// A document addressed by its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Document {
    path: String,
}

impl Document {
    /// Wrap a path, normalizing separators and stray slashes.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: normalize(path.as_ref()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The containing folder, `""` for documents at the vault root.
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[idx + 1..],
            None => &self.path,
        }
    }

    /// Extension after the last `.` of the name, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Name without its extension.
    pub fn basename(&self) -> &str {
        let name = self.name();
        match self.extension() {
            Some(ext) => &name[..name.len() - ext.len() - 1],
            None => name,
        }
    }

    /// Full path without the extension (`notes/a.md` → `notes/a`).
    pub fn stem_path(&self) -> &str {
        match self.extension() {
            Some(ext) => &self.path[..self.path.len() - ext.len() - 1],
            None => &self.path,
        }
    }

    /// Same folder and basename, different extension.
    pub fn with_extension(&self, extension: &str) -> Document {
        Document::new(format!("{}.{extension}", self.stem_path()))
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for Document {
    fn from(path: &str) -> Self {
        Document::new(path)
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}
