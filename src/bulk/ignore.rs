//! Glob-style ignore patterns for bulk runs.
//!
//! - `*` matches any run of characters except `/`
//! - `**` matches any run of characters including `/`
//! - a pattern ending in `/**` matches everything under that prefix
//! - any other pattern must match the whole path

use regex::Regex;

use crate::errors::{NotelockError, Result};
use crate::store::Document;

#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<(String, Regex)>,
}

impl IgnorePatterns {
    /// Compile `patterns`.  Blank entries are skipped.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let regex = Regex::new(&translate(pattern)).map_err(|e| {
                NotelockError::ConfigError(format!("invalid ignore pattern '{pattern}': {e}"))
            })?;
            compiled.push((pattern.to_string(), regex));
        }
        Ok(Self { patterns: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// The first pattern matching `doc`, if any.
    pub fn matching(&self, doc: &Document) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(doc.path()))
            .map(|(pattern, _)| pattern.as_str())
    }

    pub fn is_ignored(&self, doc: &Document) -> bool {
        self.matching(doc).is_some()
    }
}

/// Glob to anchored regex source.
fn translate(pattern: &str) -> String {
    let pattern = pattern.replace('\\', "/");
    let (body, prefix_only) = match pattern.strip_suffix("/**") {
        Some(prefix) => (format!("{prefix}/"), true),
        None => (pattern, false),
    };

    let mut out = String::from("^");
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                out.push_str(".*");
            } else {
                out.push_str("[^/]*");
            }
        } else {
            out.push_str(&regex::escape(&c.to_string()));
        }
    }
    if !prefix_only {
        out.push('$');
    }
    out
}
