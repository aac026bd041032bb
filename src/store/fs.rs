//! Directory-backed document store.
//!
//! Writes go to a temp file in the same directory followed by a rename,
//! so a crash mid-save leaves the previous content intact.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{Document, DocumentStore};
use crate::errors::{NotelockError, Result};

/// A vault rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a document onto the filesystem, refusing to escape the root.
    fn resolve(&self, doc: &Document) -> Result<PathBuf> {
        let relative = Path::new(doc.path());
        if doc.path().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(NotelockError::DocumentNotFound(format!(
                "invalid document path '{doc}'"
            )));
        }
        Ok(self.root.join(relative))
    }

    fn map_not_found(doc: &Document, e: std::io::Error) -> NotelockError {
        if e.kind() == ErrorKind::NotFound {
            NotelockError::DocumentNotFound(doc.to_string())
        } else {
            NotelockError::Io(e)
        }
    }

    async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
        // Same directory so the rename never crosses filesystems; one temp
        // name per write so concurrent writers never share a file.
        let parent = path.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.{:016x}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy(),
            rand::random::<u64>()
        ));

        fs::write(&tmp_path, data).await?;
        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn read(&self, doc: &Document) -> Result<Vec<u8>> {
        let path = self.resolve(doc)?;
        fs::read(&path).await.map_err(|e| Self::map_not_found(doc, e))
    }

    async fn write(&self, doc: &Document, data: &[u8]) -> Result<()> {
        let path = self.resolve(doc)?;
        if !fs::try_exists(&path).await? {
            return Err(NotelockError::DocumentNotFound(doc.to_string()));
        }
        Self::write_atomic(&path, data).await?;
        debug!(doc = %doc, bytes = data.len(), "wrote document");
        Ok(())
    }

    async fn create(&self, doc: &Document, data: &[u8]) -> Result<()> {
        let path = self.resolve(doc)?;
        if fs::try_exists(&path).await? {
            return Err(NotelockError::DocumentExists(doc.to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Self::write_atomic(&path, data).await?;
        debug!(doc = %doc, bytes = data.len(), "created document");
        Ok(())
    }

    async fn delete(&self, doc: &Document) -> Result<()> {
        let path = self.resolve(doc)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Self::map_not_found(doc, e))
    }

    async fn rename(&self, from: &Document, to: &Document) -> Result<()> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;
        if fs::try_exists(&dst).await? {
            return Err(NotelockError::DocumentExists(to.to_string()));
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&src, &dst)
            .await
            .map_err(|e| Self::map_not_found(from, e))
    }

    /// Walks the tree, skipping hidden files and folders (`.git`, temp files).
    async fn enumerate(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if name.to_string_lossy().starts_with('.') {
                    continue;
                }
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    if let Ok(relative) = path.strip_prefix(&self.root) {
                        docs.push(Document::new(relative.to_string_lossy()));
                    }
                }
            }
        }

        docs.sort();
        Ok(docs)
    }

    async fn exists(&self, doc: &Document) -> Result<bool> {
        let path = self.resolve(doc)?;
        Ok(fs::try_exists(&path).await?)
    }
}
