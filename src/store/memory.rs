//! In-memory document store.
//!
//! Used by embedding hosts that keep documents elsewhere and by tests.
//! Writes can be made to fail per document to exercise I/O error paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Document, DocumentStore};
use crate::errors::{NotelockError, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Vec<u8>>>,
    failing: RwLock<HashSet<String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(path, content)` pairs.
    pub fn with_documents<I, P, C>(docs: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let map = docs
            .into_iter()
            .map(|(p, c)| (Document::new(p).path().to_string(), c.into()))
            .collect();
        Self {
            docs: RwLock::new(map),
            ..Self::default()
        }
    }

    /// Make every subsequent write/create/delete touching `doc` fail.
    pub async fn fail_writes(&self, doc: &Document) {
        self.failing.write().await.insert(doc.path().to_string());
    }

    pub async fn heal(&self, doc: &Document) {
        self.failing.write().await.remove(doc.path());
    }

    /// Number of successful `write` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn check_writable(&self, doc: &Document) -> Result<()> {
        if self.failing.read().await.contains(doc.path()) {
            return Err(NotelockError::Io(std::io::Error::other(format!(
                "simulated write failure for {doc}"
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, doc: &Document) -> Result<Vec<u8>> {
        self.docs
            .read()
            .await
            .get(doc.path())
            .cloned()
            .ok_or_else(|| NotelockError::DocumentNotFound(doc.to_string()))
    }

    async fn write(&self, doc: &Document, data: &[u8]) -> Result<()> {
        self.check_writable(doc).await?;
        let mut docs = self.docs.write().await;
        let slot = docs
            .get_mut(doc.path())
            .ok_or_else(|| NotelockError::DocumentNotFound(doc.to_string()))?;
        *slot = data.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create(&self, doc: &Document, data: &[u8]) -> Result<()> {
        self.check_writable(doc).await?;
        let mut docs = self.docs.write().await;
        if docs.contains_key(doc.path()) {
            return Err(NotelockError::DocumentExists(doc.to_string()));
        }
        docs.insert(doc.path().to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, doc: &Document) -> Result<()> {
        self.check_writable(doc).await?;
        self.docs
            .write()
            .await
            .remove(doc.path())
            .map(|_| ())
            .ok_or_else(|| NotelockError::DocumentNotFound(doc.to_string()))
    }

    async fn rename(&self, from: &Document, to: &Document) -> Result<()> {
        self.check_writable(from).await?;
        let mut docs = self.docs.write().await;
        if docs.contains_key(to.path()) {
            return Err(NotelockError::DocumentExists(to.to_string()));
        }
        let data = docs
            .remove(from.path())
            .ok_or_else(|| NotelockError::DocumentNotFound(from.to_string()))?;
        docs.insert(to.path().to_string(), data);
        Ok(())
    }

    async fn enumerate(&self) -> Result<Vec<Document>> {
        Ok(self.docs.read().await.keys().map(Document::new).collect())
    }

    async fn exists(&self, doc: &Document) -> Result<bool> {
        Ok(self.docs.read().await.contains_key(doc.path()))
    }
}
