//! Document storage seam.
//!
//! Notelock never owns storage.  Everything it reads or writes goes
//! through `DocumentStore`, implemented here for a directory on disk
//! (`FsStore`) and for tests and embedding hosts (`MemoryStore`).
//!
//! `write` must be all-or-nothing: after it returns, readers see either
//! the old bytes or the new bytes, never a mix.

pub mod document;
pub mod fs;
pub mod memory;

use async_trait::async_trait;

use crate::errors::Result;

pub use document::Document;
pub use fs::FsStore;
pub use memory::MemoryStore;

/// Storage operations the core consumes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document's full content.
    async fn read(&self, doc: &Document) -> Result<Vec<u8>>;

    /// Atomically replace an existing document's content.
    async fn write(&self, doc: &Document, data: &[u8]) -> Result<()>;

    /// Create a new document; fails with `DocumentExists` if present.
    async fn create(&self, doc: &Document, data: &[u8]) -> Result<()>;

    async fn delete(&self, doc: &Document) -> Result<()>;

    /// Move a document; fails with `DocumentExists` if `to` is taken.
    async fn rename(&self, from: &Document, to: &Document) -> Result<()>;

    /// Every document in the store, sorted by path.
    async fn enumerate(&self) -> Result<Vec<Document>>;

    async fn exists(&self, doc: &Document) -> Result<bool>;
}
