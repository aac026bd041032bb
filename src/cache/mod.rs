//! Password scope cache.
//!
//! One `PasswordCache` lives for the whole process.  It is created at
//! startup, shared by `Arc` with every session and the bulk engine, and
//! emptied with `clear_all` on shutdown.
//!
//! All mutations happen under a single write lock, so a `rename` racing
//! a `get` on either key is observed entirely before or entirely after.
//! Expiry is evaluated on every `get`; there is no background sweeper.

pub mod credential;
pub mod scope;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{Document, DocumentStore};

pub use credential::Credential;
pub use scope::{ScopeKey, ScopeLevel};

/// Source of "now"; swapped out in tests to simulate time passing.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
struct CacheEntry {
    credential: Credential,
    refreshed_at: DateTime<Utc>,
}

#[derive(Debug)]
struct CacheState {
    active: bool,
    level: ScopeLevel,
    /// `None` keeps entries until process end.
    timeout: Option<Duration>,
    external_paths: Vec<Document>,
    entries: HashMap<ScopeKey, CacheEntry>,
}

impl CacheState {
    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match self.timeout {
            Some(timeout) => now >= entry.refreshed_at + timeout,
            None => false,
        }
    }
}

/// Process-lifetime store of remembered passwords keyed by scope.
pub struct PasswordCache {
    state: RwLock<CacheState>,
    store: Arc<dyn DocumentStore>,
    clock: Clock,
}

impl PasswordCache {
    /// A cache at vault level with no expiry.
    ///
    /// `store` is only used to read external secret files.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: Arc<dyn DocumentStore>, clock: Clock) -> Self {
        Self {
            state: RwLock::new(CacheState {
                active: true,
                level: ScopeLevel::default(),
                timeout: None,
                external_paths: Vec::new(),
                entries: HashMap::new(),
            }),
            store,
            clock,
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Remembered credential for `doc`, or the unknown sentinel.
    pub async fn get(&self, doc: &Document) -> Credential {
        let (key, external_paths) = {
            let state = self.state.read().await;
            if !state.active {
                return Credential::unknown();
            }
            match state.level.key_for(doc) {
                Some(key) => {
                    let now = (self.clock)();
                    match state.entries.get(&key) {
                        Some(entry) if !state.is_expired(entry, now) => {
                            return entry.credential.clone();
                        }
                        Some(_) => (Some(key), Vec::new()),
                        None => return Credential::unknown(),
                    }
                }
                None => (None, state.external_paths.clone()),
            }
        };

        match key {
            Some(key) => {
                self.evict_if_expired(&key).await;
                Credential::unknown()
            }
            None => self.fetch_external(&external_paths).await,
        }
    }

    async fn evict_if_expired(&self, key: &ScopeKey) {
        let mut state = self.state.write().await;
        let now = (self.clock)();
        // Re-check: a put may have refreshed it since the read lock dropped.
        let expired = state
            .entries
            .get(key)
            .is_some_and(|entry| state.is_expired(entry, now));
        if expired {
            state.entries.remove(key);
            debug!(?key, "password cache entry expired");
        }
    }

    /// First readable, non-empty external secret file wins.
    async fn fetch_external(&self, paths: &[Document]) -> Credential {
        for path in paths {
            match self.read_secret(path).await {
                Some(password) => return Credential::new(password, ""),
                None => debug!(path = %path, "external secret unavailable"),
            }
        }
        Credential::unknown()
    }

    async fn read_secret(&self, path: &Document) -> Option<String> {
        let bytes = self.store.read(path).await.ok()?;
        let text = String::from_utf8(bytes).ok()?;
        let secret = text.trim_end_matches(['\r', '\n']);
        if secret.is_empty() {
            None
        } else {
            Some(secret.to_string())
        }
    }

    /// Whether `path` could serve as an external secret right now.
    /// The content is read and discarded, never cached.
    pub async fn can_fetch_contents(&self, path: &Document) -> bool {
        self.read_secret(path).await.is_some()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Remember `credential` for `doc` under the current level.
    ///
    /// Starts or refreshes the entry's expiry.  No-op when inactive, at
    /// external-file level, or for the unknown sentinel.
    pub async fn put(&self, credential: &Credential, doc: &Document) {
        if credential.is_unknown() {
            return;
        }
        let mut state = self.state.write().await;
        if !state.active {
            return;
        }
        if let Some(key) = state.level.key_for(doc) {
            let refreshed_at = (self.clock)();
            state.entries.insert(
                key,
                CacheEntry {
                    credential: credential.clone(),
                    refreshed_at,
                },
            );
        }
    }

    /// Forget the entry `doc` maps to.
    pub async fn clear(&self, doc: &Document) {
        let mut state = self.state.write().await;
        if let Some(key) = state.level.key_for(doc) {
            state.entries.remove(&key);
        }
    }

    /// Move the entry for `old` to the key for `new`.
    pub async fn rename(&self, old: &Document, new: &Document) {
        let mut state = self.state.write().await;
        let (Some(old_key), Some(new_key)) = (state.level.key_for(old), state.level.key_for(new))
        else {
            return;
        };
        if old_key == new_key {
            return;
        }
        if let Some(entry) = state.entries.remove(&old_key) {
            state.entries.insert(new_key, entry);
            debug!(from = %old, to = %new, "password cache entry re-keyed");
        }
    }

    /// Forget everything.  Called at shutdown.
    pub async fn clear_all(&self) {
        self.state.write().await.entries.clear();
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub async fn level(&self) -> ScopeLevel {
        self.state.read().await.level
    }

    /// Switch scoping level.  Entries keyed under the old level are dropped.
    pub async fn set_level(&self, level: ScopeLevel) {
        let mut state = self.state.write().await;
        if state.level != level {
            state.level = level;
            state.entries.clear();
        }
    }

    /// Entry lifetime in minutes since last refresh; 0 keeps entries
    /// until process end.
    pub async fn set_auto_expire(&self, minutes: u32) {
        let mut state = self.state.write().await;
        state.timeout = if minutes == 0 {
            None
        } else {
            Some(Duration::minutes(i64::from(minutes)))
        };
    }

    /// Turn remembering on or off; turning it off forgets everything.
    pub async fn set_active(&self, active: bool) {
        let mut state = self.state.write().await;
        state.active = active;
        if !active {
            state.entries.clear();
        }
    }

    pub async fn is_active(&self) -> bool {
        self.state.read().await.active
    }

    pub async fn set_external_file_paths(&self, paths: Vec<Document>) {
        self.state.write().await.external_paths = paths;
    }

    /// Cache key for `doc` under the current level.
    pub async fn scope_key(&self, doc: &Document) -> Option<ScopeKey> {
        self.state.read().await.level.key_for(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cache() -> PasswordCache {
        PasswordCache::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn miss_is_sentinel() {
        let c = cache();
        assert!(c.get(&Document::new("a.md")).await.is_unknown());
    }

    #[tokio::test]
    async fn vault_level_shares_everywhere() {
        let c = cache();
        c.put(&Credential::new("pw", "h"), &Document::new("x/a.md")).await;
        assert_eq!(c.get(&Document::new("y/z/b.md")).await.password(), "pw");
    }

    #[tokio::test]
    async fn inactive_cache_forgets() {
        let c = cache();
        c.put(&Credential::new("pw", ""), &Document::new("a.md")).await;
        c.set_active(false).await;
        assert!(c.get(&Document::new("a.md")).await.is_unknown());
        c.put(&Credential::new("pw", ""), &Document::new("a.md")).await;
        c.set_active(true).await;
        assert!(c.get(&Document::new("a.md")).await.is_unknown());
    }

    #[tokio::test]
    async fn sentinel_is_never_stored() {
        let c = cache();
        c.put(&Credential::unknown_with_hint("h"), &Document::new("a.md")).await;
        assert!(c.get(&Document::new("a.md")).await.hint.is_empty());
    }

    #[tokio::test]
    async fn level_change_drops_entries() {
        let c = cache();
        c.put(&Credential::new("pw", ""), &Document::new("a.md")).await;
        c.set_level(ScopeLevel::Folder).await;
        c.set_level(ScopeLevel::Vault).await;
        assert!(c.get(&Document::new("a.md")).await.is_unknown());
    }
}
