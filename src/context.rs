//! The process-scoped bundle every session and bulk run is handed.
//!
//! One `Context` is built at startup.  Cloning it is cheap and shares the
//! same store, password cache and notifier.  `shutdown` empties the cache.

use std::sync::Arc;

use tracing::debug;

use crate::cache::PasswordCache;
use crate::config::Settings;
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::session::SavePolicy;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn DocumentStore>,
    pub cache: Arc<PasswordCache>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: Settings,
    save_policy: SavePolicy,
}

impl Context {
    /// Build a context with a fresh cache configured from `settings`.
    pub async fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> Self {
        let cache = Arc::new(PasswordCache::new(Arc::clone(&store)));
        settings.apply_to(&cache).await;
        Self::with_cache(store, cache, notifier, settings)
    }

    /// Build a context around an existing cache, left as configured.
    pub fn with_cache(
        store: Arc<dyn DocumentStore>,
        cache: Arc<PasswordCache>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> Self {
        let save_policy = settings.save_policy();
        Self {
            store,
            cache,
            notifier,
            settings,
            save_policy,
        }
    }

    /// Defaults everywhere, notices go to `tracing`.
    pub async fn headless(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, Arc::new(TracingNotifier), Settings::default()).await
    }

    /// Override the save policy sessions opened from this context use.
    pub fn with_save_policy(mut self, policy: SavePolicy) -> Self {
        self.save_policy = policy;
        self
    }

    pub fn save_policy(&self) -> SavePolicy {
        self.save_policy
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Forget every remembered password.
    pub async fn shutdown(&self) {
        self.cache.clear_all().await;
        debug!("password cache cleared at shutdown");
    }
}
