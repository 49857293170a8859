//! Cache Manager Module
//!
//! Public facade tying together the entry store, the listener registry,
//! disk persistence, and the background expiration and watch tasks.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{CacheEntry, CacheEvent, EntryStore, ListenerRegistry, NameFilter};
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};
use crate::{persist, tasks};

// == Shared State ==
/// State shared between the manager and its background tasks.
pub(crate) struct CacheShared {
    /// In-memory source of truth
    pub(crate) store: RwLock<EntryStore>,
    /// Registered event subscriptions
    pub(crate) listeners: RwLock<ListenerRegistry>,
    /// Canonical cache directory; None in memory-only mode
    pub(crate) cache_dir: Option<PathBuf>,
}

impl CacheShared {
    /// Fans an event out to every matching listener.
    pub(crate) async fn dispatch(&self, event: CacheEvent, name: &str, data: &Value) {
        let listeners = self.listeners.read().await;
        listeners.dispatch(event, name, data);
    }
}

// == Cache Manager ==
/// An embeddable key-value cache with TTL expiration, optional disk
/// persistence, and synchronous change notifications.
///
/// Constructing a manager spawns the expiration monitor and, in disk mode,
/// the directory watcher. Both run until [`CacheManager::close`] is called
/// or the manager is dropped.
pub struct CacheManager {
    shared: Arc<CacheShared>,
    /// TTL applied when `set` is called without an explicit expiry
    default_expire: u64,
    /// Keeps the directory watcher alive; dropping it stops change delivery
    _watcher: Option<notify::RecommendedWatcher>,
    expiration_handle: JoinHandle<()>,
    watch_handle: Option<JoinHandle<()>>,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a cache from the given options.
    ///
    /// In disk mode the cache directory is created when missing and any
    /// persisted entries are loaded back into memory, with tampered entries
    /// handled per `discard_tampered_cache`. Must be called from within a
    /// Tokio runtime: the expiration monitor (and in disk mode the
    /// directory watcher) are spawned immediately.
    pub fn new(options: CacheOptions) -> Result<Self> {
        let (store, cache_dir) = if options.memory_only {
            (EntryStore::new(), None)
        } else {
            let entries = persist::load_all(
                &options.cache_directory,
                options.discard_tampered_cache,
            )?;
            // Watcher events carry absolute paths, so the configured
            // directory must be canonical before names are derived from it
            let dir = options
                .cache_directory
                .canonicalize()
                .map_err(|e| CacheError::Persistence {
                    path: options.cache_directory.clone(),
                    source: e,
                })?;
            (EntryStore::from_entries(entries), Some(dir))
        };

        let shared = Arc::new(CacheShared {
            store: RwLock::new(store),
            listeners: RwLock::new(ListenerRegistry::new()),
            cache_dir: cache_dir.clone(),
        });

        let expiration_handle =
            tasks::spawn_expiration_task(Arc::clone(&shared), options.check_interval);

        let (watcher, watch_handle) = match cache_dir {
            Some(dir) => {
                let (watcher, handle) = tasks::spawn_watch_task(Arc::clone(&shared), dir)?;
                (Some(watcher), Some(handle))
            }
            None => (None, None),
        };

        info!(memory_only = options.memory_only, "cache manager started");

        Ok(Self {
            shared,
            default_expire: options.default_expire,
            _watcher: watcher,
            expiration_handle,
            watch_handle,
        })
    }

    // == Set ==
    /// Creates or replaces the entry for `name`.
    ///
    /// `ttl` is a relative duration in milliseconds (the default expiry when
    /// None); the stored expiry is always absolute. Matching "update"
    /// listeners run synchronously before the entry is mirrored to disk,
    /// and the disk write is complete when this returns, so persistence
    /// failures surface through the returned Result.
    pub async fn set<T: Serialize>(&self, name: &str, data: T, ttl: Option<u64>) -> Result<()> {
        let ttl = ttl.unwrap_or(self.default_expire);
        let data = serde_json::to_value(data)?;
        let entry = CacheEntry::new(data.clone(), ttl);
        let expires_at = entry.expires_at;

        {
            let mut store = self.shared.store.write().await;
            store.insert(name.to_string(), entry);
        }

        self.shared.dispatch(CacheEvent::Update, name, &data).await;

        if let Some(dir) = &self.shared.cache_dir {
            persist::write_entry(dir, name, &data, expires_at)?;
        }

        Ok(())
    }

    // == Get ==
    /// Returns the current data for `name`, or None if unknown.
    ///
    /// Expiration is not checked here; pair with
    /// [`CacheManager::is_expired`] when freshness matters.
    pub async fn get(&self, name: &str) -> Option<Value> {
        self.shared
            .store
            .read()
            .await
            .get(name)
            .map(|entry| entry.data.clone())
    }

    // == Is Expired ==
    /// True when `name` is unknown or past its expiry.
    pub async fn is_expired(&self, name: &str) -> bool {
        self.shared.store.read().await.is_expired(name)
    }

    // == Views ==
    /// Returns a snapshot of all entry names.
    pub async fn keys(&self) -> Vec<String> {
        self.shared.store.read().await.keys()
    }

    /// Returns a snapshot of all entries.
    pub async fn values(&self) -> Vec<CacheEntry> {
        self.shared.store.read().await.values()
    }

    /// Returns a snapshot of all (name, entry) pairs.
    pub async fn entries(&self) -> Vec<(String, CacheEntry)> {
        self.shared.store.read().await.entries()
    }

    // == Subscriptions ==
    /// Registers a listener for `event`, matching every entry name.
    ///
    /// Listeners are invoked synchronously with `(name, data)` in
    /// registration order and are never unregistered.
    pub async fn on<F>(&self, event: CacheEvent, callback: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let mut listeners = self.shared.listeners.write().await;
        listeners.on(event, None, Box::new(callback));
    }

    /// Registers a listener restricted to one name or a set of names.
    pub async fn on_filtered<F>(&self, event: CacheEvent, only: impl Into<NameFilter>, callback: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let mut listeners = self.shared.listeners.write().await;
        listeners.on(event, Some(only.into()), Box::new(callback));
    }

    // == Close ==
    /// Stops the expiration monitor and the directory watcher.
    ///
    /// Dropping the manager has the same effect; this method exists so the
    /// teardown point can be made explicit.
    pub fn close(self) {
        info!("cache manager closed");
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        self.expiration_handle.abort();
        if let Some(handle) = &self.watch_handle {
            handle.abort();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn memory_options() -> CacheOptions {
        CacheOptions::default()
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let cache = CacheManager::new(memory_options()).unwrap();

        cache.set("greeting", json!({"msg": "hello"}), None).await.unwrap();

        assert_eq!(cache.get("greeting").await, Some(json!({"msg": "hello"})));
    }

    #[tokio::test]
    async fn test_get_unknown_returns_none() {
        let cache = CacheManager::new(memory_options()).unwrap();
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_unknown_name_is_expired() {
        let cache = CacheManager::new(memory_options()).unwrap();
        assert!(cache.is_expired("never-set").await);
    }

    #[tokio::test]
    async fn test_expiry_monotonicity() {
        let cache = CacheManager::new(memory_options()).unwrap();

        cache.set("short", json!(1), Some(50)).await.unwrap();
        assert!(!cache.is_expired("short").await);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(cache.is_expired("short").await);
    }

    #[tokio::test]
    async fn test_default_expire_applied() {
        let mut options = memory_options();
        options.default_expire = 60_000;
        let cache = CacheManager::new(options).unwrap();

        cache.set("k", json!(1), None).await.unwrap();

        let (_, entry) = cache
            .entries()
            .await
            .into_iter()
            .find(|(name, _)| name == "k")
            .unwrap();
        let now = crate::cache::current_timestamp_ms();
        assert!(entry.expires_at > now + 50_000);
        assert!(entry.expires_at <= now + 60_000);
    }

    #[tokio::test]
    async fn test_update_listener_filter_correctness() {
        let cache = CacheManager::new(memory_options()).unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        cache
            .on_filtered(CacheEvent::Update, "a", move |name, _| {
                received_clone.lock().unwrap().push(name.to_string());
            })
            .await;

        cache.set("a", json!(1), None).await.unwrap();
        cache.set("b", json!(2), None).await.unwrap();

        assert_eq!(*received.lock().unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_update_listener_receives_payload() {
        let cache = CacheManager::new(memory_options()).unwrap();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        cache
            .on(CacheEvent::Update, move |name, data| {
                assert_eq!(name, "x");
                assert_eq!(data, &json!({"v": 3}));
                count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        cache.set("x", json!({"v": 3}), None).await.unwrap();

        // Dispatch is synchronous, so the listener already ran
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_data_and_expiry() {
        let cache = CacheManager::new(memory_options()).unwrap();

        cache.set("k", json!("old"), Some(10)).await.unwrap();
        cache.set("k", json!("new"), Some(60_000)).await.unwrap();

        assert_eq!(cache.get("k").await, Some(json!("new")));
        assert!(!cache.is_expired("k").await);
        assert_eq!(cache.keys().await.len(), 1);
    }

    #[tokio::test]
    async fn test_views_cover_all_entries() {
        let cache = CacheManager::new(memory_options()).unwrap();

        cache.set("a", json!(1), None).await.unwrap();
        cache.set("b", json!(2), None).await.unwrap();

        let mut keys = cache.keys().await;
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.values().await.len(), 2);
        assert_eq!(cache.entries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_serializable_payloads_accepted() {
        #[derive(Serialize)]
        struct Payload {
            v: u32,
        }

        let cache = CacheManager::new(memory_options()).unwrap();
        cache.set("typed", Payload { v: 7 }, None).await.unwrap();

        assert_eq!(cache.get("typed").await, Some(json!({"v": 7})));
    }
}
