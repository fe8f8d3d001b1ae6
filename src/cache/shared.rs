//! Shared Cache Handle
//!
//! Async, cloneable front for a `CacheStore`. One mutex guards the index and
//! the recency list together, since a hit mutates recency order and a
//! reader/writer split would not be safe. The handle also owns the cleanup
//! task so that `close` can stop it before the store is emptied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::{CacheStats, CacheStore, CacheValue, MSetItem, Snapshot};
use crate::error::Result;
use crate::tasks::{spawn_cleanup_task, CleanupHandle};

// == Shared Cache ==
pub struct SharedCache<V, C = SystemClock> {
    store: Arc<Mutex<CacheStore<V, C>>>,
    cleanup: Arc<Mutex<Option<CleanupHandle>>>,
}

impl<V, C> Clone for SharedCache<V, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cleanup: Arc::clone(&self.cleanup),
        }
    }
}

impl<V: CacheValue, C: Clock> SharedCache<V, C> {
    // == Constructors ==
    /// Wraps a store without a background sweep.
    pub fn new(store: CacheStore<V, C>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            cleanup: Arc::new(Mutex::new(None)),
        }
    }

    /// Wraps a store and starts a cleanup sweep every `check_period`.
    ///
    /// A zero period disables the sweep. Must be called within a tokio
    /// runtime when the period is non-zero.
    pub fn with_cleanup(store: CacheStore<V, C>, check_period: Duration) -> Self {
        let store = Arc::new(Mutex::new(store));
        let cleanup = if check_period.is_zero() {
            None
        } else {
            Some(spawn_cleanup_task(store.clone(), check_period))
        };

        Self {
            store,
            cleanup: Arc::new(Mutex::new(cleanup)),
        }
    }

    // == Single-Key Operations ==
    pub async fn get(&self, key: &str) -> Result<Option<V>> {
        self.store.lock().await.get(key)
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) -> Result<()> {
        self.store.lock().await.set(key.into(), value, ttl_ms)
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.store.lock().await.delete(key)
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        self.store.lock().await.has(key)
    }

    pub async fn expire(&self, key: &str, ttl_ms: u64) -> Result<bool> {
        self.store.lock().await.expire(key, ttl_ms)
    }

    // == Bulk and Pattern Operations ==
    pub async fn mget<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<Option<V>>> {
        self.store.lock().await.mget(keys)
    }

    pub async fn mset(&self, items: Vec<MSetItem<V>>) -> Result<()> {
        self.store.lock().await.mset(items)
    }

    pub async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        self.store.lock().await.delete_pattern(pattern)
    }

    pub async fn keys(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        self.store.lock().await.keys(pattern)
    }

    pub async fn clear(&self) {
        self.store.lock().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    // == Persistence ==
    pub async fn export(&self) -> Snapshot<V> {
        self.store.lock().await.export()
    }

    pub async fn import(&self, snapshot: Snapshot<V>) -> usize {
        self.store.lock().await.import(snapshot)
    }

    // == Lifecycle ==
    /// Stops the cleanup sweep, then drops every entry.
    ///
    /// Safe to call more than once.
    pub async fn close(&self) {
        let handle = self.cleanup.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        self.store.lock().await.clear();
        info!("cache closed");
    }

    pub async fn has_cleanup_task(&self) -> bool {
        self.cleanup.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache(max_size: usize) -> (SharedCache<String, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let store = CacheStore::with_clock(max_size, clock.clone());
        (SharedCache::new(store), clock)
    }

    #[tokio::test]
    async fn test_concrete_lru_scenario() {
        let (cache, _) = cache(2);

        cache.set("a", "1".to_string(), None).await.unwrap();
        cache.set("b", "2".to_string(), None).await.unwrap();
        cache.get("a").await.unwrap();
        cache.set("c", "3".to_string(), None).await.unwrap();

        let mut keys = cache.keys(None).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let (cache, _) = cache(10);
        let other = cache.clone();

        cache.set("k", "v".to_string(), None).await.unwrap();
        assert_eq!(other.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_writers_respect_capacity() {
        let (cache, _) = cache(16);
        let mut handles = Vec::new();

        for worker in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    let key = format!("w{}:{}", worker, i);
                    cache.set(key.clone(), "v".to_string(), None).await.unwrap();
                    let _ = cache.get(&key).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = cache.stats().await;
        assert_eq!(stats.current_size, 16);
        assert_eq!(stats.sets, 400);
        assert_eq!(stats.hits + stats.misses, 400);
        assert_eq!(cache.keys(None).await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_close_stops_cleanup_and_clears() {
        let clock = ManualClock::new(0);
        let store = CacheStore::with_clock(10, clock.clone());
        let cache = SharedCache::with_cleanup(store, Duration::from_millis(10));
        assert!(cache.has_cleanup_task().await);

        cache.set("k", "v".to_string(), None).await.unwrap();
        cache.close().await;

        assert!(!cache.has_cleanup_task().await);
        assert_eq!(cache.stats().await.current_size, 0);

        // Second close is a no-op
        cache.close().await;
    }

    #[tokio::test]
    async fn test_zero_period_disables_cleanup() {
        let store: CacheStore<String> = CacheStore::new(10);
        let cache = SharedCache::with_cleanup(store, Duration::ZERO);
        assert!(!cache.has_cleanup_task().await);
    }

    #[tokio::test]
    async fn test_export_import_through_handle() {
        let (cache, clock) = cache(10);
        cache.set("a", "1".to_string(), Some(1_000)).await.unwrap();

        let snapshot = cache.export().await;
        cache.clear().await;
        clock.advance(500);

        assert_eq!(cache.import(snapshot).await, 1);
        assert!(cache.has("a").await.unwrap());
        clock.advance(501);
        assert!(!cache.has("a").await.unwrap());
    }
}
