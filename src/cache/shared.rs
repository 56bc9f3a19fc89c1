//! Shared Cache Module
//!
//! Cloneable async handle over a [`TtlCache`] with single-flight loading.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::debug;

use crate::cache::{CacheStats, SetOptions, TtlCache};

type InflightMap = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

// == Shared Cache ==
/// Thread-safe handle to a [`TtlCache`]. Clones share the same store.
#[derive(Debug)]
pub struct SharedCache<T> {
    store: Arc<RwLock<TtlCache<T>>>,
    /// key -> load lock, present while a load for that key is in progress
    inflight: Arc<InflightMap>,
}

impl<T> Clone for SharedCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<T> SharedCache<T> {
    pub fn new(cache: TtlCache<T>) -> Self {
        Self {
            store: Arc::new(RwLock::new(cache)),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: T, options: SetOptions) {
        self.store.write().await.set(key, value, options);
    }

    pub async fn get(&self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        self.store.write().await.get(key)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    /// Side-effect-free read, see [`TtlCache::peek`].
    pub async fn peek(&self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        self.store.read().await.peek(key).cloned()
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn cleanup(&self) -> usize {
        self.store.write().await.cleanup()
    }

    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        self.store.write().await.invalidate_tag(tag)
    }

    pub async fn version(&self) -> u64 {
        self.store.read().await.version()
    }

    pub async fn set_version(&self, version: u64) {
        self.store.write().await.set_version(version);
    }

    pub async fn bump_version(&self) -> u64 {
        self.store.write().await.bump_version()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Get Or Set ==
    /// Returns the cached value, or loads it with `factory` and caches it.
    ///
    /// Concurrent misses on the same key share a single factory run: the
    /// first caller loads while the others wait and then read its result.
    /// If the load fails the error goes to that caller only, and the next
    /// waiter runs its own factory. The store lock is never held while the
    /// factory runs.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        options: SetOptions,
    ) -> Result<T, E>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let slot = InflightSlot::claim(&self.inflight, key);
        let _loading = slot.lock.lock().await;

        if let Some(value) = self.take_loaded(key).await {
            debug!(key, "served by concurrent load");
            return Ok(value);
        }

        let value = factory().await?;
        self.set(key, value.clone(), options).await;
        Ok(value)
    }
}

impl<T: Clone> SharedCache<T> {
    /// Reads a value another caller just loaded. Only a present entry is
    /// touched, so the loader's own re-check does not count a second miss.
    async fn take_loaded(&self, key: &str) -> Option<T> {
        let mut store = self.store.write().await;
        if store.peek(key).is_some() {
            store.get(key)
        } else {
            None
        }
    }
}

// == Inflight Slot ==
/// Membership in the in-flight map for one key; unregisters on drop when
/// no other caller is waiting on the same key.
struct InflightSlot<'a> {
    map: &'a InflightMap,
    key: &'a str,
    lock: Arc<AsyncMutex<()>>,
}

impl<'a> InflightSlot<'a> {
    fn claim(map: &'a InflightMap, key: &'a str) -> Self {
        let lock = map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone();
        Self { map, key, lock }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours
        if Arc::strong_count(&self.lock) <= 2 {
            map.remove(self.key);
        }
    }
}
