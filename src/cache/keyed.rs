//! Keyed Cache Module
//!
//! A [`SharedCache`] addressed by structured keys instead of raw strings.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{CacheConfig, CacheStats, Clock, SetOptions, SharedCache, TtlCache};

// == Cache Key ==
/// Structured key that serializes to a stable string.
pub trait CacheKey {
    /// Equal keys must produce equal strings.
    fn cache_key(&self) -> String;

    /// Dimensions this key can be bulk-invalidated by.
    fn tags(&self) -> Vec<String> {
        Vec::new()
    }
}

// == Keyed Cache ==
#[derive(Debug)]
pub struct KeyedCache<K, T = Value> {
    cache: SharedCache<T>,
    _key: PhantomData<fn(&K)>,
}

impl<K, T> Clone for KeyedCache<K, T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            _key: PhantomData,
        }
    }
}

impl<K: CacheKey, T> KeyedCache<K, T> {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: SharedCache::new(TtlCache::with_clock(config, clock)),
            _key: PhantomData,
        }
    }

    /// Stores `value`, indexing it under the key's tags.
    pub async fn set(&self, key: &K, value: T, ttl: Option<Duration>) {
        self.cache
            .set(key.cache_key(), value, options_for(key, ttl))
            .await;
    }

    pub async fn get(&self, key: &K) -> Option<T>
    where
        T: Clone,
    {
        self.cache.get(&key.cache_key()).await
    }

    pub async fn has(&self, key: &K) -> bool {
        self.cache.has(&key.cache_key()).await
    }

    pub async fn delete(&self, key: &K) -> bool {
        self.cache.delete(&key.cache_key()).await
    }

    /// Single-flight load, see [`SharedCache::get_or_set`].
    pub async fn get_or_set<F, Fut, E>(&self, key: &K, factory: F) -> Result<T, E>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cache
            .get_or_set(&key.cache_key(), factory, options_for(key, None))
            .await
    }

    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    pub async fn cleanup(&self) -> usize {
        self.cache.cleanup().await
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Underlying string-keyed cache.
    pub fn shared(&self) -> &SharedCache<T> {
        &self.cache
    }
}

fn options_for<K: CacheKey>(key: &K, ttl: Option<Duration>) -> SetOptions {
    SetOptions {
        ttl,
        version: None,
        tags: key.tags(),
    }
}
