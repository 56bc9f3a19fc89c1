//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, TTL
//! expiration, generation-based invalidation and tag indexing.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::clock::{duration_ms, system_clock, Clock};
use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Config ==
/// Construction parameters for a [`TtlCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime applied when `set` is called without an explicit TTL
    pub ttl: Duration,
    /// Maximum number of entries held at once (0 is treated as 1)
    pub max_size: usize,
    /// Initial cache generation
    pub version: u64,
}

impl CacheConfig {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl,
            max_size,
            version: 1,
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(300), 100)
    }
}

// == Set Options ==
/// Per-call overrides for `set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub ttl: Option<Duration>,
    pub version: Option<u64>,
    /// Labels usable with `invalidate_tag`
    pub tags: Vec<String>,
}

impl SetOptions {
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

// == TTL Cache ==
/// Size- and time-bounded associative store.
///
/// Misses are reported as `None`. Expired or version-stale entries are
/// dropped lazily when read, and in bulk by [`TtlCache::cleanup`].
#[derive(Debug)]
pub struct TtlCache<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Access recency, same key set as `entries`
    lru: LruTracker,
    /// tag -> keys carrying it
    tags: HashMap<String, HashSet<String>>,
    /// key -> its tags, for unindexing on removal
    entry_tags: HashMap<String, Vec<String>>,
    counters: Counters,
    default_ttl: Duration,
    max_size: usize,
    version: u64,
    clock: Arc<dyn Clock>,
}

impl<T> TtlCache<T> {
    // == Constructor ==
    /// Creates a cache driven by the wall clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Creates a cache driven by the given clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            tags: HashMap::new(),
            entry_tags: HashMap::new(),
            counters: Counters::default(),
            default_ttl: config.ttl,
            max_size: config.max_size.max(1),
            version: config.version,
            clock,
        }
    }

    // == Set ==
    /// Inserts or overwrites an entry and marks it most recently used.
    ///
    /// Inserting a new key into a full cache evicts the least recently
    /// accessed entry first.
    pub fn set(&mut self, key: impl Into<String>, value: T, options: SetOptions) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_one();
        }

        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let version = options.version.unwrap_or(self.version);
        let entry = CacheEntry::new(
            key.clone(),
            value,
            self.clock.now_ms(),
            duration_ms(ttl),
            version,
        );

        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.unindex(&key);
        self.index(&key, options.tags);
    }

    // == Get ==
    /// Returns a clone of the value if present and valid.
    pub fn get(&mut self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        self.lookup(key).cloned()
    }

    // == Has ==
    /// Same as `get(key).is_some()`, including the purge and recency touch.
    pub fn has(&mut self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    // == Peek ==
    /// Reads a valid value without touching recency, counters or stale entries.
    pub fn peek(&self, key: &str) -> Option<&T> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| entry.is_valid(now, self.version))
            .map(|entry| &entry.data)
    }

    // == Delete ==
    /// Removes an entry. Returns whether the key existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.tags.clear();
        self.entry_tags.clear();
    }

    // == Cleanup ==
    /// Removes every expired or version-stale entry.
    ///
    /// Returns the number of entries removed. Recency of retained keys is
    /// left untouched.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let version = self.version;
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_valid(now, version))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            self.remove_entry(key);
        }

        self.counters.expirations += stale.len() as u64;
        stale.len()
    }

    // == Get Or Set ==
    /// Returns the cached value, or runs `factory` and caches its result.
    ///
    /// A factory error is returned as-is and nothing is stored. Calls through
    /// `&mut self` are serialized by the borrow; see
    /// [`SharedCache::get_or_set`](crate::cache::SharedCache::get_or_set) for
    /// the concurrent variant.
    pub async fn get_or_set<F, Fut, E>(
        &mut self,
        key: &str,
        factory: F,
        options: SetOptions,
    ) -> Result<T, E>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = factory().await?;
        self.set(key, value.clone(), options);
        Ok(value)
    }

    // == Invalidate Tag ==
    /// Removes every entry that was stored with `tag`.
    pub fn invalidate_tag(&mut self, tag: &str) -> usize {
        let Some(keys) = self.tags.remove(tag) else {
            return 0;
        };

        let mut removed = 0;
        for key in keys {
            if self.remove_entry(&key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    // == Versioning ==
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Switches the current generation. Entries written under any other
    /// generation become misses.
    pub fn set_version(&mut self, version: u64) {
        if version != self.version {
            info!(from = self.version, to = version, "cache version changed");
            self.version = version;
        }
    }

    /// Advances to the next generation and returns it.
    pub fn bump_version(&mut self) -> u64 {
        self.set_version(self.version.wrapping_add(1));
        self.version
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        CacheStats::from_counters(&self.counters, self.entries.len(), self.max_size, self.version)
    }

    /// Number of stored entries, stale ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Keys currently stored, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Raw entry access, validity not checked.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    // == Internals ==
    fn lookup(&mut self, key: &str) -> Option<&T> {
        let now = self.clock.now_ms();
        let valid = match self.entries.get(key) {
            Some(entry) => entry.is_valid(now, self.version),
            None => {
                self.counters.misses += 1;
                return None;
            }
        };

        if !valid {
            self.remove_entry(key);
            self.counters.expirations += 1;
            self.counters.misses += 1;
            debug!(key, "dropped stale cache entry");
            return None;
        }

        self.counters.hits += 1;
        self.lru.touch(key);
        self.entries.get(key).map(|entry| &entry.data)
    }

    fn evict_one(&mut self) {
        if let Some(victim) = self.lru.evict_oldest() {
            self.entries.remove(&victim);
            self.unindex(&victim);
            self.counters.evictions += 1;
            debug!(key = %victim, "evicted least recently used entry");
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.unindex(key);
        Some(entry)
    }

    fn index(&mut self, key: &str, mut tags: Vec<String>) {
        tags.sort();
        tags.dedup();
        if tags.is_empty() {
            return;
        }
        for tag in &tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.entry_tags.insert(key.to_string(), tags);
    }

    fn unindex(&mut self, key: &str) {
        let Some(tags) = self.entry_tags.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = self.tags.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tags.remove(&tag);
                }
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache_with_clock(ttl_ms: u64, max_size: usize) -> (TtlCache<i32>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let cache = TtlCache::with_clock(
            CacheConfig::new(Duration::from_millis(ttl_ms), max_size),
            Arc::new(clock.clone()),
        );
        (cache, clock)
    }

    #[test]
    fn test_set_and_get() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        cache.set("x", 42, SetOptions::default());

        assert_eq!(cache.get("x"), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let (mut cache, _) = cache_with_clock(1_000, 10);
        assert_eq!(cache.get("missing"), None);
        assert!(!cache.has("missing"));
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_wrapping() {
        let (mut cache, clock) = cache_with_clock(1_000, 10);

        cache.set("k", 1, SetOptions::ttl(Duration::from_secs(18_446_744_073_709_552)));
        clock.advance(Duration::from_secs(1));

        assert_eq!(cache.get("k"), Some(1));
        assert_eq!(cache.entry("k").map(|entry| entry.expires), Some(u64::MAX));
    }

    #[test]
    fn test_expiry_with_simulated_clock() {
        let (mut cache, clock) = cache_with_clock(1_000, 1);

        cache.set("x", 42, SetOptions::default());
        assert_eq!(cache.get("x"), Some(42));

        clock.advance(Duration::from_millis(1_001));

        assert_eq!(cache.get("x"), None);
        assert!(!cache.has("x"));
        assert!(cache.is_empty(), "lazy expiry removes the entry");
    }

    #[test]
    fn test_per_call_ttl_overrides_default() {
        let (mut cache, clock) = cache_with_clock(10_000, 10);

        cache.set("short", 1, SetOptions::ttl(Duration::from_millis(100)));
        cache.set("long", 2, SetOptions::default());
        clock.advance(Duration::from_millis(500));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn test_overwrite() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        cache.set("k", 1, SetOptions::default());
        cache.set("k", 2, SetOptions::default());

        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let (mut cache, _) = cache_with_clock(1_000, 2);

        cache.set("a", 1, SetOptions::default());
        cache.set("b", 2, SetOptions::default());
        cache.set("a", 3, SetOptions::default());

        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_lru_touch_on_get() {
        let (mut cache, _) = cache_with_clock(1_000, 2);

        cache.set("a", 1, SetOptions::default());
        cache.set("b", 2, SetOptions::default());
        cache.get("a");
        cache.set("c", 3, SetOptions::default());

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_has_touches_recency() {
        let (mut cache, _) = cache_with_clock(1_000, 2);

        cache.set("a", 1, SetOptions::default());
        cache.set("b", 2, SetOptions::default());
        assert!(cache.has("a"));
        cache.set("c", 3, SetOptions::default());

        assert!(cache.peek("a").is_some());
        assert!(cache.peek("b").is_none());
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let (mut cache, clock) = cache_with_clock(100, 10);

        cache.set("k", 1, SetOptions::default());
        assert_eq!(cache.peek("k"), Some(&1));

        clock.advance(Duration::from_millis(200));
        assert_eq!(cache.peek("k"), None);
        assert_eq!(cache.len(), 1, "peek must not purge");
        assert_eq!(cache.stats().hits + cache.stats().misses, 0);
    }

    #[test]
    fn test_version_invalidation() {
        let (mut cache, _) = cache_with_clock(60_000, 10);

        cache.set("k", 1, SetOptions::default());
        let next = cache.bump_version();

        assert_eq!(next, 2);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_explicit_entry_version() {
        let (mut cache, _) = cache_with_clock(60_000, 10);

        cache.set("old", 1, SetOptions::default().with_version(0));
        cache.set("current", 2, SetOptions::default());

        assert_eq!(cache.get("old"), None);
        assert_eq!(cache.get("current"), Some(2));
    }

    #[test]
    fn test_delete() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        cache.set("k", 1, SetOptions::default());

        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_cleanup_removes_expired_and_stale_only() {
        let (mut cache, clock) = cache_with_clock(1_000, 10);

        cache.set("short", 1, SetOptions::ttl(Duration::from_millis(10)));
        cache.set("stale", 2, SetOptions::default().with_version(99));
        cache.set("live", 3, SetOptions::default());
        clock.advance(Duration::from_millis(50));

        assert_eq!(cache.cleanup(), 2);
        assert_eq!(cache.cleanup(), 0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("live"), Some(3));
        assert_eq!(cache.stats().expirations, 2);
    }

    #[test]
    fn test_clear() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        cache.set("a", 1, SetOptions::default().with_tag("t"));
        cache.set("b", 2, SetOptions::default());
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.invalidate_tag("t"), 0);
    }

    #[test]
    fn test_invalidate_tag() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        cache.set("a", 1, SetOptions::default().with_tag("svc:1"));
        cache.set("b", 2, SetOptions::default().with_tag("svc:1").with_tag("day:x"));
        cache.set("c", 3, SetOptions::default().with_tag("svc:2"));

        assert_eq!(cache.invalidate_tag("svc:1"), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.invalidate_tag("day:x"), 0, "index follows removals");
    }

    #[test]
    fn test_overwrite_replaces_tags() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        cache.set("a", 1, SetOptions::default().with_tag("old"));
        cache.set("a", 2, SetOptions::default().with_tag("new"));

        assert_eq!(cache.invalidate_tag("old"), 0);
        assert_eq!(cache.invalidate_tag("new"), 1);
    }

    #[test]
    fn test_eviction_unindexes_tags() {
        let (mut cache, _) = cache_with_clock(1_000, 1);

        cache.set("a", 1, SetOptions::default().with_tag("t"));
        cache.set("b", 2, SetOptions::default());

        assert_eq!(cache.invalidate_tag("t"), 0);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_zero_max_size_is_clamped() {
        let (mut cache, _) = cache_with_clock(1_000, 0);

        cache.set("a", 1, SetOptions::default());
        cache.set("b", 2, SetOptions::default());

        assert_eq!(cache.max_size(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        cache.set("k", 1, SetOptions::default());
        cache.get("k");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 10);
        assert_eq!(stats.version, 1);
    }

    #[tokio::test]
    async fn test_get_or_set_runs_factory_on_miss_only() {
        let (mut cache, _) = cache_with_clock(1_000, 10);
        let mut calls = 0;

        let first: Result<i32, String> = cache
            .get_or_set("k", || { calls += 1; async { Ok(7) } }, SetOptions::default())
            .await;
        assert_eq!(first, Ok(7));

        let second: Result<i32, String> = cache
            .get_or_set("k", || async { Ok(8) }, SetOptions::default())
            .await;
        assert_eq!(second, Ok(7));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_get_or_set_propagates_factory_error() {
        let (mut cache, _) = cache_with_clock(1_000, 10);

        let result: Result<i32, String> = cache
            .get_or_set("k", || async { Err("upstream down".to_string()) }, SetOptions::default())
            .await;

        assert_eq!(result, Err("upstream down".to_string()));
        assert!(!cache.has("k"));
    }
}
