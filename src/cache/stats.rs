//! Cache Statistics Module
//!
//! Counters and the snapshot returned by `stats()`.

use serde::Serialize;

// == Counters ==
/// Running counters kept by a store.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl Counters {
    /// hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Stats ==
/// Point-in-time statistics for one cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently held, stale ones included until purged
    pub size: usize,
    pub max_size: usize,
    /// Fraction of lookups that hit, from live counters rather than a fixed 0
    pub hit_rate: f64,
    /// Current cache generation
    pub version: u64,
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed because they were expired or stale
    pub expirations: u64,
}

impl CacheStats {
    pub(crate) fn from_counters(
        counters: &Counters,
        size: usize,
        max_size: usize,
        version: u64,
    ) -> Self {
        Self {
            size,
            max_size,
            hit_rate: counters.hit_rate(),
            version,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            expirations: counters.expirations,
        }
    }
}
