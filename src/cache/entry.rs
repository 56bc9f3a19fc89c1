//! Cache Entry Module
//!
//! Defines a single cached value together with its timing and version metadata.

// == Cache Entry ==
/// A cached value with creation time, absolute expiry and generation tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached value
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Absolute expiry timestamp (Unix milliseconds), always >= `timestamp`
    pub expires: u64,
    /// Lookup key, kept for eviction bookkeeping
    pub key: String,
    /// Cache generation this entry was written under
    pub version: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stamped at `now_ms` that lives for `ttl_ms`.
    pub fn new(key: impl Into<String>, data: T, now_ms: u64, ttl_ms: u64, version: u64) -> Self {
        Self {
            data,
            timestamp: now_ms,
            expires: now_ms.saturating_add(ttl_ms),
            key: key.into(),
            version,
        }
    }

    // == Is Expired ==
    /// Checks the time bound only.
    ///
    /// An entry is still alive at exactly `expires`; it expires once
    /// `now_ms` is strictly greater.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires
    }

    // == Is Valid ==
    /// Checks both the time bound and the generation tag.
    pub fn is_valid(&self, now_ms: u64, current_version: u64) -> bool {
        !self.is_expired(now_ms) && self.version == current_version
    }

    /// Returns remaining lifetime in milliseconds (0 once expired).
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires.saturating_sub(now_ms)
    }
}
