//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and
//! generation-based invalidation, plus the transport-specific caches built on it.

mod clock;
mod entry;
mod keyed;
mod lru;
mod shared;
mod specialized;
mod stats;
mod store;


// Re-export public types
pub use clock::{system_clock, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use keyed::{CacheKey, KeyedCache};
pub use lru::LruTracker;
pub use shared::SharedCache;
pub use specialized::{
    normalize_date, AvailabilityCache, AvailabilityKey, FormStateCache, FormStateKey,
    PricingCache, PricingKey, AVAILABILITY_MAX_SIZE, AVAILABILITY_TTL, FORM_STATE_MAX_SIZE,
    FORM_STATE_TTL, PRICING_MAX_SIZE, PRICING_TTL,
};
pub use stats::CacheStats;
pub use store::{CacheConfig, SetOptions, TtlCache};
