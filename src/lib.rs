//! Transport Cache - in-memory caching for transport pricing and availability
//!
//! TTL expiration, LRU eviction and generation-based invalidation, with a
//! manager that sweeps expired entries and an HTTP admin API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod monitor;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheConfig, SetOptions, SharedCache, TtlCache};
pub use config::Config;
pub use manager::{CacheManager, ManagerConfig};
pub use monitor::PerformanceMonitor;
pub use tasks::{spawn_cleanup_task, Debouncer};
