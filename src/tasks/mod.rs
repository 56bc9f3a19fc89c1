//! Background Tasks Module
//!
//! Timer-driven work that runs alongside the caches.
//!
//! # Tasks
//! - Cache sweep: removes expired entries at a fixed interval
//! - Debouncer: keyed trailing-edge call coalescing

mod cleanup;
mod debounce;

pub use cleanup::{spawn_cleanup_task, MIN_CLEANUP_INTERVAL};
pub use debounce::Debouncer;
