//! Cache Manager
//!
//! Owns the pricing, availability and form-state caches as one unit and runs
//! the periodic sweep over them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{
    AvailabilityCache, CacheConfig, CacheStats, Clock, FormStateCache, PricingCache,
};
use crate::tasks::spawn_cleanup_task;

/// Sweep interval used when none is configured.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

// == Manager Config ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    pub pricing: CacheConfig,
    pub availability: CacheConfig,
    pub form_state: CacheConfig,
    pub cleanup_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            pricing: PricingCache::<Value>::default_config(),
            availability: AvailabilityCache::<Value>::default_config(),
            form_state: FormStateCache::<Value>::default_config(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

// == Cache Set ==
/// The three managed caches. Clones share storage.
#[derive(Debug, Clone)]
pub struct CacheSet {
    pub pricing: PricingCache,
    pub availability: AvailabilityCache,
    pub form_state: FormStateCache,
}

impl CacheSet {
    pub fn new(config: &ManagerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            pricing: PricingCache::new(config.pricing.clone(), Arc::clone(&clock)),
            availability: AvailabilityCache::new(config.availability.clone(), Arc::clone(&clock)),
            form_state: FormStateCache::new(config.form_state.clone(), clock),
        }
    }

    /// Sweeps expired and stale entries out of every cache.
    pub async fn cleanup(&self) -> CleanupReport {
        CleanupReport {
            pricing: self.pricing.cleanup().await,
            availability: self.availability.cleanup().await,
            form_state: self.form_state.cleanup().await,
        }
    }

    pub async fn clear(&self) {
        self.pricing.clear().await;
        self.availability.clear().await;
        self.form_state.clear().await;
    }
}

/// Entries removed per cache by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub pricing: usize,
    pub availability: usize,
    pub form_state: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.pricing + self.availability + self.form_state
    }
}

// == Lifecycle ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerState {
    Running,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerStats {
    pub pricing: CacheStats,
    pub availability: CacheStats,
    pub form_state: CacheStats,
    pub total_entries: usize,
    pub state: ManagerState,
}

// == Cache Manager ==
/// Explicitly constructed owner of the transport caches.
///
/// Lifecycle is `Running -> Destroyed`. [`CacheManager::destroy`] stops the
/// sweep and clears every cache; it can be called any number of times.
#[derive(Debug)]
pub struct CacheManager {
    caches: CacheSet,
    cleanup_interval: Duration,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
}

impl CacheManager {
    /// Creates a manager without starting the sweep.
    pub fn new(config: ManagerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            caches: CacheSet::new(&config, clock),
            cleanup_interval: config.cleanup_interval,
            cleanup_task: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Creates a manager and starts its sweep. Must run inside a tokio runtime.
    pub fn start(config: ManagerConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        let manager = Self::new(config, clock);
        manager.start_cleanup();
        Arc::new(manager)
    }

    /// Spawns the periodic sweep.
    ///
    /// Returns `false` if it is already running or the manager was destroyed.
    pub fn start_cleanup(&self) -> bool {
        let mut slot = self
            .cleanup_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.is_destroyed() {
            warn!("cache manager destroyed, not starting cleanup task");
            return false;
        }
        if slot.is_some() {
            return false;
        }

        *slot = Some(spawn_cleanup_task(self.caches.clone(), self.cleanup_interval));
        true
    }

    pub fn is_cleanup_running(&self) -> bool {
        self.cleanup_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn pricing(&self) -> &PricingCache {
        &self.caches.pricing
    }

    pub fn availability(&self) -> &AvailabilityCache {
        &self.caches.availability
    }

    pub fn form_state(&self) -> &FormStateCache {
        &self.caches.form_state
    }

    pub fn caches(&self) -> &CacheSet {
        &self.caches
    }

    pub async fn clear_all(&self) {
        self.caches.clear().await;
        info!("all caches cleared");
    }

    /// Runs one sweep immediately, outside the schedule.
    pub async fn cleanup_now(&self) -> CleanupReport {
        self.caches.cleanup().await
    }

    pub async fn stats(&self) -> ManagerStats {
        let pricing = self.caches.pricing.stats().await;
        let availability = self.caches.availability.stats().await;
        let form_state = self.caches.form_state.stats().await;
        let total_entries = pricing.size + availability.size + form_state.size;

        ManagerStats {
            pricing,
            availability,
            form_state,
            total_entries,
            state: self.state(),
        }
    }

    pub fn state(&self) -> ManagerState {
        if self.is_destroyed() {
            ManagerState::Destroyed
        } else {
            ManagerState::Running
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    // == Destroy ==
    /// Stops the sweep and clears every cache. Later calls are no-ops.
    pub async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            debug!("cache manager already destroyed");
            return;
        }

        self.abort_cleanup();
        self.caches.clear().await;
        info!("cache manager destroyed");
    }

    fn abort_cleanup(&self) {
        let handle = self
            .cleanup_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        self.abort_cleanup();
    }
}
