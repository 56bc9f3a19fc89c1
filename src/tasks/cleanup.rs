//! Cache Sweep Task
//!
//! Background task that periodically removes expired and stale cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::manager::CacheSet;

/// Shortest sweep period; smaller intervals are raised to this.
pub const MIN_CLEANUP_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns a background task that sweeps every cache in `caches` once per
/// `interval`.
///
/// The task runs until aborted through the returned handle. Lazy expiry only
/// frees entries that are read again; this sweep frees the rest.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(caches.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(caches: CacheSet, interval: Duration) -> JoinHandle<()> {
    let interval = interval.max(MIN_CLEANUP_INTERVAL);
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} seconds",
            interval.as_secs_f64()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = caches.cleanup().await;

            if report.total() > 0 {
                info!(
                    pricing = report.pricing,
                    availability = report.availability,
                    form_state = report.form_state,
                    "Cache cleanup: removed {} expired entries",
                    report.total()
                );
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}
