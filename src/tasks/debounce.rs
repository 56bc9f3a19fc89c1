//! Debouncer
//!
//! Keyed trailing-edge debouncing on top of tokio timers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

// == Debouncer ==
/// Coalesces bursts of calls per key so only the last one runs.
///
/// At most one timer is pending per key. Clones share the same timers.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    inner: Arc<Timers>,
}

#[derive(Debug, Default)]
struct Timers {
    pending: Mutex<HashMap<String, PendingTimer>>,
    generation: AtomicU64,
}

#[derive(Debug)]
struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `f` so that it runs `delay` after the most recent call for
    /// `key`, with that call's arguments.
    ///
    /// Every call restarts the window. The returned function must be called
    /// from within a tokio runtime.
    pub fn debounce<A, F>(
        &self,
        key: impl Into<String>,
        f: F,
        delay: Duration,
    ) -> impl Fn(A) + Send + Sync + 'static
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        let key = key.into();
        let f = Arc::new(f);
        let timers = Arc::clone(&self.inner);

        move |args: A| timers.schedule(key.clone(), Arc::clone(&f), args, delay)
    }

    /// Drops the pending call for `key` without running it.
    pub fn cancel(&self, key: &str) -> bool {
        match self.inner.lock().remove(key) {
            Some(timer) => {
                timer.handle.abort();
                debug!(key, "debounce cancelled");
                true
            }
            None => false,
        }
    }

    /// Drops every pending call. Returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PendingTimer> = self.inner.lock().drain().map(|(_, t)| t).collect();
        for timer in &drained {
            timer.handle.abort();
        }
        drained.len()
    }

    /// Number of keys with a call waiting to run.
    pub fn pending(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Timers {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingTimer>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule<A, F>(self: &Arc<Self>, key: String, f: Arc<F>, args: A, delay: Duration)
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let timers = Arc::clone(self);
        let task_key = key.clone();

        // Held across spawn so the timer cannot look itself up before it is registered
        let mut pending = self.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if timers.take_if_current(&task_key, generation) {
                f(args);
            }
        });

        if let Some(previous) = pending.insert(key, PendingTimer { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Unregisters the timer if it is still the latest for `key`.
    fn take_if_current(&self, key: &str, generation: u64) -> bool {
        let mut pending = self.lock();
        match pending.get(key) {
            Some(timer) if timer.generation == generation => {
                pending.remove(key);
                true
            }
            _ => false,
        }
    }
}
