//! Performance Monitor
//!
//! Named timing spans with running count/avg/min/max.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
struct Samples {
    count: u64,
    total: Duration,
    min: Duration,
    max: Duration,
}

/// Aggregate of every sample recorded under one name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingStats {
    pub count: u64,
    pub total_ms: f64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl From<&Samples> for TimingStats {
    fn from(samples: &Samples) -> Self {
        let total_ms = samples.total.as_secs_f64() * 1_000.0;
        Self {
            count: samples.count,
            total_ms,
            avg_ms: if samples.count == 0 {
                0.0
            } else {
                total_ms / samples.count as f64
            },
            min_ms: samples.min.as_secs_f64() * 1_000.0,
            max_ms: samples.max.as_secs_f64() * 1_000.0,
        }
    }
}

// == Performance Monitor ==
/// Collects timings. Clones share the same samples.
#[derive(Debug, Clone, Default)]
pub struct PerformanceMonitor {
    samples: Arc<Mutex<HashMap<String, Samples>>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a span that is recorded when the guard is dropped or finished.
    pub fn start_timing(&self, name: impl Into<String>) -> TimingGuard {
        TimingGuard {
            monitor: self.clone(),
            name: name.into(),
            started: Instant::now(),
            recorded: false,
        }
    }

    pub fn record(&self, name: &str, elapsed: Duration) {
        let mut samples = self.lock();
        let entry = samples.entry(name.to_string()).or_default();
        if entry.count == 0 || elapsed < entry.min {
            entry.min = elapsed;
        }
        if elapsed > entry.max {
            entry.max = elapsed;
        }
        entry.count += 1;
        entry.total += elapsed;
    }

    /// Snapshot of every span, sorted by name.
    pub fn stats(&self) -> BTreeMap<String, TimingStats> {
        self.lock()
            .iter()
            .map(|(name, samples)| (name.clone(), TimingStats::from(samples)))
            .collect()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Samples>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Timing Guard ==
#[derive(Debug)]
pub struct TimingGuard {
    monitor: PerformanceMonitor,
    name: String,
    started: Instant,
    recorded: bool,
}

impl TimingGuard {
    /// Records the span now and returns its duration.
    pub fn finish(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.recorded {
            self.recorded = true;
            self.monitor.record(&self.name, elapsed);
            debug!(span = %self.name, elapsed_ms = elapsed.as_millis() as u64, "timing recorded");
        }
        elapsed
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        self.record();
    }
}
