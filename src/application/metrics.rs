//! Observability metrics for submissions.
//!
//! Counts admission decisions, outcomes and window refills.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking gateway statistics.
///
/// All counters use atomic operations and are shared between clones.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Submissions that obtained a permit
    admitted: AtomicU64,
    /// Submissions rejected for lack of a permit
    throttled: AtomicU64,
    /// 2xx responses
    succeeded: AtomicU64,
    /// Non-2xx responses
    failed: AtomicU64,
    /// Transport or encoding errors
    errors: AtomicU64,
    /// Submissions cancelled by the caller
    cancelled: AtomicU64,
    /// Refills that restored at least one permit
    refills: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_throttled(&self) {
        self.inner.throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_succeeded(&self) {
        self.inner.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.inner.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refill(&self) {
        self.inner.refills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    pub fn throttled(&self) -> u64 {
        self.inner.throttled.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.inner.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.inner.failed.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.inner.errors.load(Ordering::Relaxed)
    }

    pub fn cancelled(&self) -> u64 {
        self.inner.cancelled.load(Ordering::Relaxed)
    }

    pub fn refills(&self) -> u64 {
        self.inner.refills.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted(),
            throttled: self.throttled(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            errors: self.errors(),
            cancelled: self.cancelled(),
            refills: self.refills(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.admitted.store(0, Ordering::Relaxed);
        self.inner.throttled.store(0, Ordering::Relaxed);
        self.inner.succeeded.store(0, Ordering::Relaxed);
        self.inner.failed.store(0, Ordering::Relaxed);
        self.inner.errors.store(0, Ordering::Relaxed);
        self.inner.cancelled.store(0, Ordering::Relaxed);
        self.inner.refills.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub admitted: u64,
    pub throttled: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub errors: u64,
    pub cancelled: u64,
    pub refills: u64,
}

impl MetricsSnapshot {
    /// Total admission decisions (admitted + throttled).
    pub fn total_attempts(&self) -> u64 {
        self.admitted.saturating_add(self.throttled)
    }

    /// Ratio of throttled attempts to all attempts (0.0 to 1.0).
    ///
    /// Returns 0.0 if nothing has been attempted.
    pub fn throttle_rate(&self) -> f64 {
        let total = self.total_attempts();
        if total == 0 {
            0.0
        } else {
            self.throttled as f64 / total as f64
        }
    }
}
