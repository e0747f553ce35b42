//! Lock-free atomic metrics collection.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::ThrottleTotals;

/// Cumulative counters for one throttler.
///
/// All operations use `Relaxed` ordering; the counters are independent
/// measurements and are only read for display.
#[derive(Debug, Default)]
pub struct ThrottleMetrics {
    /// Requests handed to `submit`
    submitted: AtomicU64,
    /// Requests that had to wait in the queue
    queued: AtomicU64,
    /// Loads that completed successfully
    succeeded: AtomicU64,
    /// Loads that reported an error
    failed: AtomicU64,
    /// Loads that exceeded the tile timeout
    timed_out: AtomicU64,
    /// Requests whose execution went away without reporting
    abandoned: AtomicU64,
    /// Highest number of simultaneously active requests observed
    peak_active: AtomicUsize,
}

impl ThrottleMetrics {
    /// Creates a zeroed metrics set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an admission, with the global active count including it.
    pub fn request_admitted(&self, active: usize) {
        self.peak_active.fetch_max(active, Ordering::Relaxed);
    }

    pub fn request_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn totals(&self) -> ThrottleTotals {
        ThrottleTotals {
            submitted: self.submitted.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            peak_active: self.peak_active.load(Ordering::Relaxed),
        }
    }
}
