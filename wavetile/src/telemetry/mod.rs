//! Throttler telemetry for observability and diagnostics.
//!
//! Cumulative counters are kept in lock-free atomics so that recording an
//! event never contends with the throttler's admission lock.
//!
//! # Architecture
//!
//! ```text
//! RequestThrottler ─────► ThrottleMetrics ─────► ThrottleTotals ─────► Views
//!                         (atomic counters)      (point-in-time copy)   (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use wavetile::telemetry::ThrottleMetrics;
//!
//! let metrics = ThrottleMetrics::new();
//! metrics.request_submitted();
//! metrics.request_admitted(1);
//! metrics.request_succeeded();
//!
//! let totals = metrics.totals();
//! assert_eq!(totals.succeeded, 1);
//! assert_eq!(totals.peak_active, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::ThrottleMetrics;
pub use snapshot::ThrottleTotals;
