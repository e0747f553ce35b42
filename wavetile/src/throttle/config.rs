//! Throttler limits and timings.

use std::time::Duration;

/// Default global ceiling on active requests.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default ceiling on active requests per domain.
pub const DEFAULT_MAX_PER_DOMAIN: usize = 2;

/// Default minimum spacing between request starts, in milliseconds.
pub const DEFAULT_MIN_DELAY_MS: u64 = 50;

/// Default per-request load timeout, in milliseconds.
pub const DEFAULT_TILE_TIMEOUT_MS: u64 = 10_000;

/// Configuration for a [`RequestThrottler`](super::RequestThrottler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Maximum number of active requests across all domains.
    pub max_concurrent: usize,

    /// Maximum number of active requests for a single domain.
    pub max_per_domain: usize,

    /// Minimum time between two request starts (global, not per domain).
    pub min_delay: Duration,

    /// How long an active load may take before it is failed.
    ///
    /// Counted from the moment the load is triggered; time spent queued does
    /// not count.
    pub tile_timeout: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_per_domain: DEFAULT_MAX_PER_DOMAIN,
            min_delay: Duration::from_millis(DEFAULT_MIN_DELAY_MS),
            tile_timeout: Duration::from_millis(DEFAULT_TILE_TIMEOUT_MS),
        }
    }
}

impl ThrottleConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global concurrency ceiling.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set the per-domain concurrency ceiling.
    pub fn with_max_per_domain(mut self, max: usize) -> Self {
        self.max_per_domain = max;
        self
    }

    /// Set the minimum spacing between request starts.
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// Set the per-request load timeout.
    pub fn with_tile_timeout(mut self, timeout: Duration) -> Self {
        self.tile_timeout = timeout;
        self
    }

    /// Check that the limits allow any request to run at all.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be > 0".to_string());
        }
        if self.max_per_domain == 0 {
            return Err("max_per_domain must be > 0".to_string());
        }
        if self.tile_timeout.is_zero() {
            return Err("tile_timeout must be > 0".to_string());
        }
        Ok(())
    }
}
