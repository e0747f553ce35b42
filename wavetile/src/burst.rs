//! Burst staging for tile loading episodes.
//!
//! Map libraries fire a burst of tile requests whenever a layer is added or
//! the forecast time step changes:
//! - **Layer activation**: every visible tile of the new layer at once
//! - **Time step change**: the whole viewport again, for the next frame
//!
//! The burst stager spreads the first handful of those requests out in time.
//! Each tile seen during an episode is delayed a little longer than the one
//! before it, until a threshold is reached and staging switches itself off.
//!
//! ```text
//! reset()                                  threshold reached
//!    │   tile 1   tile 2   tile 3   ...   tile N
//!    ▼   100ms    200ms    300ms          0ms ──► not staging (0ms until reset)
//! ```

use std::time::Duration;

use parking_lot::Mutex;

/// Default number of tiles after which staging ends.
pub const DEFAULT_BURST_THRESHOLD: usize = 10;

/// Default delay increment per staged tile (100ms).
pub const DEFAULT_STEP_DELAY_MS: u64 = 100;

/// Configuration for burst staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstConfig {
    /// Number of tiles after which staging automatically ends.
    ///
    /// The tile that reaches the threshold is not delayed.
    pub threshold: usize,

    /// Delay unit multiplied by the number of tiles seen so far.
    pub step_delay: Duration,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BURST_THRESHOLD,
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
        }
    }
}

impl BurstConfig {
    /// Create a new burst configuration.
    pub fn new(threshold: usize, step_delay: Duration) -> Self {
        Self {
            threshold,
            step_delay,
        }
    }
}

/// Point-in-time view of the staging state for one loading episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstState {
    /// Whether burst suppression is active.
    pub is_staging: bool,

    /// Tiles processed in the current episode.
    pub tiles_seen: usize,
}

impl BurstState {
    fn initial() -> Self {
        Self {
            is_staging: true,
            tiles_seen: 0,
        }
    }
}

/// Computes start-up delays for the tiles of a loading episode.
///
/// All methods take `&self`; the stager is meant to be shared behind an
/// `Arc` by every tile load of a map view.
#[derive(Debug)]
pub struct BurstStager {
    config: BurstConfig,
    state: Mutex<BurstState>,
}

impl BurstStager {
    /// Create a stager with the given configuration.
    ///
    /// The stager starts in staging mode, as if `reset()` had just been called.
    pub fn new(config: BurstConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BurstState::initial()),
        }
    }

    /// Create a stager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(BurstConfig::default())
    }

    /// Delay to apply before issuing the next tile request.
    ///
    /// Returns zero outside of staging. During staging the n-th tile of the
    /// episode gets `n * step_delay`, except the tile that reaches the
    /// threshold, which ends staging and gets zero.
    pub fn delay_for_next_tile(&self) -> Duration {
        let mut state = self.state.lock();
        if !state.is_staging {
            return Duration::ZERO;
        }

        state.tiles_seen += 1;
        if state.tiles_seen >= self.config.threshold {
            state.is_staging = false;
            tracing::debug!(
                tiles_seen = state.tiles_seen,
                "Burst staging complete for episode"
            );
            return Duration::ZERO;
        }

        let factor = u32::try_from(state.tiles_seen).unwrap_or(u32::MAX);
        self.config.step_delay.saturating_mul(factor)
    }

    /// Start a new loading episode.
    ///
    /// Delays already handed out are unaffected; only future calls to
    /// [`delay_for_next_tile`](Self::delay_for_next_tile) see the new episode.
    pub fn reset(&self) {
        *self.state.lock() = BurstState::initial();
        tracing::debug!(
            threshold = self.config.threshold,
            "Burst staging reset for new episode"
        );
    }

    /// Leave staging mode without waiting for the threshold.
    pub fn disable(&self) {
        self.state.lock().is_staging = false;
    }

    /// Check if staging is currently active.
    pub fn is_staging(&self) -> bool {
        self.state.lock().is_staging
    }

    /// Tiles processed in the current episode.
    pub fn tiles_seen(&self) -> usize {
        self.state.lock().tiles_seen
    }

    /// Copy of the current staging state.
    pub fn state(&self) -> BurstState {
        *self.state.lock()
    }

    /// Get the current configuration.
    pub fn config(&self) -> &BurstConfig {
        &self.config
    }
}

impl Default for BurstStager {
    fn default() -> Self {
        Self::with_defaults()
    }
}
