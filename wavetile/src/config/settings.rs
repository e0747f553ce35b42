//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::burst::{BurstConfig, DEFAULT_BURST_THRESHOLD, DEFAULT_STEP_DELAY_MS};
use crate::throttle::{
    ThrottleConfig, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_PER_DOMAIN, DEFAULT_MIN_DELAY_MS,
    DEFAULT_TILE_TIMEOUT_MS,
};
use crate::wms::DEFAULT_FORMAT;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "wavetile.log";

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub throttle: ThrottleSettings,
    pub burst: BurstSettings,
    pub wms: WmsSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Request throttler configuration from the `[throttle]` section.
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig::new()
            .with_max_concurrent(self.throttle.max_concurrent)
            .with_max_per_domain(self.throttle.max_per_domain)
            .with_min_delay(Duration::from_millis(self.throttle.min_delay_ms))
            .with_tile_timeout(Duration::from_millis(self.throttle.tile_timeout_ms))
    }

    /// Burst stager configuration from the `[burst]` section.
    pub fn burst_config(&self) -> BurstConfig {
        BurstConfig::new(
            self.burst.threshold,
            Duration::from_millis(self.burst.step_delay_ms),
        )
    }
}

/// `[throttle]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleSettings {
    pub max_concurrent: usize,
    pub max_per_domain: usize,
    pub min_delay_ms: u64,
    pub tile_timeout_ms: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_per_domain: DEFAULT_MAX_PER_DOMAIN,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            tile_timeout_ms: DEFAULT_TILE_TIMEOUT_MS,
        }
    }
}

/// `[burst]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstSettings {
    pub threshold: usize,
    pub step_delay_ms: u64,
}

impl Default for BurstSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BURST_THRESHOLD,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
        }
    }
}

/// `[wms]` section: the default forecast layer.
#[derive(Debug, Clone, PartialEq)]
pub struct WmsSettings {
    /// WMS endpoint, `None` when not configured.
    pub url: Option<String>,
    /// Layer name, `None` when not configured.
    pub layer: Option<String>,
    pub styles: String,
    pub format: String,
    /// ncWMS colour scale `(min, max)`.
    pub color_scale_range: Option<(f64, f64)>,
    pub num_color_bands: Option<u32>,
}

impl Default for WmsSettings {
    fn default() -> Self {
        Self {
            url: None,
            layer: None,
            styles: String::new(),
            format: DEFAULT_FORMAT.to_string(),
            color_scale_range: None,
            num_color_bands: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
