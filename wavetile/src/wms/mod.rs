//! WMS request building for time-animated forecast layers.
//!
//! Forecast overlays are served by THREDDS/ncWMS endpoints as WMS 1.3.0
//! `GetMap` images. Each map tile becomes one `GetMap` request in EPSG:3857
//! whose `BBOX` is the tile extent and whose `TIME` selects the forecast
//! step being displayed.

mod error;
mod layer;
mod time;

pub use error::WmsError;
pub use layer::{WmsLayer, DEFAULT_FORMAT, DEFAULT_TILE_SIZE, WMS_VERSION};
pub use time::{timeline, TimeStep};

use reqwest::Url;

/// Returns the host of a URL, used as the throttler's domain key.
///
/// Ports are not part of the key: two endpoints on the same host share the
/// per-domain limit.
pub fn origin_of(url: &str) -> Result<String, WmsError> {
    let parsed = Url::parse(url).map_err(|e| WmsError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| WmsError::MissingHost(url.to_string()))
}
