//! WMS layer description and `GetMap` URL construction.

use reqwest::Url;

use super::{TimeStep, WmsError};
use crate::coord::{tile_bounds_mercator, TileCoord};

/// WMS protocol version used for every request.
pub const WMS_VERSION: &str = "1.3.0";

/// Default image format.
pub const DEFAULT_FORMAT: &str = "image/png";

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Coordinate reference system of the requested tiles.
const CRS: &str = "EPSG:3857";

/// A WMS layer served by a THREDDS/ncWMS endpoint.
///
/// ```
/// use wavetile::coord::TileCoord;
/// use wavetile::wms::WmsLayer;
///
/// let layer = WmsLayer::new("https://thredds.example.org/thredds/wms/waves", "hs")
///     .unwrap()
///     .with_color_scale_range(0.0, 4.0);
/// let url = layer.get_map_url(&TileCoord { row: 0, col: 0, zoom: 0 }, None);
/// assert!(url.contains("REQUEST=GetMap"));
/// assert!(url.contains("COLORSCALERANGE=0%2C4"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WmsLayer {
    base_url: Url,
    name: String,
    styles: String,
    format: String,
    transparent: bool,
    tile_size: u32,
    color_scale_range: Option<(f64, f64)>,
    num_color_bands: Option<u32>,
}

impl WmsLayer {
    /// Creates a layer for an http(s) WMS endpoint.
    ///
    /// Query parameters already present on `base_url` (e.g. a dataset
    /// selector) are kept and the `GetMap` parameters are appended.
    pub fn new(base_url: &str, name: impl Into<String>) -> Result<Self, WmsError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WmsError::InvalidLayer("layer name is empty".to_string()));
        }

        let base_url = Url::parse(base_url).map_err(|e| WmsError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(WmsError::UnsupportedScheme(base_url.scheme().to_string()));
        }
        if base_url.host_str().is_none() {
            return Err(WmsError::MissingHost(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            name,
            styles: String::new(),
            format: DEFAULT_FORMAT.to_string(),
            transparent: true,
            tile_size: DEFAULT_TILE_SIZE,
            color_scale_range: None,
            num_color_bands: None,
        })
    }

    /// Set the `STYLES` value (e.g. `boxfill/rainbow`).
    pub fn with_styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = styles.into();
        self
    }

    /// Set the image MIME type.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Set the tile edge length in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the ncWMS colour scale range.
    pub fn with_color_scale_range(mut self, min: f64, max: f64) -> Self {
        self.color_scale_range = Some((min, max));
        self
    }

    /// Set the ncWMS number of colour bands.
    pub fn with_num_color_bands(mut self, bands: u32) -> Self {
        self.num_color_bands = Some(bands);
        self
    }

    /// Layer name as sent in `LAYERS`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Host of the endpoint, the throttler's domain key for this layer.
    pub fn domain(&self) -> &str {
        // Checked in `new`
        self.base_url.host_str().unwrap_or_default()
    }

    /// File extension matching the image format (`png` for `image/png`).
    pub fn extension(&self) -> &str {
        match self.format.rsplit_once('/') {
            Some((_, subtype)) => subtype.split(';').next().unwrap_or(subtype),
            None => &self.format,
        }
    }

    /// Builds the `GetMap` URL for one tile, optionally at a forecast time.
    pub fn get_map_url(&self, tile: &TileCoord, time: Option<&TimeStep>) -> String {
        let bounds = tile_bounds_mercator(tile);
        let size = self.tile_size.to_string();

        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("SERVICE", "WMS")
                .append_pair("REQUEST", "GetMap")
                .append_pair("VERSION", WMS_VERSION)
                .append_pair("LAYERS", &self.name)
                .append_pair("STYLES", &self.styles)
                .append_pair("FORMAT", &self.format)
                .append_pair("TRANSPARENT", if self.transparent { "TRUE" } else { "FALSE" })
                .append_pair("CRS", CRS)
                .append_pair("BBOX", &bounds.to_bbox_string())
                .append_pair("WIDTH", &size)
                .append_pair("HEIGHT", &size);

            if let Some(time) = time {
                query.append_pair("TIME", &time.to_wms_string());
            }
            if let Some((min, max)) = self.color_scale_range {
                query.append_pair("COLORSCALERANGE", &format!("{},{}", min, max));
            }
            if let Some(bands) = self.num_color_bands {
                query.append_pair("NUMCOLORBANDS", &bands.to_string());
            }
        }

        url.into()
    }
}
