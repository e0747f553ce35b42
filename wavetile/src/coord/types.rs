//! Coordinate types and bounds.

use std::fmt;

use thiserror::Error;

/// Southern latitude limit of the Web Mercator projection.
pub const MIN_LAT: f64 = -85.05112878;

/// Northern latitude limit of the Web Mercator projection.
pub const MAX_LAT: f64 = 85.05112878;

/// Western longitude limit.
pub const MIN_LON: f64 = -180.0;

/// Eastern longitude limit.
pub const MAX_LON: f64 = 180.0;

/// Lowest supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Highest supported zoom level.
///
/// Forecast grids are far coarser than this; higher zooms only multiply
/// identical tiles.
pub const MAX_ZOOM: u8 = 18;

/// Largest viewport radius, in tiles around the center tile.
pub const MAX_RADIUS: u32 = 16;

/// Half the circumference of the Web Mercator sphere, in metres.
pub const ORIGIN_SHIFT: f64 = 20_037_508.342_789_244;

/// Web Mercator XYZ tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Tile row (Y), counted from the north edge.
    pub row: u32,
    /// Tile column (X), counted from the antimeridian eastwards.
    pub col: u32,
    /// Zoom level.
    pub zoom: u8,
}

impl TileCoord {
    /// Number of tiles along one axis at this tile's zoom level.
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.zoom
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// Tile extent in EPSG:3857 metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MercatorBounds {
    /// Formats the bounds as a WMS `BBOX` value (`minx,miny,maxx,maxy`).
    pub fn to_bbox_string(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Errors from coordinate conversion and viewport construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude {0}: must be between -85.05112878 and 85.05112878")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}: must be between -180 and 180")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level {0}: must be between 0 and 18")]
    InvalidZoom(u8),

    #[error("Invalid viewport radius {0}: must be at most 16")]
    InvalidRadius(u32),
}
