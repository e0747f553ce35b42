//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! Web Mercator tile coordinates and EPSG:3857 tile extents, plus the
//! viewport model used to enumerate and prioritise the tiles of a map view.

mod types;
mod viewport;

pub use types::{
    CoordError, MercatorBounds, TileCoord, MAX_LAT, MAX_LON, MAX_RADIUS, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM, ORIGIN_SHIFT,
};
pub use viewport::Viewport;

use std::f64::consts::PI;

/// Validates a geographic position and zoom level.
fn validate(lat: f64, lon: f64, zoom: u8) -> Result<(), CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(())
}

/// Fractional tile position `(x, y)` of a validated coordinate.
fn fractional_tile(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let x = (lon + 180.0) / 360.0 * n;
    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;
    (x, y)
}

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 18)
///
/// Positions on the south or east world edge map to the last tile rather than
/// one past it.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    validate(lat, lon, zoom)?;

    let (x, y) = fractional_tile(lat, lon, zoom);
    let max_index = (1u32 << zoom) - 1;

    Ok(TileCoord {
        row: (y.max(0.0) as u32).min(max_index),
        col: (x.max(0.0) as u32).min(max_index),
        zoom,
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.col as f64 / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let y = tile.row as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Extent of a tile in EPSG:3857 metres, as used in WMS `BBOX` parameters.
pub fn tile_bounds_mercator(tile: &TileCoord) -> MercatorBounds {
    let size = 2.0 * ORIGIN_SHIFT / 2.0_f64.powi(tile.zoom as i32);
    let min_x = -ORIGIN_SHIFT + tile.col as f64 * size;
    let max_y = ORIGIN_SHIFT - tile.row as f64 * size;

    MercatorBounds {
        min_x,
        min_y: max_y - size,
        max_x: min_x + size,
        max_y,
    }
}
