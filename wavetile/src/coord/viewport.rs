//! Map viewport and tile prioritisation.
//!
//! A viewport is the square of tiles a map view needs around its center.
//! Tiles closer to the center get a lower priority value so the throttler
//! loads them first, which fills the screen from the middle outwards.

use super::{fractional_tile, to_tile_coords, validate, CoordError, TileCoord, MAX_RADIUS};

/// Visible area of a map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Center latitude in degrees.
    pub center_lat: f64,
    /// Center longitude in degrees.
    pub center_lon: f64,
    /// Zoom level of the tiles to load.
    pub zoom: u8,
    /// Tiles to include on each side of the center tile.
    pub radius: u32,
}

impl Viewport {
    /// Creates a validated viewport.
    pub fn new(
        center_lat: f64,
        center_lon: f64,
        zoom: u8,
        radius: u32,
    ) -> Result<Self, CoordError> {
        validate(center_lat, center_lon, zoom)?;
        if radius > MAX_RADIUS {
            return Err(CoordError::InvalidRadius(radius));
        }

        Ok(Self {
            center_lat,
            center_lon,
            zoom,
            radius,
        })
    }

    /// Tile containing the viewport center.
    pub fn center_tile(&self) -> Result<TileCoord, CoordError> {
        to_tile_coords(self.center_lat, self.center_lon, self.zoom)
    }

    /// Load priority of a tile: distance from the viewport center to the tile
    /// center, in thousandths of a tile at the tile's zoom level.
    ///
    /// Lower is more urgent. The center tile of a viewport whose center lies
    /// in the middle of a tile gets 0.
    pub fn priority_of(&self, tile: &TileCoord) -> i64 {
        let (x, y) = fractional_tile(self.center_lat, self.center_lon, tile.zoom);
        let dx = tile.col as f64 + 0.5 - x;
        let dy = tile.row as f64 + 0.5 - y;
        ((dx * dx + dy * dy).sqrt() * 1000.0).round() as i64
    }

    /// Tiles within `radius` of the center tile, most urgent first.
    ///
    /// The square is clipped at the world edges; it does not wrap around the
    /// antimeridian. Ties keep row-major order.
    pub fn tiles(&self) -> Result<Vec<TileCoord>, CoordError> {
        let center = self.center_tile()?;
        let max_index = center.tiles_per_axis() - 1;

        let span = |mid: u32| {
            mid.saturating_sub(self.radius)..=(mid + self.radius).min(max_index)
        };
        let rows = span(center.row);
        let cols = span(center.col);

        let mut tiles: Vec<TileCoord> = rows
            .flat_map(|row| {
                cols.clone().map(move |col| TileCoord {
                    row,
                    col,
                    zoom: self.zoom,
                })
            })
            .collect();
        tiles.sort_by_key(|tile| self.priority_of(tile));

        Ok(tiles)
    }
}
