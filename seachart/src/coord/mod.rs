//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator tile coordinates, plus the row-convention translation
//! between the public (XYZ) numbering and the inverted (TMS) numbering used
//! inside MBTiles datasets.

mod types;

pub use types::{
    flip_row, Bounds, CoordError, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `zoom` - Zoom level (0 to 24)
#[inline]
pub fn to_tile_coords(lon: f64, lat: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (n as u32).saturating_sub(1);

    // lon = 180 and lat = MIN_LAT land exactly on the far edge; clamp them
    // back into the last column/row.
    let x = (((lon + 180.0) / 360.0 * n) as u32).min(max_index);

    let lat_rad = lat * PI / 180.0;
    let y = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32).min(max_index);

    Ok(TileCoord { zoom, x, y })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the `(lon, lat)` of the tile's northwest corner.
#[inline]
pub fn tile_to_lon_lat(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lon, lat)
}

/// Geographic bounds covered by a tile.
pub fn tile_bounds(tile: &TileCoord) -> Bounds {
    let (west, north) = tile_to_lon_lat(tile);
    let (east, south) = tile_to_lon_lat(&TileCoord::new(tile.zoom, tile.x + 1, tile.y + 1));
    Bounds::new(west, south, east, north)
}
