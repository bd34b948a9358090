//! Core coordinate types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level accepted by the tile API.
///
/// Chart packages never go beyond z22; 24 leaves headroom while keeping
/// `2^zoom` comfortably inside a `u32`.
pub const MAX_ZOOM: u8 = 24;

/// Errors from coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -85.05112878 and 85.05112878)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (must be between 0 and 24)")]
    InvalidZoom(u8),

    #[error("Row {row} out of range at zoom {zoom}")]
    RowOutOfRange { zoom: u8, row: u32 },
}

/// A tile address using the standard (XYZ, north-up) row convention.
///
/// Row 0 is the northernmost row. Tile databases store rows in the inverted
/// (TMS, south-up) convention; use [`TileCoord::to_tms_row`] and
/// [`TileCoord::from_tms`] at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Column, west to east
    pub x: u32,
    /// Row, north to south
    pub y: u32,
}

impl TileCoord {
    /// Create a tile coordinate without validation.
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of rows (and columns) at this tile's zoom level.
    ///
    /// Returns `None` when the zoom level is too deep to address in a `u32`.
    pub fn rows_at_zoom(zoom: u8) -> Option<u32> {
        1u32.checked_shl(u32::from(zoom))
    }

    /// Row number of this tile under the inverted (TMS) convention.
    pub fn to_tms_row(&self) -> Result<u32, CoordError> {
        flip_row(self.zoom, self.y)
    }

    /// Build a standard coordinate from a stored (TMS) row.
    pub fn from_tms(zoom: u8, x: u32, tms_row: u32) -> Result<Self, CoordError> {
        Ok(Self {
            zoom,
            x,
            y: flip_row(zoom, tms_row)?,
        })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Convert a row between standard and inverted numbering.
///
/// The conversion is its own inverse: `flip_row(z, flip_row(z, y)) == y`.
pub fn flip_row(zoom: u8, row: u32) -> Result<u32, CoordError> {
    let rows = TileCoord::rows_at_zoom(zoom).ok_or(CoordError::InvalidZoom(zoom))?;
    if row >= rows {
        return Err(CoordError::RowOutOfRange { zoom, row });
    }
    Ok(rows - 1 - row)
}

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    /// Create a bounding box.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Bounds covering the whole Web Mercator world.
    pub fn world() -> Self {
        Self::new(MIN_LON, MIN_LAT, MAX_LON, MAX_LAT)
    }

    /// Whether the box wraps across the ±180° meridian (`west > east`).
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Whether the point lies inside the box (edges inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let in_lon = if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        };
        in_lon && lat >= self.south && lat <= self.north
    }

    /// Whether two boxes overlap (touching edges count).
    pub fn intersects(&self, other: &Bounds) -> bool {
        if self.south > other.north || self.north < other.south {
            return false;
        }
        let theirs = other.lon_spans();
        self.lon_spans().into_iter().flatten().any(|(west, east)| {
            theirs
                .into_iter()
                .flatten()
                .any(|(other_west, other_east)| west <= other_east && east >= other_west)
        })
    }

    /// Longitude intervals covered by the box; two when it wraps.
    fn lon_spans(&self) -> [Option<(f64, f64)>; 2] {
        if self.crosses_antimeridian() {
            [Some((self.west, MAX_LON)), Some((MIN_LON, self.east))]
        } else {
            [Some((self.west, self.east)), None]
        }
    }

    /// Whether the box is well formed: finite, `south ≤ north`, longitudes
    /// within ±180°. `west > east` is a box wrapping the antimeridian.
    pub fn is_valid(&self) -> bool {
        [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite())
            && self.south <= self.north
            && (MIN_LON..=MAX_LON).contains(&self.west)
            && (MIN_LON..=MAX_LON).contains(&self.east)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4}, {:.4}]",
            self.west, self.south, self.east, self.north
        )
    }
}
