//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;

use rusqlite::{params, Connection};
use seachart::coord::TileCoord;
use seachart::dataset::dataset_path;
use seachart::index::DEFAULT_MANIFEST_FILE;
use tempfile::TempDir;

/// Write `<dir>/<chart_id>.mbtiles` holding `tiles` (XYZ row numbering).
///
/// Rows are stored flipped, as MBTiles requires.
pub fn write_chart(dir: &Path, chart_id: &str, tiles: &[(TileCoord, &[u8])]) {
    let conn = Connection::open(dataset_path(dir, chart_id)).unwrap();
    conn.execute_batch(
        "CREATE TABLE metadata (name TEXT, value TEXT);
         CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB);",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO metadata (name, value) VALUES ('name', ?1)",
        params![chart_id],
    )
    .unwrap();

    for (tile, data) in tiles {
        let tms_row = (1u32 << tile.zoom) - 1 - tile.y;
        conn.execute(
            "INSERT INTO tiles VALUES (?1, ?2, ?3, ?4)",
            params![tile.zoom, tile.x, tms_row, data],
        )
        .unwrap();
    }
}

/// A chart directory with a world overview (tier 1) and a Boston harbour
/// chart (tier 2), each holding one tile.
pub struct HarbourFixture {
    pub dir: TempDir,
}

/// Tile held by the overview chart.
pub const OVERVIEW_TILE: TileCoord = TileCoord {
    zoom: 3,
    x: 2,
    y: 2,
};

/// Tile held by the harbour chart, at zoom 12 over Boston harbour.
pub const HARBOUR_TILE: TileCoord = TileCoord {
    zoom: 12,
    x: 1239,
    y: 1515,
};

impl HarbourFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_MANIFEST_FILE), HARBOUR_INDEX).unwrap();
        write_chart(dir.path(), "overview", &[(OVERVIEW_TILE, b"overview-tile")]);
        write_chart(dir.path(), "harbour", &[(HARBOUR_TILE, b"harbour-tile")]);
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Root chart at level 1 covering the globe, one level-4 child around
/// Boston harbour. No explicit tier lists: tiers follow the level policy.
pub const HARBOUR_INDEX: &str = r#"{
    "version": 1,
    "charts": {
        "overview": {
            "bounds": [-180.0, -85.0, 180.0, 85.0],
            "level": 1, "minZoom": 0, "maxZoom": 6,
            "childIds": ["harbour"]
        },
        "harbour": {
            "bounds": [-71.2, 42.2, -70.9, 42.5],
            "level": 4, "minZoom": 10, "maxZoom": 15,
            "parentId": "overview"
        }
    },
    "roots": ["overview"]
}"#;
