//! Fixture helpers shared by unit tests.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::coord::TileCoord;

/// Write an MBTiles file holding `tiles` (standard row numbering).
pub fn write_dataset(path: &Path, tiles: &[(TileCoord, &[u8])]) {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("chart")
        .to_string();

    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE metadata (name TEXT, value TEXT);
         CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB);
         CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO metadata (name, value) VALUES ('name', ?1), ('format', 'pbf')",
        params![name],
    )
    .unwrap();

    for (coord, data) in tiles {
        conn.execute(
            "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)",
            params![coord.zoom, coord.x, coord.to_tms_row().unwrap(), data],
        )
        .unwrap();
    }
}

/// Chart index JSON with one world-wide overview and one harbour chart.
///
/// `overview` is level 1 (tier 1, zooms 0-6) and `harbour` is level 4
/// (tier 2, zooms 10-15) around Boston harbour.
pub const TWO_CHART_INDEX: &str = r#"{
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
    "roots": ["overview"],
    "tier1": ["overview"],
    "tier2": ["harbour"]
}"#;
