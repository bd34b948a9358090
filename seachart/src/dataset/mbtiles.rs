//! Read access to MBTiles chart datasets.
//!
//! MBTiles stores tiles in a SQLite `tiles` table keyed by
//! `(zoom_level, tile_column, tile_row)` with rows numbered in the inverted
//! (TMS) convention. [`TileDatabase`] is the only place that translation
//! happens: every method takes and returns standard (XYZ) coordinates.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::warn;

use super::error::DatasetError;
use super::staging::StagedDataset;
use crate::coord::TileCoord;

const SELECT_TILE: &str =
    "SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3";

const HAS_TILE: &str =
    "SELECT 1 FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3 LIMIT 1";

const SELECT_ALL: &str = "SELECT zoom_level, tile_column, tile_row, tile_data FROM tiles";

/// An open chart dataset.
///
/// Field order matters: the connection closes before a staged copy is
/// removed.
#[derive(Debug)]
pub struct TileDatabase {
    chart_id: String,
    conn: Connection,
    staged: StagedDataset,
}

impl TileDatabase {
    /// Open a dataset read-only, staging it first when `staging_dir` is set.
    pub fn open(
        chart_id: &str,
        source: &Path,
        staging_dir: Option<&Path>,
    ) -> Result<Self, DatasetError> {
        let staged = StagedDataset::prepare(chart_id, source, staging_dir)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(staged.path(), flags).map_err(|source| {
            DatasetError::Open {
                path: staged.path().to_path_buf(),
                source,
            }
        })?;

        // SQLite opens lazily; touch the schema so a corrupt file fails here
        // rather than on the first tile query.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|source| DatasetError::Open {
            path: staged.path().to_path_buf(),
            source,
        })?;

        Ok(Self {
            chart_id: chart_id.to_string(),
            conn,
            staged,
        })
    }

    pub fn chart_id(&self) -> &str {
        &self.chart_id
    }

    /// Whether the database was opened from a staged copy.
    pub fn is_staged(&self) -> bool {
        self.staged.is_staged()
    }

    /// Fetch one tile. Out-of-range coordinates are reported as absent.
    pub fn get_tile(&self, tile: TileCoord) -> Result<Option<Vec<u8>>, DatasetError> {
        let Ok(tms_row) = tile.to_tms_row() else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare_cached(SELECT_TILE).map_err(|e| self.query_err(e))?;
        stmt.query_row(params![tile.zoom, tile.x, tms_row], |row| row.get(0))
            .optional()
            .map_err(|e| self.query_err(e))
    }

    /// Whether a tile exists, without reading its payload.
    pub fn has_tile(&self, tile: TileCoord) -> Result<bool, DatasetError> {
        let Ok(tms_row) = tile.to_tms_row() else {
            return Ok(false);
        };

        let mut stmt = self.conn.prepare_cached(HAS_TILE).map_err(|e| self.query_err(e))?;
        stmt.exists(params![tile.zoom, tile.x, tms_row])
            .map_err(|e| self.query_err(e))
    }

    /// Visit every stored tile with its standard coordinate.
    ///
    /// Rows whose stored coordinates are out of range for their zoom level
    /// are skipped. Returns the number of tiles visited.
    pub fn for_each_tile<F>(&self, mut f: F) -> Result<usize, DatasetError>
    where
        F: FnMut(TileCoord, Vec<u8>),
    {
        let mut stmt = self.conn.prepare(SELECT_ALL).map_err(|e| self.query_err(e))?;
        let mut rows = stmt.query([]).map_err(|e| self.query_err(e))?;

        let mut visited = 0;
        let mut skipped = 0;
        while let Some(row) = rows.next().map_err(|e| self.query_err(e))? {
            let zoom: i64 = row.get(0).map_err(|e| self.query_err(e))?;
            let column: i64 = row.get(1).map_err(|e| self.query_err(e))?;
            let tms_row: i64 = row.get(2).map_err(|e| self.query_err(e))?;
            let data: Vec<u8> = row.get(3).map_err(|e| self.query_err(e))?;

            match stored_coord(zoom, column, tms_row) {
                Some(coord) => {
                    f(coord, data);
                    visited += 1;
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(chart_id = %self.chart_id, skipped = skipped, "Skipped tiles with invalid coordinates");
        }

        Ok(visited)
    }

    /// Contents of the MBTiles `metadata` table (name, format, bounds, ...).
    ///
    /// Datasets without a metadata table yield an empty map.
    pub fn metadata(&self) -> Result<BTreeMap<String, String>, DatasetError> {
        let has_table = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = 'metadata'")
            .and_then(|mut s| s.exists([]))
            .map_err(|e| self.query_err(e))?;
        if !has_table {
            return Ok(BTreeMap::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM metadata")
            .map_err(|e| self.query_err(e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| self.query_err(e))?;

        rows.collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(|e| self.query_err(e))
    }

    fn query_err(&self, source: rusqlite::Error) -> DatasetError {
        DatasetError::Query {
            chart_id: self.chart_id.clone(),
            source,
        }
    }
}

fn stored_coord(zoom: i64, column: i64, tms_row: i64) -> Option<TileCoord> {
    let zoom = u8::try_from(zoom).ok()?;
    let x = u32::try_from(column).ok()?;
    let tms_row = u32::try_from(tms_row).ok()?;
    if x >= TileCoord::rows_at_zoom(zoom)? {
        return None;
    }
    TileCoord::from_tms(zoom, x, tms_row).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_dataset;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing() {
        let temp = TempDir::new().unwrap();
        let err = TileDatabase::open("a", &temp.path().join("a.mbtiles"), None).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_open_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mbtiles");
        std::fs::write(&path, b"this is not a sqlite database at all, not even close").unwrap();
        let err = TileDatabase::open("a", &path, None).unwrap_err();
        assert!(matches!(err, DatasetError::Open { .. }));
    }

    #[test]
    fn test_get_tile_translates_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mbtiles");
        let tile = TileCoord::new(3, 2, 1);
        write_dataset(&path, &[(tile, b"payload".as_slice())]);

        let db = TileDatabase::open("a", &path, None).unwrap();
        assert_eq!(db.get_tile(tile).unwrap(), Some(b"payload".to_vec()));
        // The stored TMS row read as if it were a standard row must miss.
        let mirrored = TileCoord::new(3, 2, tile.to_tms_row().unwrap());
        assert_eq!(db.get_tile(mirrored).unwrap(), None);
        assert!(db.has_tile(tile).unwrap());
        assert!(!db.has_tile(mirrored).unwrap());
    }

    #[test]
    fn test_out_of_range_coordinate_is_absent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mbtiles");
        write_dataset(&path, &[(TileCoord::new(1, 0, 0), b"x".as_slice())]);

        let db = TileDatabase::open("a", &path, None).unwrap();
        assert_eq!(db.get_tile(TileCoord::new(1, 0, 7)).unwrap(), None);
        assert!(!db.has_tile(TileCoord::new(1, 0, 7)).unwrap());
    }

    #[test]
    fn test_for_each_tile_yields_standard_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mbtiles");
        let tiles = [
            (TileCoord::new(2, 1, 0), b"a".as_slice()),
            (TileCoord::new(2, 1, 3), b"b".as_slice()),
            (TileCoord::new(5, 17, 9), b"c".as_slice()),
        ];
        write_dataset(&path, &tiles);

        let db = TileDatabase::open("a", &path, None).unwrap();
        let mut seen = Vec::new();
        let count = db.for_each_tile(|coord, data| seen.push((coord, data))).unwrap();
        seen.sort();

        assert_eq!(count, 3);
        let mut expected: Vec<_> = tiles.iter().map(|(c, d)| (*c, d.to_vec())).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_staged_open_cleans_up() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mbtiles");
        write_dataset(&path, &[(TileCoord::new(0, 0, 0), b"x".as_slice())]);
        let scratch = temp.path().join("scratch");

        let db = TileDatabase::open("a", &path, Some(&scratch)).unwrap();
        assert!(db.is_staged());
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 1);
        assert_eq!(db.get_tile(TileCoord::new(0, 0, 0)).unwrap(), Some(b"x".to_vec()));

        drop(db);
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mbtiles");
        write_dataset(&path, &[]);

        let db = TileDatabase::open("a", &path, None).unwrap();
        let meta = db.metadata().unwrap();
        assert_eq!(meta.get("name").map(String::as_str), Some("a"));
        assert_eq!(meta.get("format").map(String::as_str), Some("pbf"));
    }
}
