//! Bulk reading of Tier-1 datasets.

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;

use super::stats::PayloadEncoding;
use crate::coord::TileCoord;
use crate::dataset::{DatasetError, TileDatabase};

/// Every tile of one chart, keyed by standard coordinate.
#[derive(Debug, Default)]
pub(super) struct ChartTiles {
    pub tiles: HashMap<TileCoord, Bytes>,
    pub payload_bytes: u64,
    pub estimated_bytes: u64,
}

/// Read the whole dataset of `chart_id`. Blocking.
pub(super) fn read_chart(
    chart_id: &str,
    source: &Path,
    staging_dir: Option<&Path>,
    encoding: PayloadEncoding,
) -> Result<ChartTiles, DatasetError> {
    let db = TileDatabase::open(chart_id, source, staging_dir)?;

    let mut chart = ChartTiles::default();
    db.for_each_tile(|coord, data| {
        chart.payload_bytes += data.len() as u64;
        chart.estimated_bytes += encoding.encoded_len(data.len());
        chart.tiles.insert(coord, Bytes::from(data));
    })?;

    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_dataset;
    use tempfile::TempDir;

    #[test]
    fn test_read_chart_accounts_sizes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.mbtiles");
        write_dataset(
            &path,
            &[
                (TileCoord::new(1, 0, 0), [0u8; 3].as_slice()),
                (TileCoord::new(1, 1, 1), [0u8; 5].as_slice()),
            ],
        );

        let chart = read_chart("a", &path, None, PayloadEncoding::Base64).unwrap();
        assert_eq!(chart.tiles.len(), 2);
        assert_eq!(chart.payload_bytes, 8);
        assert_eq!(chart.estimated_bytes, 4 + 8);
        assert_eq!(chart.tiles[&TileCoord::new(1, 1, 1)].len(), 5);
    }

    #[test]
    fn test_read_chart_missing() {
        let temp = TempDir::new().unwrap();
        let err = read_chart("a", &temp.path().join("a.mbtiles"), None, PayloadEncoding::Raw)
            .unwrap_err();
        assert!(err.is_missing());
    }
}
