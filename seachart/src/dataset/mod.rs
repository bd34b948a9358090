//! Chart dataset access.
//!
//! Each chart is an MBTiles file named `<chart_id>.mbtiles` inside the charts
//! directory. This module owns everything that touches those files:
//!
//! - [`TileDatabase`] - read-only SQLite access with TMS row translation
//! - [`StagedDataset`] - optional copy into a scratch directory before opening
//! - [`list_datasets`] - directory scan used when no index is available

mod error;
mod mbtiles;
mod staging;

use std::path::{Path, PathBuf};

pub use error::DatasetError;
pub use mbtiles::TileDatabase;
pub use staging::StagedDataset;

/// File extension of chart datasets.
pub const DATASET_EXTENSION: &str = "mbtiles";

/// Path of the dataset for `chart_id` inside `charts_dir`.
pub fn dataset_path(charts_dir: &Path, chart_id: &str) -> PathBuf {
    charts_dir.join(format!("{}.{}", chart_id, DATASET_EXTENSION))
}

/// Chart ids of all datasets present in `charts_dir`, sorted.
///
/// A missing directory yields an empty list.
pub fn list_datasets(charts_dir: &Path) -> std::io::Result<Vec<String>> {
    let entries = match std::fs::read_dir(charts_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(DATASET_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.push(stem.to_string());
        }
    }

    ids.sort();
    Ok(ids)
}
