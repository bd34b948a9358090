//! Dataset access errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from opening or querying a chart tile dataset.
///
/// `SourceMissing` is the expected "chart not installed" case and callers
/// treat it as absence; the other variants indicate a damaged or unreadable
/// dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file does not exist.
    #[error("Dataset not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    /// Copying the dataset into the staging directory failed.
    #[error("Failed to stage {} to {}: {source}", from.display(), to.display())]
    Stage {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite refused to open the dataset.
    #[error("Failed to open dataset {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A query against an open dataset failed.
    #[error("Query failed on chart {chart_id}: {source}")]
    Query {
        chart_id: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl DatasetError {
    /// Whether this error only means the dataset is not installed.
    pub fn is_missing(&self) -> bool {
        matches!(self, DatasetError::SourceMissing { .. })
    }
}
