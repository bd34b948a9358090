//! Staging of chart datasets before opening.
//!
//! On some platforms the packaged chart files live in a read-only or
//! sandboxed location that SQLite cannot open directly. Staging copies the
//! dataset into a process-local scratch directory first; the copy is removed
//! again when the [`StagedDataset`] is dropped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::error::DatasetError;

static STAGE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A dataset ready to be opened, possibly a staged copy of the source.
#[derive(Debug)]
pub struct StagedDataset {
    source: PathBuf,
    path: PathBuf,
    staged: bool,
}

impl StagedDataset {
    /// Prepare `source` for opening.
    ///
    /// With `staging_dir = None` the source is used in place. Otherwise the
    /// file is copied to a uniquely named file inside `staging_dir`.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::SourceMissing`] if `source` does not exist
    /// - [`DatasetError::Stage`] if the copy fails
    pub fn prepare(
        chart_id: &str,
        source: &Path,
        staging_dir: Option<&Path>,
    ) -> Result<Self, DatasetError> {
        if !source.is_file() {
            return Err(DatasetError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        let Some(dir) = staging_dir else {
            return Ok(Self {
                source: source.to_path_buf(),
                path: source.to_path_buf(),
                staged: false,
            });
        };

        let seq = STAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let target = dir.join(format!(
            "{}-{}-{}.mbtiles",
            chart_id,
            std::process::id(),
            seq
        ));

        let stage_err = |source_err| DatasetError::Stage {
            from: source.to_path_buf(),
            to: target.clone(),
            source: source_err,
        };

        std::fs::create_dir_all(dir).map_err(stage_err)?;
        let bytes = std::fs::copy(source, &target).map_err(stage_err)?;

        debug!(
            chart_id = %chart_id,
            staged = %target.display(),
            bytes = bytes,
            "Dataset staged"
        );

        Ok(Self {
            source: source.to_path_buf(),
            path: target,
            staged: true,
        })
    }

    /// Path to open.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original dataset path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether [`path`](Self::path) is a scratch copy.
    pub fn is_staged(&self) -> bool {
        self.staged
    }
}

impl Drop for StagedDataset {
    fn drop(&mut self) {
        if !self.staged {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staged dataset");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = StagedDataset::prepare("x", &temp.path().join("x.mbtiles"), None);
        assert!(matches!(result, Err(DatasetError::SourceMissing { .. })));
    }

    #[test]
    fn test_in_place_when_no_staging_dir() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("x.mbtiles");
        std::fs::write(&source, b"data").unwrap();

        let staged = StagedDataset::prepare("x", &source, None).unwrap();
        assert!(!staged.is_staged());
        assert_eq!(staged.path(), source.as_path());

        drop(staged);
        assert!(source.exists(), "in-place datasets must never be deleted");
    }

    #[test]
    fn test_staged_copy_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("x.mbtiles");
        std::fs::write(&source, b"data").unwrap();
        let scratch = temp.path().join("scratch");

        let staged = StagedDataset::prepare("x", &source, Some(&scratch)).unwrap();
        let copy = staged.path().to_path_buf();
        assert!(staged.is_staged());
        assert!(copy.starts_with(&scratch));
        assert_eq!(std::fs::read(&copy).unwrap(), b"data");

        drop(staged);
        assert!(!copy.exists());
        assert!(source.exists());
    }

    #[test]
    fn test_staged_names_are_unique() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("x.mbtiles");
        std::fs::write(&source, b"data").unwrap();
        let scratch = temp.path().join("scratch");

        let a = StagedDataset::prepare("x", &source, Some(&scratch)).unwrap();
        let b = StagedDataset::prepare("x", &source, Some(&scratch)).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_stage_failure_is_distinct_from_missing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("x.mbtiles");
        std::fs::write(&source, b"data").unwrap();
        // A regular file cannot be used as the staging directory.
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let result = StagedDataset::prepare("x", &source, Some(&blocker));
        assert!(matches!(result, Err(DatasetError::Stage { .. })));
    }
}
