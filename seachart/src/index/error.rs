//! Error types for chart index loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a chart index.
///
/// A missing manifest is not an error: [`ChartIndex::load`](super::ChartIndex::load)
/// reports it as `Ok(None)` so callers can fall back to a directory scan.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The manifest exists but could not be read.
    #[error("Failed to read chart manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The manifest is not valid JSON or does not match the schema.
    #[error("Failed to parse chart manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// The manifest parsed but violates a structural invariant.
    #[error("Invalid chart manifest: {0}")]
    Invalid(String),
}

impl IndexError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        IndexError::Invalid(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display() {
        let err = IndexError::invalid("chart 'a' lists unknown child 'b'");
        assert_eq!(
            err.to_string(),
            "Invalid chart manifest: chart 'a' lists unknown child 'b'"
        );
    }

    #[test]
    fn test_parse_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: IndexError = serde_err.into();
        assert!(matches!(err, IndexError::Parse(_)));
    }
}
