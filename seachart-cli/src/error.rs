//! CLI error handling with user-friendly messages.
//!
//! Every command returns [`CliError`]; `main` prints it and exits non-zero.

use std::fmt;
use std::path::PathBuf;
use std::process;

use seachart::config::ConfigFileError;
use seachart::coord::TileCoord;
use seachart::index::IndexError;
use seachart::server::ServerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// No chart index at the expected path
    IndexMissing(PathBuf),
    /// Malformed command-line value
    InvalidArgument(String),
    /// Chart index exists but is unusable
    Index(IndexError),
    /// Server initialization failed
    Server(ServerError),
    /// Chart is not in the index
    UnknownChart(String),
    /// Requested tile is not in the chart
    TileNotFound { chart_id: String, tile: TileCoord },
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::IndexMissing(_) => {
                eprintln!();
                eprintln!("Point --charts-dir at a directory containing chart_index.json,");
                eprintln!("or set [charts] directory in the config file.");
            }
            CliError::UnknownChart(_) => {
                eprintln!();
                eprintln!("Run `seachart index --list` to see the charts in the index.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::IndexMissing(path) => {
                write!(f, "Chart index not found: {}", path.display())
            }
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
            CliError::Index(e) => write!(f, "Chart index error: {}", e),
            CliError::Server(e) => write!(f, "Tile server error: {}", e),
            CliError::UnknownChart(id) => write!(f, "Chart '{}' is not in the index", id),
            CliError::TileNotFound { chart_id, tile } => write!(
                f,
                "Tile {}/{}/{} not found in chart '{}'",
                tile.zoom, tile.x, tile.y, chart_id
            ),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Index(e) => Some(e),
            CliError::Server(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<IndexError> for CliError {
    fn from(e: IndexError) -> Self {
        CliError::Index(e)
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Server(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_not_found_message() {
        let err = CliError::TileNotFound {
            chart_id: "us5ma1".to_string(),
            tile: TileCoord::new(13, 2479, 3029),
        };
        assert_eq!(
            err.to_string(),
            "Tile 13/2479/3029 not found in chart 'us5ma1'"
        );
    }

    #[test]
    fn test_index_missing_message() {
        let err = CliError::IndexMissing(PathBuf::from("/charts/chart_index.json"));
        assert!(err.to_string().contains("/charts/chart_index.json"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_file_write_has_source() {
        let err = CliError::FileWrite {
            path: PathBuf::from("out.pbf"),
            error: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
