//! Shared helpers for CLI commands.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use seachart::config::{config_file_path, ConfigFile};
use seachart::index::ChartIndex;
use seachart::progress::{LoadProgress, ProgressSender};
use seachart::server::{InitOutcome, ServerConfig, TieredTileServer};
use tokio::runtime::Runtime;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Chart directory (overrides [charts] directory in the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Configuration file (default: ~/.seachart/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }

    /// Load the configuration file and apply command-line overrides.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        let mut config = ConfigFile::load_from(&self.config_path())?;
        if let Some(dir) = &self.charts_dir {
            config.charts.directory = dir.clone();
        }
        Ok(config)
    }

    pub fn server_config(&self) -> Result<ServerConfig, CliError> {
        Ok(ServerConfig::from_config_file(&self.load_config()?))
    }
}

/// Load the chart index the server would use.
pub fn load_index(config: &ServerConfig) -> Result<ChartIndex, CliError> {
    let path = config.manifest_path();
    ChartIndex::load_with_policy(&path, config.tier_policy)?.ok_or(CliError::IndexMissing(path))
}

pub fn runtime() -> Result<Runtime, CliError> {
    Runtime::new().map_err(CliError::Runtime)
}

/// Initialize `server`, rendering progress events on a progress bar.
///
/// A missing index is reported as [`CliError::IndexMissing`].
pub async fn initialize_with_bar(server: &TieredTileServer) -> Result<(), CliError> {
    let progress = ProgressSender::new();
    let mut events = progress.subscribe();
    let bar = progress_bar();

    let init = server.initialize_with_progress(Some(progress));
    tokio::pin!(init);

    let mut open = true;
    let outcome = loop {
        tokio::select! {
            outcome = &mut init => break outcome,
            event = events.recv(), if open => match event {
                Ok(event) => render(&bar, &event),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => open = false,
            },
        }
    };

    loop {
        match events.try_recv() {
            Ok(event) => render(&bar, &event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    bar.finish_and_clear();

    match outcome? {
        InitOutcome::Ready => Ok(()),
        InitOutcome::IndexUnavailable => {
            Err(CliError::IndexMissing(server.config().manifest_path()))
        }
    }
}

fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let bar = ProgressBar::new(0);
    bar.set_style(style);
    bar
}

fn render(bar: &ProgressBar, event: &LoadProgress) {
    bar.set_length(event.total as u64);
    bar.set_position(event.current as u64);
    bar.set_message(format!("{}: {}", event.stage, event.message));
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_charts_dir_overrides_config() {
        let temp = TempDir::new().unwrap();
        let args = GlobalArgs {
            charts_dir: Some(temp.path().join("charts")),
            config: Some(temp.path().join("missing.ini")),
        };

        let config = args.server_config().unwrap();
        assert_eq!(config.charts_dir, temp.path().join("charts"));
        assert_eq!(
            config.manifest_path(),
            temp.path().join("charts").join("chart_index.json")
        );
    }

    #[test]
    fn test_load_index_reports_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let config = ServerConfig::new(temp.path());

        match load_index(&config) {
            Err(CliError::IndexMissing(path)) => {
                assert_eq!(path, temp.path().join("chart_index.json"))
            }
            other => panic!("expected IndexMissing, got {:?}", other.map(|i| i.len())),
        }
    }
}
