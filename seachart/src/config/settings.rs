//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

use crate::index::DEFAULT_MANIFEST_FILE;
use crate::memory::PayloadEncoding;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub charts: ChartsSettings,
    pub tier1: Tier1Settings,
    pub tier2: Tier2Settings,
    pub viewport: ViewportSettings,
}

/// Chart dataset locations.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartsSettings {
    /// Directory holding `<chart_id>.mbtiles` datasets
    pub directory: PathBuf,
    /// Manifest file; `None` means `chart_index.json` inside `directory`
    pub manifest: Option<PathBuf>,
}

impl ChartsSettings {
    /// Effective manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.directory.join(DEFAULT_MANIFEST_FILE))
    }
}

/// Tier-1 (in-memory) cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier1Settings {
    /// Charts loaded concurrently per batch
    pub batch_size: usize,
    /// Encoding used for the memory estimate
    pub payload_encoding: PayloadEncoding,
}

/// Tier-2 (connection pool) settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier2Settings {
    /// Maximum open datasets
    pub pool_size: usize,
    /// Scratch directory for staged copies; `None` opens datasets in place
    pub staging_dir: Option<PathBuf>,
}

/// Viewport-driven behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSettings {
    /// Maximum tier-2 charts preloaded per viewport change
    pub preload_limit: usize,
    /// Highest chart level served from tier 1 when the manifest is silent
    pub tier1_max_level: u8,
}
