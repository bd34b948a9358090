//! Default values for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::index::DEFAULT_TIER1_MAX_LEVEL;
use crate::memory::{PayloadEncoding, DEFAULT_BATCH_SIZE};
use crate::pool::DEFAULT_POOL_SIZE;

/// Default number of tier-2 charts preloaded per viewport.
pub const DEFAULT_PRELOAD_LIMIT: usize = 10;

/// Name of the configuration directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".seachart";

/// Default chart directory (~/.seachart/charts).
pub fn default_charts_dir() -> PathBuf {
    super::file::config_directory().join("charts")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            charts: ChartsSettings {
                directory: default_charts_dir(),
                manifest: None,
            },
            tier1: Tier1Settings {
                batch_size: DEFAULT_BATCH_SIZE,
                payload_encoding: PayloadEncoding::Raw,
            },
            tier2: Tier2Settings {
                pool_size: DEFAULT_POOL_SIZE,
                staging_dir: None,
            },
            viewport: ViewportSettings {
                preload_limit: DEFAULT_PRELOAD_LIMIT,
                tier1_max_level: DEFAULT_TIER1_MAX_LEVEL,
            },
        }
    }
}
