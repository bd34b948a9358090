//! Server options.

use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, DEFAULT_PRELOAD_LIMIT};
use crate::index::{TierPolicy, DEFAULT_MANIFEST_FILE};
use crate::memory::{MemoryCacheConfig, PayloadEncoding};
use crate::pool::{clamp_pool_size, DEFAULT_POOL_SIZE};

/// Options for [`TieredTileServer`](super::TieredTileServer).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Directory holding `<chart_id>.mbtiles` datasets.
    pub charts_dir: PathBuf,
    /// Manifest path; `None` means `chart_index.json` in `charts_dir`.
    pub manifest_path: Option<PathBuf>,
    pub tier1: MemoryCacheConfig,
    /// Tier-2 pool capacity (clamped when applied).
    pub pool_size: usize,
    /// Scratch directory for staged tier-2 datasets.
    pub staging_dir: Option<PathBuf>,
    /// Tier-2 charts preloaded per viewport change.
    pub preload_limit: usize,
    pub tier_policy: TierPolicy,
}

impl ServerConfig {
    pub fn new(charts_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts_dir: charts_dir.into(),
            manifest_path: None,
            tier1: MemoryCacheConfig::default(),
            pool_size: DEFAULT_POOL_SIZE,
            staging_dir: None,
            preload_limit: DEFAULT_PRELOAD_LIMIT,
            tier_policy: TierPolicy::default(),
        }
    }

    /// Build options from the user's configuration file.
    ///
    /// The staging directory applies to both tiers.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            charts_dir: config.charts.directory.clone(),
            manifest_path: config.charts.manifest.clone(),
            tier1: MemoryCacheConfig {
                batch_size: config.tier1.batch_size,
                encoding: config.tier1.payload_encoding,
                staging_dir: config.tier2.staging_dir.clone(),
            },
            pool_size: config.tier2.pool_size,
            staging_dir: config.tier2.staging_dir.clone(),
            preload_limit: config.viewport.preload_limit,
            tier_policy: TierPolicy::new(config.viewport.tier1_max_level),
        }
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = clamp_pool_size(size);
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.tier1.staging_dir = Some(dir.clone());
        self.staging_dir = Some(dir);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.tier1.batch_size = batch_size.max(1);
        self
    }

    pub fn with_payload_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.tier1.encoding = encoding;
        self
    }

    pub fn with_preload_limit(mut self, limit: usize) -> Self {
        self.preload_limit = limit;
        self
    }

    pub fn with_tier_policy(mut self, policy: TierPolicy) -> Self {
        self.tier_policy = policy;
        self
    }

    /// Effective manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.charts_dir.join(DEFAULT_MANIFEST_FILE))
    }

    pub fn charts_dir(&self) -> &Path {
        &self.charts_dir
    }
}
