//! Tier-1 in-memory tile table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::loader::{read_chart, ChartTiles};
use super::stats::{MemoryCacheStats, PayloadEncoding};
use crate::coord::TileCoord;
use crate::dataset::dataset_path;
use crate::index::ChartIndex;
use crate::progress::{LoadProgress, LoadStage, ProgressSender};

/// Default number of charts read concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Tier-1 cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCacheConfig {
    /// Charts read concurrently per batch. Zero is treated as one.
    pub batch_size: usize,
    pub encoding: PayloadEncoding,
    /// Stage datasets here before reading; `None` reads in place.
    pub staging_dir: Option<PathBuf>,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            encoding: PayloadEncoding::default(),
            staging_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    Idle,
    Loading,
    Loaded,
}

#[derive(Debug)]
struct LoadState {
    phase: LoadPhase,
    /// Bumped by `clear()` so an in-flight load cannot commit stale data.
    epoch: u64,
}

/// Tier-1 tile table: the complete contents of every Tier-1 chart.
///
/// The table is only ever replaced wholesale (by [`load`](Self::load)) or
/// emptied (by [`clear`](Self::clear)). Lookups take a read lock, never
/// allocate and never touch disk.
pub struct MemoryTileCache {
    config: MemoryCacheConfig,
    table: RwLock<HashMap<String, ChartTiles>>,
    state: Mutex<LoadState>,
}

impl MemoryTileCache {
    pub fn new(config: MemoryCacheConfig) -> Self {
        Self {
            config,
            table: RwLock::new(HashMap::new()),
            state: Mutex::new(LoadState {
                phase: LoadPhase::Idle,
                epoch: 0,
            }),
        }
    }

    pub fn config(&self) -> &MemoryCacheConfig {
        &self.config
    }

    /// Load every Tier-1 chart of `index` found in `charts_dir`.
    ///
    /// Returns `true` once the table is loaded, immediately if it already
    /// was. Returns `false` without doing anything if another load is in
    /// progress, and `false` if this load was cancelled or cleared before it
    /// could finish.
    pub async fn load(
        &self,
        index: &ChartIndex,
        charts_dir: &Path,
        progress: Option<&ProgressSender>,
        cancel: &CancellationToken,
    ) -> bool {
        let ids = index.tier1_ids().into_iter().map(str::to_string).collect();
        self.load_charts(ids, charts_dir, progress, cancel).await
    }

    /// Load the given charts. Same contract as [`load`](Self::load).
    pub async fn load_charts(
        &self,
        chart_ids: Vec<String>,
        charts_dir: &Path,
        progress: Option<&ProgressSender>,
        cancel: &CancellationToken,
    ) -> bool {
        let epoch = {
            let mut state = self.state.lock();
            match state.phase {
                LoadPhase::Loaded => return true,
                LoadPhase::Loading => {
                    debug!("Tier-1 load already in progress");
                    return false;
                }
                // Checked under the state lock so a load cancelled before a
                // `clear()` can never claim the cleared cache.
                LoadPhase::Idle if cancel.is_cancelled() => return false,
                LoadPhase::Idle => {
                    state.phase = LoadPhase::Loading;
                    state.epoch
                }
            }
        };
        let _guard = LoadGuard { cache: self, epoch };

        let present = available_charts(chart_ids, charts_dir).await;
        let total = present.len();
        let batch_size = self.config.batch_size.max(1);

        info!(
            charts = total,
            batch_size = batch_size,
            dir = %charts_dir.display(),
            "Loading tier-1 charts into memory"
        );
        if let Some(progress) = progress {
            progress.send(LoadProgress::new(
                LoadStage::LoadingTier1,
                0,
                total,
                format!("Loading {} tier-1 charts", total),
            ));
        }

        let mut table = HashMap::with_capacity(total);
        let mut done = 0;
        for batch in present.chunks(batch_size) {
            if cancel.is_cancelled() {
                info!(loaded = done, total = total, "Tier-1 load cancelled");
                return false;
            }

            let tasks = batch.iter().map(|chart_id| {
                let chart_id = chart_id.clone();
                let source = dataset_path(charts_dir, &chart_id);
                let staging_dir = self.config.staging_dir.clone();
                let encoding = self.config.encoding;
                tokio::task::spawn_blocking(move || {
                    let result = read_chart(&chart_id, &source, staging_dir.as_deref(), encoding);
                    (chart_id, result)
                })
            });

            for joined in join_all(tasks).await {
                match joined {
                    Ok((chart_id, Ok(chart))) => {
                        debug!(chart_id = %chart_id, tiles = chart.tiles.len(), "Tier-1 chart loaded");
                        table.insert(chart_id, chart);
                    }
                    Ok((chart_id, Err(e))) if e.is_missing() => {
                        warn!(chart_id = %chart_id, "Tier-1 dataset disappeared, skipping");
                    }
                    Ok((chart_id, Err(e))) => {
                        warn!(chart_id = %chart_id, error = %e, "Failed to load tier-1 chart, skipping");
                    }
                    Err(e) => {
                        warn!(error = %e, "Tier-1 load task failed");
                    }
                }
            }

            done += batch.len();
            if let Some(progress) = progress {
                progress.send(LoadProgress::new(
                    LoadStage::LoadingTier1,
                    done,
                    total,
                    format!("Loaded {} of {} tier-1 charts", done, total),
                ));
            }
        }

        let mut state = self.state.lock();
        if state.epoch != epoch || state.phase != LoadPhase::Loading {
            debug!("Tier-1 cache cleared during load, discarding result");
            return false;
        }

        let tiles: usize = table.values().map(|c| c.tiles.len()).sum();
        let charts = table.len();
        *self.table.write() = table;
        state.phase = LoadPhase::Loaded;

        info!(charts = charts, tiles = tiles, "Tier-1 cache loaded");
        true
    }

    /// Return to `Idle` unless the load committed or the cache was cleared.
    fn abandon(&self, epoch: u64) {
        let mut state = self.state.lock();
        if state.epoch == epoch && state.phase == LoadPhase::Loading {
            state.phase = LoadPhase::Idle;
        }
    }

    pub fn get_tile(&self, chart_id: &str, tile: TileCoord) -> Option<Bytes> {
        self.table.read().get(chart_id)?.tiles.get(&tile).cloned()
    }

    pub fn has_tile(&self, chart_id: &str, tile: TileCoord) -> bool {
        self.table
            .read()
            .get(chart_id)
            .is_some_and(|chart| chart.tiles.contains_key(&tile))
    }

    /// Whether `chart_id` was loaded into the table.
    pub fn contains_chart(&self, chart_id: &str) -> bool {
        self.table.read().contains_key(chart_id)
    }

    /// Loaded chart ids, sorted.
    pub fn chart_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.table.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().phase == LoadPhase::Loading
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().phase == LoadPhase::Loaded
    }

    pub fn stats(&self) -> MemoryCacheStats {
        let table = self.table.read();
        let mut stats = MemoryCacheStats {
            chart_count: table.len(),
            ..Default::default()
        };
        for chart in table.values() {
            stats.tile_count += chart.tiles.len();
            stats.payload_bytes += chart.payload_bytes;
            stats.estimated_memory_bytes += chart.estimated_bytes;
        }
        stats
    }

    /// Drop every tile and return to the unloaded state.
    ///
    /// A load still running when this is called finishes without committing.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.phase = LoadPhase::Idle;
        let mut table = self.table.write();
        let charts = table.len();
        table.clear();
        table.shrink_to_fit();
        debug!(charts = charts, "Tier-1 cache cleared");
    }
}

/// Releases a claimed load however `load_charts` exits, including when its
/// future is dropped mid-load.
struct LoadGuard<'a> {
    cache: &'a MemoryTileCache,
    epoch: u64,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.cache.abandon(self.epoch);
    }
}

impl Default for MemoryTileCache {
    fn default() -> Self {
        Self::new(MemoryCacheConfig::default())
    }
}

impl std::fmt::Debug for MemoryTileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTileCache")
            .field("config", &self.config)
            .field("phase", &self.state.lock().phase)
            .field("charts", &self.table.read().len())
            .finish()
    }
}

/// Keep the charts whose dataset exists; warn about the rest.
async fn available_charts(chart_ids: Vec<String>, charts_dir: &Path) -> Vec<String> {
    let dir = charts_dir.to_path_buf();
    let scan = tokio::task::spawn_blocking(move || {
        chart_ids
            .into_iter()
            .partition::<Vec<_>, _>(|id| dataset_path(&dir, id).is_file())
    });

    match scan.await {
        Ok((present, missing)) => {
            for chart_id in &missing {
                warn!(chart_id = %chart_id, "Tier-1 dataset not found, skipping");
            }
            present
        }
        Err(e) => {
            warn!(error = %e, "Tier-1 dataset scan failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TierPolicy;
    use crate::test_support::write_dataset;
    use std::sync::Arc;
    use tempfile::TempDir;

    const INDEX: &str = r#"{ "charts": {
        "a": { "bounds": [-180.0, -85.0, 0.0, 85.0], "level": 1 },
        "b": { "bounds": [0.0, -85.0, 180.0, 85.0], "level": 2 },
        "c": { "bounds": [-10.0, -10.0, 10.0, 10.0], "level": 3 },
        "h": { "bounds": [1.0, 1.0, 2.0, 2.0], "level": 5, "minZoom": 12 }
    } }"#;

    fn index() -> ChartIndex {
        ChartIndex::from_json_str(INDEX, TierPolicy::default()).unwrap()
    }

    /// Write a, b, c (tier 1) and h (tier 2); each holds two tiles.
    fn charts_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        for id in ["a", "b", "c", "h"] {
            write_dataset(
                &dataset_path(temp.path(), id),
                &[
                    (TileCoord::new(0, 0, 0), id.as_bytes()),
                    (TileCoord::new(2, 1, 3), b"abc".as_slice()),
                ],
            );
        }
        temp
    }

    #[tokio::test]
    async fn test_load_tier1_only() {
        let dir = charts_dir();
        let cache = MemoryTileCache::default();

        assert!(cache.load(&index(), dir.path(), None, &CancellationToken::new()).await);
        assert!(cache.is_loaded());
        assert_eq!(cache.chart_ids(), vec!["a", "b", "c"]);
        assert!(!cache.contains_chart("h"));

        let stats = cache.stats();
        assert_eq!(stats.chart_count, 3);
        assert_eq!(stats.tile_count, 6);
        assert_eq!(stats.payload_bytes, 3 * (1 + 3));
    }

    #[tokio::test]
    async fn test_get_tile_uses_standard_rows() {
        let dir = charts_dir();
        let cache = MemoryTileCache::default();
        cache.load(&index(), dir.path(), None, &CancellationToken::new()).await;

        assert_eq!(
            cache.get_tile("b", TileCoord::new(2, 1, 3)).as_deref(),
            Some(b"abc".as_slice())
        );
        // Storage row for y=3 at zoom 2 is 0; it must not be reachable.
        assert!(cache.get_tile("b", TileCoord::new(2, 1, 0)).is_none());
        assert!(cache.has_tile("a", TileCoord::new(0, 0, 0)));
        assert!(!cache.has_tile("h", TileCoord::new(0, 0, 0)));
        assert!(!cache.has_tile("zz", TileCoord::new(0, 0, 0)));
    }

    #[tokio::test]
    async fn test_missing_dataset_skipped() {
        let dir = charts_dir();
        std::fs::remove_file(dataset_path(dir.path(), "b")).unwrap();
        let cache = MemoryTileCache::default();

        assert!(cache.load(&index(), dir.path(), None, &CancellationToken::new()).await);
        assert_eq!(cache.chart_ids(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_corrupt_dataset_skipped() {
        let dir = charts_dir();
        std::fs::write(dataset_path(dir.path(), "c"), b"garbage that is not sqlite at all..").unwrap();
        let cache = MemoryTileCache::default();

        assert!(cache.load(&index(), dir.path(), None, &CancellationToken::new()).await);
        assert_eq!(cache.chart_ids(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_dropped_load_releases_state() {
        let dir = charts_dir();
        let cache = MemoryTileCache::default();
        let index = index();
        let cancel = CancellationToken::new();

        let mut load = Box::pin(cache.load(&index, dir.path(), None, &cancel));
        assert!(futures::poll!(&mut load).is_pending());
        assert!(cache.is_loading());

        drop(load);
        assert!(!cache.is_loading());
        assert!(!cache.is_loaded());

        assert!(cache.load(&index, dir.path(), None, &cancel).await);
        assert_eq!(cache.stats().chart_count, 3);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let dir = charts_dir();
        let cache = MemoryTileCache::default();
        let cancel = CancellationToken::new();

        assert!(cache.load(&index(), dir.path(), None, &cancel).await);
        std::fs::remove_file(dataset_path(dir.path(), "a")).unwrap();
        assert!(cache.load(&index(), dir.path(), None, &cancel).await);
        assert_eq!(cache.stats().chart_count, 3);
    }

    #[tokio::test]
    async fn test_concurrent_load_does_not_double_load() {
        let dir = charts_dir();
        let cache = Arc::new(MemoryTileCache::default());
        let index = index();
        let cancel = CancellationToken::new();

        // join! polls the first future first, so it claims the load.
        let (first, second) = tokio::join!(
            cache.load(&index, dir.path(), None, &cancel),
            async {
                let loading = cache.is_loading();
                (loading, cache.load(&index, dir.path(), None, &cancel).await)
            }
        );

        assert!(first);
        assert_eq!(second, (true, false));
        assert!(cache.is_loaded());
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_progress_reported_per_batch() {
        let dir = charts_dir();
        let cache = MemoryTileCache::new(MemoryCacheConfig {
            batch_size: 2,
            ..Default::default()
        });
        let progress = ProgressSender::new();
        let mut rx = progress.subscribe();

        cache
            .load(&index(), dir.path(), Some(&progress), &CancellationToken::new())
            .await;

        let mut counts = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.stage, LoadStage::LoadingTier1);
            assert_eq!(event.total, 3);
            counts.push(event.current);
        }
        assert_eq!(counts, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_cancelled_load_leaves_cache_idle() {
        let dir = charts_dir();
        let cache = MemoryTileCache::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(!cache.load(&index(), dir.path(), None, &cancel).await);
        assert!(!cache.is_loaded());
        assert!(!cache.is_loading());
        assert_eq!(cache.stats(), MemoryCacheStats::default());

        assert!(cache.load(&index(), dir.path(), None, &CancellationToken::new()).await);
    }

    #[tokio::test]
    async fn test_clear_resets() {
        let dir = charts_dir();
        let cache = MemoryTileCache::default();
        cache.load(&index(), dir.path(), None, &CancellationToken::new()).await;

        cache.clear();
        assert!(!cache.is_loaded());
        assert!(cache.get_tile("a", TileCoord::new(0, 0, 0)).is_none());
        assert_eq!(cache.stats().tile_count, 0);
    }

    #[tokio::test]
    async fn test_base64_estimate() {
        let dir = charts_dir();
        let cache = MemoryTileCache::new(MemoryCacheConfig {
            encoding: PayloadEncoding::Base64,
            ..Default::default()
        });
        cache.load(&index(), dir.path(), None, &CancellationToken::new()).await;

        let stats = cache.stats();
        // Each chart: a 1-byte tile (4 encoded) and a 3-byte tile (4 encoded).
        assert_eq!(stats.estimated_memory_bytes, 3 * 8);
        assert_eq!(stats.payload_bytes, 3 * 4);
    }
}
