//! The tiered tile server façade.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::config::ServerConfig;
use super::error::ServerError;
use super::stats::{RequestCounters, ServerStats, ServerStatus};
use crate::coord::TileCoord;
use crate::index::{ChartIndex, Tier, ViewportCharts};
use crate::memory::MemoryTileCache;
use crate::pool::ConnectionPool;
use crate::progress::{LoadStage, ProgressSender};

/// Result of a successful initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Index loaded, Tier 1 resident, pool configured.
    Ready,
    /// No chart index was found. The server stays in the failed state and
    /// the caller should fall back to scanning the chart directory.
    IndexUnavailable,
}

type InitFuture = Shared<BoxFuture<'static, Result<InitOutcome, ServerError>>>;

enum State {
    Uninitialized,
    Initializing(InitFuture),
    Ready,
    Failed,
}

struct Lifecycle {
    state: State,
    /// Bumped by `shutdown()`; an initialization only commits if the
    /// generation it started under is still current.
    generation: u64,
    cancel: CancellationToken,
}

struct ServerInner {
    config: ServerConfig,
    lifecycle: Mutex<Lifecycle>,
    index: RwLock<Option<Arc<ChartIndex>>>,
    memory: MemoryTileCache,
    pool: ConnectionPool,
    counters: RequestCounters,
}

/// Routes tile requests to the in-memory tier or the connection pool.
///
/// Cheap to clone; clones share the same caches.
///
/// # Example
///
/// ```ignore
/// let server = TieredTileServer::new(ServerConfig::new("/data/charts"));
/// match server.initialize().await? {
///     InitOutcome::Ready => {}
///     InitOutcome::IndexUnavailable => return legacy_scan(),
/// }
///
/// server.preload_for_viewport(-71.05, 42.35, 13).await;
/// let tile = server.get_tile("us5ma1", TileCoord::new(13, 2479, 3029)).await;
/// ```
#[derive(Clone)]
pub struct TieredTileServer {
    inner: Arc<ServerInner>,
}

impl TieredTileServer {
    pub fn new(config: ServerConfig) -> Self {
        let memory = MemoryTileCache::new(config.tier1.clone());
        Self {
            inner: Arc::new(ServerInner {
                config,
                lifecycle: Mutex::new(Lifecycle {
                    state: State::Uninitialized,
                    generation: 0,
                    cancel: CancellationToken::new(),
                }),
                index: RwLock::new(None),
                memory,
                pool: ConnectionPool::new(),
                counters: RequestCounters::default(),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Load the index, fill Tier 1 and configure the pool.
    ///
    /// Concurrent calls share one initialization and its outcome; a call on
    /// a ready server returns immediately. After a failure the next call
    /// starts over.
    pub async fn initialize(&self) -> Result<InitOutcome, ServerError> {
        self.initialize_with_progress(None).await
    }

    /// [`initialize`](Self::initialize), reporting progress to `progress`.
    ///
    /// A call that joins an initialization already in flight does not
    /// receive events on its own sender.
    pub async fn initialize_with_progress(
        &self,
        progress: Option<ProgressSender>,
    ) -> Result<InitOutcome, ServerError> {
        let init = {
            let mut life = self.inner.lifecycle.lock();
            match &life.state {
                State::Ready => return Ok(InitOutcome::Ready),
                State::Initializing(init) => {
                    debug!("Joining initialization in progress");
                    init.clone()
                }
                State::Uninitialized | State::Failed => {
                    let generation = life.generation;
                    let cancel = life.cancel.clone();
                    let task = tokio::spawn(Arc::clone(&self.inner).run_init(
                        generation,
                        cancel,
                        progress,
                    ));

                    let inner = Arc::clone(&self.inner);
                    let init = async move {
                        match task.await {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                error!(error = %e, "Initialization task failed");
                                inner.mark_failed(generation);
                                Err(ServerError::from(e))
                            }
                        }
                    }
                    .boxed()
                    .shared();

                    life.state = State::Initializing(init.clone());
                    init
                }
            }
        };

        init.await
    }

    pub fn status(&self) -> ServerStatus {
        match self.inner.lifecycle.lock().state {
            State::Uninitialized => ServerStatus::Uninitialized,
            State::Initializing(_) => ServerStatus::Initializing,
            State::Ready => ServerStatus::Ready,
            State::Failed => ServerStatus::Failed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == ServerStatus::Ready
    }

    /// The loaded index, once ready.
    pub fn index(&self) -> Option<Arc<ChartIndex>> {
        self.inner.index.read().clone()
    }

    pub fn memory(&self) -> &MemoryTileCache {
        &self.inner.memory
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.inner.pool
    }

    /// Fetch a tile, routed by the chart's tier.
    ///
    /// Returns `None` for unknown charts, absent tiles, unreadable datasets
    /// and while the server is not ready.
    pub async fn get_tile(&self, chart_id: &str, tile: TileCoord) -> Option<Bytes> {
        let index = self.index()?;

        match index.tier(chart_id) {
            Some(Tier::Tier1) => {
                let data = self.inner.memory.get_tile(chart_id, tile);
                self.inner.counters.record_tier1(data.is_some());
                trace!(chart_id = %chart_id, tile = %tile, found = data.is_some(), "Tier-1 request");
                data
            }
            Some(Tier::Tier2) => {
                let inner = Arc::clone(&self.inner);
                let id = chart_id.to_string();
                let data = match tokio::task::spawn_blocking(move || inner.pool.get_tile(&id, tile))
                    .await
                {
                    Ok(data) => data.map(Bytes::from),
                    Err(e) => {
                        warn!(chart_id = %chart_id, error = %e, "Tier-2 lookup task failed");
                        None
                    }
                };
                self.inner.counters.record_tier2(data.is_some());
                data
            }
            None => {
                self.inner.counters.record_unrouted();
                trace!(chart_id = %chart_id, "Request for chart not in index");
                None
            }
        }
    }

    /// Whether a tile exists, with the same routing as
    /// [`get_tile`](Self::get_tile). Does not update request counters.
    pub async fn has_tile(&self, chart_id: &str, tile: TileCoord) -> bool {
        let Some(index) = self.index() else {
            return false;
        };

        match index.tier(chart_id) {
            Some(Tier::Tier1) => self.inner.memory.has_tile(chart_id, tile),
            Some(Tier::Tier2) => {
                let inner = Arc::clone(&self.inner);
                let id = chart_id.to_string();
                tokio::task::spawn_blocking(move || inner.pool.has_tile(&id, tile))
                    .await
                    .unwrap_or(false)
            }
            None => false,
        }
    }

    /// Charts relevant to a viewport. Empty while not ready.
    pub fn charts_for_viewport(&self, lon: f64, lat: f64, zoom: u8) -> ViewportCharts {
        self.index()
            .map(|index| index.find_for_viewport(lon, lat, zoom))
            .unwrap_or_default()
    }

    /// Open the Tier-2 charts relevant to a viewport ahead of need.
    ///
    /// At most `preload_limit` charts are considered, in index order.
    /// Returns the number of datasets opened.
    pub async fn preload_for_viewport(&self, lon: f64, lat: f64, zoom: u8) -> usize {
        let charts = self.charts_for_viewport(lon, lat, zoom);
        let ids: Vec<String> = charts
            .tier2
            .into_iter()
            .take(self.inner.config.preload_limit)
            .collect();
        self.preload_charts(ids).await
    }

    /// Open the given Tier-2 charts ahead of need. Returns the number opened.
    pub async fn preload_charts(&self, chart_ids: Vec<String>) -> usize {
        if chart_ids.is_empty() || !self.is_ready() {
            return 0;
        }

        let inner = Arc::clone(&self.inner);
        match tokio::task::spawn_blocking(move || inner.pool.preload(&chart_ids)).await {
            Ok(opened) => opened,
            Err(e) => {
                warn!(error = %e, "Preload task failed");
                0
            }
        }
    }

    pub fn get_stats(&self) -> ServerStats {
        ServerStats {
            status: self.status(),
            index_charts: self.index().map(|i| i.len()).unwrap_or(0),
            requests: self.inner.counters.snapshot(),
            tier1: self.inner.memory.stats(),
            tier2: self.inner.pool.stats(),
        }
    }

    /// Drop the index and both tiers and reset counters.
    ///
    /// An initialization still running is cancelled and will not commit.
    /// The server can be initialized again afterwards.
    pub fn shutdown(&self) {
        let mut life = self.inner.lifecycle.lock();
        life.generation += 1;
        life.cancel.cancel();
        life.cancel = CancellationToken::new();
        life.state = State::Uninitialized;
        *self.inner.index.write() = None;

        // Cleared under the lifecycle lock: an initialization started after
        // this call must not have its tier-1 load discarded by these clears.
        self.inner.memory.clear();
        self.inner.pool.clear();
        self.inner.counters.reset();
        drop(life);
        info!("Tile server shut down");
    }
}

impl std::fmt::Debug for TieredTileServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredTileServer")
            .field("status", &self.status())
            .field("charts_dir", &self.inner.config.charts_dir)
            .finish()
    }
}

impl ServerInner {
    async fn run_init(
        self: Arc<Self>,
        generation: u64,
        cancel: CancellationToken,
        progress: Option<ProgressSender>,
    ) -> Result<InitOutcome, ServerError> {
        let progress = progress.as_ref();
        let charts_dir = self.config.charts_dir.as_path();

        // Stage 1: chart index
        emit(progress, LoadStage::LoadingIndex, "Loading chart index");
        let index = match self.load_index().await {
            Ok(Some(index)) => Arc::new(index),
            Ok(None) => {
                warn!(
                    path = %self.config.manifest_path().display(),
                    "Chart index not found, directory scan fallback required"
                );
                self.mark_failed(generation);
                emit(progress, LoadStage::Failed, "Chart index not found");
                return Ok(InitOutcome::IndexUnavailable);
            }
            Err(e) => {
                error!(error = %e, "Failed to load chart index");
                self.mark_failed(generation);
                emit(progress, LoadStage::Failed, e.to_string());
                return Err(e);
            }
        };
        info!(
            charts = index.len(),
            tier1 = index.tier1_ids().len(),
            tier2 = index.tier2_ids().len(),
            "Chart index loaded"
        );
        if cancel.is_cancelled() {
            return Err(ServerError::Cancelled);
        }

        // Stage 2: Tier 1
        emit(progress, LoadStage::LoadingTier1, "Loading overview charts");
        let loaded = self.memory.load(&index, charts_dir, progress, &cancel).await;
        if cancel.is_cancelled() {
            return Err(ServerError::Cancelled);
        }
        if !loaded {
            warn!("Tier-1 load was interrupted, initialization failed");
            self.mark_failed(generation);
            emit(progress, LoadStage::Failed, "Tier-1 load interrupted");
            return Err(ServerError::Interrupted);
        }

        // Stage 3: Tier 2
        emit(progress, LoadStage::ConfiguringPool, "Configuring connection pool");
        self.pool.init(
            self.config.pool_size,
            charts_dir,
            self.config.staging_dir.as_deref(),
        );

        let mut life = self.lifecycle.lock();
        if life.generation != generation {
            return Err(ServerError::Cancelled);
        }
        *self.index.write() = Some(index);
        life.state = State::Ready;
        drop(life);

        emit(progress, LoadStage::Ready, "Tile server ready");
        info!(dir = %charts_dir.display(), "Tile server ready");
        Ok(InitOutcome::Ready)
    }

    async fn load_index(&self) -> Result<Option<ChartIndex>, ServerError> {
        let path = self.config.manifest_path();
        let policy = self.config.tier_policy;
        let index =
            tokio::task::spawn_blocking(move || ChartIndex::load_with_policy(&path, policy)).await??;
        Ok(index)
    }

    fn mark_failed(&self, generation: u64) {
        let mut life = self.lifecycle.lock();
        if life.generation == generation {
            life.state = State::Failed;
        }
    }
}

fn emit(progress: Option<&ProgressSender>, stage: LoadStage, message: impl Into<String>) {
    if let Some(progress) = progress {
        progress.stage(stage, message);
    }
}
