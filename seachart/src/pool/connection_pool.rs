//! Bounded pool of open Tier-2 datasets.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use super::stats::PoolStats;
use crate::coord::TileCoord;
use crate::dataset::{dataset_path, DatasetError, TileDatabase};

/// Smallest accepted pool capacity.
pub const MIN_POOL_SIZE: usize = 1;

/// Largest accepted pool capacity.
pub const MAX_POOL_SIZE: usize = 50;

/// Capacity used until [`ConnectionPool::init`] is called.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Clamp a requested capacity to `[MIN_POOL_SIZE, MAX_POOL_SIZE]`.
pub fn clamp_pool_size(size: usize) -> usize {
    size.clamp(MIN_POOL_SIZE, MAX_POOL_SIZE)
}

type SharedDatabase = Arc<Mutex<TileDatabase>>;

struct PooledHandle {
    db: SharedDatabase,
    last_access: Instant,
    access_count: u64,
}

struct PoolState {
    max_size: usize,
    charts_dir: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    handles: HashMap<String, PooledHandle>,
    /// Least recently used at the front. Same ids as `handles`.
    order: VecDeque<String>,
}

impl PoolState {
    fn touch(&mut self, chart_id: &str) -> Option<SharedDatabase> {
        let handle = self.handles.get_mut(chart_id)?;
        handle.last_access = Instant::now();
        handle.access_count += 1;
        let db = Arc::clone(&handle.db);

        // Linear in pool size, which is capped at MAX_POOL_SIZE.
        if self.order.back().map(String::as_str) != Some(chart_id) {
            if let Some(pos) = self.order.iter().position(|id| id == chart_id) {
                if let Some(id) = self.order.remove(pos) {
                    self.order.push_back(id);
                }
            }
        }
        Some(db)
    }

    fn insert(&mut self, chart_id: &str, db: TileDatabase) -> SharedDatabase {
        let db = Arc::new(Mutex::new(db));
        self.handles.insert(
            chart_id.to_string(),
            PooledHandle {
                db: Arc::clone(&db),
                last_access: Instant::now(),
                access_count: 1,
            },
        );
        self.order.push_back(chart_id.to_string());
        db
    }

    fn evict_head(&mut self) -> Option<String> {
        let chart_id = self.order.pop_front()?;
        self.handles.remove(&chart_id);
        Some(chart_id)
    }

    fn close_all(&mut self) -> usize {
        let count = self.handles.len();
        self.handles.clear();
        self.order.clear();
        count
    }
}

/// Tier-2 connection pool with least-recently-used eviction.
///
/// Resolving, opening and evicting handles happens under one lock, so two
/// requests can never open the same chart twice or both evict. The tile
/// query itself runs on the handle's own lock after the pool lock has been
/// released.
///
/// All methods block (SQLite I/O). Async callers should go through
/// `spawn_blocking`.
pub struct ConnectionPool {
    state: Mutex<PoolState>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    errors: AtomicU64,
}

impl ConnectionPool {
    /// Create an unconfigured pool. Lookups return `None` until
    /// [`init`](Self::init) sets the charts directory.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PoolState {
                max_size: DEFAULT_POOL_SIZE,
                charts_dir: None,
                staging_dir: None,
                handles: HashMap::new(),
                order: VecDeque::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Configure capacity and dataset locations. Performs no I/O.
    ///
    /// Re-initializing with a different directory closes every open handle.
    pub fn init(&self, max_size: usize, charts_dir: &Path, staging_dir: Option<&Path>) {
        let max_size = clamp_pool_size(max_size);
        let mut state = self.state.lock();

        let relocated = state.charts_dir.as_deref() != Some(charts_dir)
            || state.staging_dir.as_deref() != staging_dir;
        if relocated && !state.handles.is_empty() {
            let closed = state.close_all();
            debug!(closed = closed, "Pool relocated, closed open handles");
        }

        state.max_size = max_size;
        state.charts_dir = Some(charts_dir.to_path_buf());
        state.staging_dir = staging_dir.map(Path::to_path_buf);
        self.shrink_to(&mut state, max_size);

        info!(
            max_size = max_size,
            dir = %charts_dir.display(),
            staged = staging_dir.is_some(),
            "Connection pool configured"
        );
    }

    /// Fetch a tile from `chart_id`, opening its dataset if needed.
    ///
    /// Missing datasets, missing tiles and dataset failures all yield `None`;
    /// failures are logged and counted.
    pub fn get_tile(&self, chart_id: &str, tile: TileCoord) -> Option<Vec<u8>> {
        let db = self.acquire(chart_id)?;
        let db = db.lock();
        match db.get_tile(tile) {
            Ok(data) => {
                trace!(chart_id = %chart_id, tile = %tile, found = data.is_some(), "Tier-2 query");
                data
            }
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(chart_id = %chart_id, tile = %tile, error = %e, "Tier-2 query failed");
                None
            }
        }
    }

    /// Whether `chart_id` holds `tile`. Same resolution rules as
    /// [`get_tile`](Self::get_tile).
    pub fn has_tile(&self, chart_id: &str, tile: TileCoord) -> bool {
        let Some(db) = self.acquire(chart_id) else {
            return false;
        };
        let db = db.lock();
        match db.has_tile(tile) {
            Ok(found) => found,
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(chart_id = %chart_id, tile = %tile, error = %e, "Tier-2 query failed");
                false
            }
        }
    }

    /// Resolve an open handle for `chart_id`, opening (and evicting) as needed.
    fn acquire(&self, chart_id: &str) -> Option<SharedDatabase> {
        let mut state = self.state.lock();

        if let Some(db) = state.touch(chart_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(db);
        }

        let source = dataset_path(state.charts_dir.as_deref()?, chart_id);
        if !source.is_file() {
            trace!(chart_id = %chart_id, "Tier-2 dataset not present");
            return None;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let db = self.open(&state, chart_id, &source)?;

        while state.handles.len() >= state.max_size {
            self.evict_one(&mut state);
        }
        Some(state.insert(chart_id, db))
    }

    fn open(&self, state: &PoolState, chart_id: &str, source: &Path) -> Option<TileDatabase> {
        match TileDatabase::open(chart_id, source, state.staging_dir.as_deref()) {
            Ok(db) => {
                debug!(chart_id = %chart_id, staged = db.is_staged(), "Opened tier-2 dataset");
                Some(db)
            }
            Err(DatasetError::SourceMissing { .. }) => None,
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(chart_id = %chart_id, error = %e, "Failed to open tier-2 dataset");
                None
            }
        }
    }

    fn evict_one(&self, state: &mut PoolState) {
        if let Some(chart_id) = state.evict_head() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(chart_id = %chart_id, "Evicted tier-2 dataset");
        }
    }

    fn shrink_to(&self, state: &mut PoolState, max_size: usize) {
        while state.handles.len() > max_size {
            self.evict_one(state);
        }
    }

    /// Open the given charts ahead of need, in order.
    ///
    /// Charts already open are left where they are in the LRU order. Stops
    /// once the pool is full; preloading never evicts. Returns the number of
    /// charts opened.
    pub fn preload(&self, chart_ids: &[String]) -> usize {
        let mut opened = 0;
        for chart_id in chart_ids {
            let mut state = self.state.lock();
            if state.handles.len() >= state.max_size {
                break;
            }
            if state.handles.contains_key(chart_id) {
                continue;
            }
            let Some(dir) = state.charts_dir.as_deref() else {
                break;
            };
            let source = dataset_path(dir, chart_id);
            if !source.is_file() {
                continue;
            }
            if let Some(db) = self.open(&state, chart_id, &source) {
                state.insert(chart_id, db);
                opened += 1;
            }
        }

        if opened > 0 {
            debug!(requested = chart_ids.len(), opened = opened, "Preloaded tier-2 datasets");
        }
        opened
    }

    /// Change capacity (clamped), evicting least recently used handles if
    /// the pool is now over budget.
    pub fn set_pool_size(&self, size: usize) {
        let max_size = clamp_pool_size(size);
        let mut state = self.state.lock();
        state.max_size = max_size;
        self.shrink_to(&mut state, max_size);
        debug!(max_size = max_size, "Pool size changed");
    }

    pub fn max_size(&self) -> usize {
        self.state.lock().max_size
    }

    pub fn len(&self) -> usize {
        self.state.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `chart_id` has an open handle.
    pub fn contains(&self, chart_id: &str) -> bool {
        self.state.lock().handles.contains_key(chart_id)
    }

    /// Open charts, least recently used (next to be evicted) first.
    pub fn open_charts(&self) -> Vec<String> {
        self.state.lock().order.iter().cloned().collect()
    }

    /// Times `chart_id` was used since it was opened.
    pub fn access_count(&self, chart_id: &str) -> Option<u64> {
        self.state.lock().handles.get(chart_id).map(|h| h.access_count)
    }

    pub fn stats(&self) -> PoolStats {
        let (size, max_size) = {
            let state = self.state.lock();
            (state.handles.len(), state.max_size)
        };
        PoolStats {
            size,
            max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Close every handle and reset counters. Capacity and directories are
    /// kept.
    pub fn clear(&self) {
        let closed = self.state.lock().close_all();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        debug!(closed = closed, "Connection pool cleared");
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let state = self.state.lock();
        assert_eq!(state.order.len(), state.handles.len());
        let ordered: std::collections::HashSet<_> = state.order.iter().collect();
        assert_eq!(ordered.len(), state.order.len(), "duplicate ids in LRU order");
        assert!(state.order.iter().all(|id| state.handles.contains_key(id)));
        assert!(state.handles.len() <= state.max_size);
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("stats", &self.stats())
            .finish()
    }
}
