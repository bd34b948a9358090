//! Availability and registration bookkeeping.

use dashmap::DashSet;
use tracing::{debug, info, warn};

use crate::dataset::list_datasets;
use crate::index::ViewportCharts;
use crate::server::TieredTileServer;

/// What [`ChartManager::ensure_charts_for_viewport`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportUpdate {
    /// Charts relevant to the viewport.
    pub charts: ViewportCharts,
    /// Tier-2 charts registered by this call.
    pub newly_registered: Vec<String>,
    /// Datasets opened ahead of need.
    pub preloaded: usize,
}

/// Tracks which charts the tile endpoint may serve.
///
/// A chart is *available* when its dataset is on disk and the index knows
/// it. Tier-1 charts are *registered* as soon as they are available; Tier-2
/// charts are registered the first time a viewport needs them.
#[derive(Debug)]
pub struct ChartManager {
    server: TieredTileServer,
    available: DashSet<String>,
    registered: DashSet<String>,
}

impl ChartManager {
    pub fn new(server: TieredTileServer) -> Self {
        Self {
            server,
            available: DashSet::new(),
            registered: DashSet::new(),
        }
    }

    pub fn server(&self) -> &TieredTileServer {
        &self.server
    }

    /// Rescan the chart directory and rebuild both sets.
    ///
    /// Without a loaded index every dataset on disk is available and nothing
    /// is registered. Returns the number of available charts.
    pub async fn refresh(&self) -> std::io::Result<usize> {
        let dir = self.server.config().charts_dir.clone();
        let on_disk = tokio::task::spawn_blocking(move || list_datasets(&dir))
            .await
            .map_err(std::io::Error::other)??;

        self.available.clear();
        self.registered.clear();

        let Some(index) = self.server.index() else {
            warn!(datasets = on_disk.len(), "No chart index loaded, charts are unregistered");
            for id in on_disk {
                self.available.insert(id);
            }
            return Ok(self.available.len());
        };

        let mut unindexed = 0;
        for id in on_disk {
            if index.is_tier1(&id) {
                self.registered.insert(id.clone());
                self.available.insert(id);
            } else if index.is_tier2(&id) {
                self.available.insert(id);
            } else {
                unindexed += 1;
                debug!(chart_id = %id, "Dataset not in chart index, ignoring");
            }
        }

        info!(
            available = self.available.len(),
            registered = self.registered.len(),
            unindexed = unindexed,
            "Chart availability refreshed"
        );
        Ok(self.available.len())
    }

    pub fn is_available(&self, chart_id: &str) -> bool {
        self.available.contains(chart_id)
    }

    pub fn is_registered(&self, chart_id: &str) -> bool {
        self.registered.contains(chart_id)
    }

    /// Available chart ids, sorted.
    pub fn available_charts(&self) -> Vec<String> {
        sorted(&self.available)
    }

    /// Registered chart ids, sorted.
    pub fn registered_charts(&self) -> Vec<String> {
        sorted(&self.registered)
    }

    /// Charts relevant to a viewport, from the index.
    pub fn charts_for_viewport(&self, lon: f64, lat: f64, zoom: u8) -> ViewportCharts {
        self.server.charts_for_viewport(lon, lat, zoom)
    }

    /// Register the available Tier-2 charts a viewport needs and open them
    /// ahead of the first tile request.
    pub async fn ensure_charts_for_viewport(&self, lon: f64, lat: f64, zoom: u8) -> ViewportUpdate {
        let charts = self.charts_for_viewport(lon, lat, zoom);

        let newly_registered: Vec<String> = charts
            .tier2
            .iter()
            .filter(|id| self.available.contains(id.as_str()))
            .filter(|id| self.registered.insert((*id).clone()))
            .cloned()
            .collect();

        let limit = self.server.config().preload_limit;
        let preload: Vec<String> = newly_registered.iter().take(limit).cloned().collect();
        let preloaded = self.server.preload_charts(preload).await;

        if !newly_registered.is_empty() {
            debug!(
                registered = newly_registered.len(),
                preloaded = preloaded,
                zoom = zoom,
                "Registered charts for viewport"
            );
        }

        ViewportUpdate {
            charts,
            newly_registered,
            preloaded,
        }
    }
}

fn sorted(set: &DashSet<String>) -> Vec<String> {
    let mut ids: Vec<String> = set.iter().map(|id| id.key().clone()).collect();
    ids.sort();
    ids
}
