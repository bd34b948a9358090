//! Merged server statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::memory::MemoryCacheStats;
use crate::pool::PoolStats;

/// Server lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Uninitialized,
    Initializing,
    Ready,
    /// Initialization failed or no chart index was found.
    Failed,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Per-tier request counters.
#[derive(Debug, Default)]
pub(super) struct RequestCounters {
    tier1_requests: AtomicU64,
    tier1_hits: AtomicU64,
    tier2_requests: AtomicU64,
    tier2_hits: AtomicU64,
    unrouted: AtomicU64,
}

impl RequestCounters {
    pub fn record_tier1(&self, hit: bool) {
        self.tier1_requests.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.tier1_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_tier2(&self, hit: bool) {
        self.tier2_requests.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.tier2_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_unrouted(&self) {
        self.unrouted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.tier1_requests.store(0, Ordering::Relaxed);
        self.tier1_hits.store(0, Ordering::Relaxed);
        self.tier2_requests.store(0, Ordering::Relaxed);
        self.tier2_hits.store(0, Ordering::Relaxed);
        self.unrouted.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RequestStats {
        RequestStats {
            tier1_requests: self.tier1_requests.load(Ordering::Relaxed),
            tier1_hits: self.tier1_hits.load(Ordering::Relaxed),
            tier2_requests: self.tier2_requests.load(Ordering::Relaxed),
            tier2_hits: self.tier2_hits.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
        }
    }
}

/// Tile requests seen by the server, by tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    pub tier1_requests: u64,
    /// Tier-1 requests that returned a tile.
    pub tier1_hits: u64,
    pub tier2_requests: u64,
    /// Tier-2 requests that returned a tile.
    pub tier2_hits: u64,
    /// Requests for charts the index does not know.
    pub unrouted: u64,
}

impl RequestStats {
    pub fn tier1_hit_rate(&self) -> f64 {
        ratio(self.tier1_hits, self.tier1_requests)
    }

    pub fn tier2_hit_rate(&self) -> f64 {
        ratio(self.tier2_hits, self.tier2_requests)
    }

    pub fn total_requests(&self) -> u64 {
        self.tier1_requests + self.tier2_requests + self.unrouted
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Everything the server knows about itself, in one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStats {
    pub status: ServerStatus,
    /// Charts in the loaded index (0 when not ready).
    pub index_charts: usize,
    pub requests: RequestStats,
    pub tier1: MemoryCacheStats,
    pub tier2: PoolStats,
}

impl fmt::Display for ServerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status:     {}", self.status)?;
        writeln!(f, "Index:      {} charts", self.index_charts)?;
        writeln!(
            f,
            "Tier 1:     {} charts, {} tiles, ~{:.1} MB",
            self.tier1.chart_count,
            self.tier1.tile_count,
            self.tier1.estimated_memory_mb()
        )?;
        writeln!(
            f,
            "            {} requests, {:.1}% found",
            self.requests.tier1_requests,
            self.requests.tier1_hit_rate() * 100.0
        )?;
        writeln!(f, "Tier 2:     {}", self.tier2)?;
        writeln!(
            f,
            "            {} requests, {:.1}% found",
            self.requests.tier2_requests,
            self.requests.tier2_hit_rate() * 100.0
        )?;
        write!(f, "Unrouted:   {} requests", self.requests.unrouted)
    }
}
