//! Chart records and tier assignment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::Bounds;

/// Serving tier of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Always resident in memory.
    Tier1,
    /// Served from the pooled database handles.
    Tier2,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Tier1 => write!(f, "tier1"),
            Tier::Tier2 => write!(f, "tier2"),
        }
    }
}

/// Level-to-tier mapping used when a chart carries no explicit assignment.
///
/// Levels run from 1 (least detailed, largest area) upwards. Charts at or
/// below `tier1_max_level` are small, heavily reused overview charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    pub tier1_max_level: u8,
}

/// Highest level mapped to Tier 1 by default.
pub const DEFAULT_TIER1_MAX_LEVEL: u8 = 3;

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            tier1_max_level: DEFAULT_TIER1_MAX_LEVEL,
        }
    }
}

impl TierPolicy {
    pub fn new(tier1_max_level: u8) -> Self {
        Self { tier1_max_level }
    }

    /// Tier implied by a chart level.
    pub fn tier_for_level(&self, level: u8) -> Tier {
        if level <= self.tier1_max_level {
            Tier::Tier1
        } else {
            Tier::Tier2
        }
    }
}

/// One chart dataset in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRecord {
    pub id: String,
    /// Absent for non-geographic entries.
    pub bounds: Option<Bounds>,
    /// 1 = least detailed.
    pub level: u8,
    /// `None` means unbounded.
    pub min_zoom: Option<u8>,
    /// `None` means unbounded.
    pub max_zoom: Option<u8>,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub size_bytes: u64,
    /// Resolved tier; every record in a loaded index has exactly one.
    pub tier: Tier,
}

impl ChartRecord {
    /// Whether the chart's footprint contains the point.
    ///
    /// Charts without bounds never contain anything.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bounds.is_some_and(|b| b.contains(lon, lat))
    }

    /// Effective minimum zoom (unbounded reads as 0).
    pub fn min_zoom_or_default(&self) -> u8 {
        self.min_zoom.unwrap_or(0)
    }

    /// Whether the chart is meant to be displayed at `zoom`.
    pub fn covers_zoom(&self, zoom: u8) -> bool {
        self.min_zoom.map_or(true, |min| zoom >= min) && self.max_zoom.map_or(true, |max| zoom <= max)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
