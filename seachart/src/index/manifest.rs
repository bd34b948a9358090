//! On-disk manifest schema.
//!
//! The manifest is a JSON document produced by the chart packaging tools:
//!
//! ```json
//! {
//!   "version": 1,
//!   "charts": {
//!     "US1WC01M": {
//!       "bounds": [-180.0, -85.0, 180.0, 85.0],
//!       "level": 1,
//!       "minZoom": 0,
//!       "maxZoom": 6,
//!       "parentId": null,
//!       "childIds": ["US4CA11M"],
//!       "sizeBytes": 1048576
//!     }
//!   },
//!   "roots": ["US1WC01M"],
//!   "tier1": ["US1WC01M"],
//!   "tier2": ["US4CA11M"],
//!   "stats": { "totalCharts": 2, "tier1Count": 1, "tier2Count": 1 }
//! }
//! ```
//!
//! These types mirror the document one-to-one; [`ChartIndex`](super::ChartIndex)
//! turns them into the immutable query structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coord::Bounds;

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Default manifest filename inside the charts directory.
pub const DEFAULT_MANIFEST_FILE: &str = "chart_index.json";

/// Root manifest document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Chart entries keyed by id. Sorted so index order is deterministic.
    #[serde(default)]
    pub charts: BTreeMap<String, ManifestChart>,

    /// Top of the hierarchy. When empty, every chart without a parent is a root.
    #[serde(default)]
    pub roots: Vec<String>,

    #[serde(default, alias = "tier1Ids")]
    pub tier1: Vec<String>,

    #[serde(default, alias = "tier2Ids")]
    pub tier2: Vec<String>,

    #[serde(default)]
    pub stats: Option<ManifestStats>,
}

fn default_version() -> u32 {
    MANIFEST_VERSION
}

/// A single chart entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestChart {
    /// `[west, south, east, north]`; absent for non-geographic entries.
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,

    pub level: u8,

    #[serde(default)]
    pub min_zoom: Option<u8>,

    #[serde(default)]
    pub max_zoom: Option<u8>,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub child_ids: Vec<String>,

    #[serde(default)]
    pub size_bytes: u64,
}

impl ManifestChart {
    /// Bounds as a typed box.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds.map(|[w, s, e, n]| Bounds::new(w, s, e, n))
    }
}

/// Summary statistics written by the packaging tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStats {
    #[serde(default)]
    pub total_charts: usize,
    #[serde(default)]
    pub tier1_count: usize,
    #[serde(default)]
    pub tier2_count: usize,
    #[serde(default)]
    pub total_size_bytes: u64,
    #[serde(default)]
    pub max_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let json = r#"{ "charts": { "a": { "level": 1 } } }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();

        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert_eq!(manifest.charts.len(), 1);
        let chart = &manifest.charts["a"];
        assert_eq!(chart.level, 1);
        assert!(chart.bounds().is_none());
        assert!(chart.min_zoom.is_none());
        assert!(chart.child_ids.is_empty());
        assert!(manifest.stats.is_none());
    }

    #[test]
    fn test_parse_camel_case_fields() {
        let json = r#"{
            "charts": {
                "root": {
                    "bounds": [-10.0, -5.0, 10.0, 5.0],
                    "level": 2,
                    "minZoom": 3,
                    "maxZoom": null,
                    "childIds": ["c"],
                    "sizeBytes": 42
                },
                "c": { "level": 4, "parentId": "root" }
            },
            "tier1Ids": ["root"],
            "tier2Ids": ["c"],
            "stats": { "totalCharts": 2, "tier1Count": 1, "tier2Count": 1 }
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();

        let root = &manifest.charts["root"];
        assert_eq!(root.bounds(), Some(Bounds::new(-10.0, -5.0, 10.0, 5.0)));
        assert_eq!(root.min_zoom, Some(3));
        assert_eq!(root.max_zoom, None);
        assert_eq!(root.child_ids, vec!["c".to_string()]);
        assert_eq!(root.size_bytes, 42);
        assert_eq!(manifest.charts["c"].parent_id.as_deref(), Some("root"));
        assert_eq!(manifest.tier1, vec!["root".to_string()]);
        assert_eq!(manifest.tier2, vec!["c".to_string()]);
        assert_eq!(manifest.stats.unwrap().total_charts, 2);
    }

    #[test]
    fn test_missing_level_is_rejected() {
        let json = r#"{ "charts": { "a": { "minZoom": 1 } } }"#;
        assert!(serde_json::from_str::<Manifest>(json).is_err());
    }
}
