//! Viewport → chart resolution.
//!
//! Walks the hierarchy top-down from the roots, descending only into charts
//! whose footprint contains the viewport centre. The work done is
//! proportional to the depth of the tree under the point rather than to the
//! number of charts in the index.

use std::collections::HashSet;

use super::chart_index::ChartIndex;
use super::record::Tier;

/// Map centre and zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub lon: f64,
    pub lat: f64,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(lon: f64, lat: f64, zoom: u8) -> Self {
        Self { lon, lat, zoom }
    }
}

/// Charts relevant to a viewport, split by serving tier.
///
/// Both lists are in traversal order (parents before children) and are
/// disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportCharts {
    pub tier1: Vec<String>,
    pub tier2: Vec<String>,
}

impl ViewportCharts {
    pub fn is_empty(&self) -> bool {
        self.tier1.is_empty() && self.tier2.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tier1.len() + self.tier2.len()
    }

    /// Every chart, tier 1 first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.tier1.iter().chain(self.tier2.iter()).map(String::as_str)
    }
}

/// Resolve the charts relevant to `viewport`.
///
/// A chart containing the centre is selected once the viewport zoom reaches
/// its minimum zoom, and its children are visited while the zoom is beyond
/// that minimum. Charts without bounds are never selected.
pub fn resolve_viewport(index: &ChartIndex, viewport: Viewport) -> ViewportCharts {
    let mut result = ViewportCharts::default();
    let mut visited = HashSet::new();

    for &root in index.root_slots() {
        visit(index, root, &viewport, &mut visited, &mut result);
    }

    result
}

fn visit(
    index: &ChartIndex,
    slot: usize,
    viewport: &Viewport,
    visited: &mut HashSet<usize>,
    result: &mut ViewportCharts,
) {
    if !visited.insert(slot) {
        return;
    }

    let node = index.node(slot);
    let record = &node.record;
    if !record.contains(viewport.lon, viewport.lat) {
        return;
    }

    let min_zoom = record.min_zoom_or_default();
    if min_zoom <= viewport.zoom {
        match record.tier {
            Tier::Tier1 => result.tier1.push(record.id.clone()),
            Tier::Tier2 => result.tier2.push(record.id.clone()),
        }
    }

    if viewport.zoom > min_zoom {
        for &child in &node.children {
            visit(index, child, viewport, visited, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TierPolicy;

    fn two_level_index() -> ChartIndex {
        let json = r#"{ "charts": {
            "root": {
                "bounds": [-180.0, -85.0, 180.0, 85.0],
                "level": 1, "minZoom": 0, "maxZoom": 6,
                "childIds": ["child"]
            },
            "child": {
                "bounds": [-71.2, 42.2, -70.9, 42.5],
                "level": 4, "minZoom": 10, "maxZoom": 15
            }
        } }"#;
        ChartIndex::from_json_str(json, TierPolicy::default()).unwrap()
    }

    #[test]
    fn test_root_and_child_split_by_tier() {
        let index = two_level_index();
        let charts = index.find_for_viewport(-71.05, 42.35, 12);
        assert_eq!(charts.tier1, vec!["root".to_string()]);
        assert_eq!(charts.tier2, vec!["child".to_string()]);
    }

    #[test]
    fn test_child_excluded_below_min_zoom() {
        let index = two_level_index();
        let charts = index.find_for_viewport(-71.05, 42.35, 8);
        assert_eq!(charts.tier1, vec!["root".to_string()]);
        assert!(charts.tier2.is_empty());
    }

    #[test]
    fn test_point_outside_child() {
        let index = two_level_index();
        let charts = index.find_for_viewport(10.0, 50.0, 12);
        assert_eq!(charts.tier1, vec!["root".to_string()]);
        assert!(charts.tier2.is_empty());
    }

    #[test]
    fn test_no_descent_at_min_zoom() {
        // Zoom equal to the root's minimum selects the root but does not recurse.
        let index = two_level_index();
        let charts = index.find_for_viewport(-71.05, 42.35, 0);
        assert_eq!(charts.len(), 1);
    }

    #[test]
    fn test_unbounded_chart_never_selected() {
        let json = r#"{ "charts": { "meta": { "level": 1 } } }"#;
        let index = ChartIndex::from_json_str(json, TierPolicy::default()).unwrap();
        assert!(index.find_for_viewport(0.0, 0.0, 5).is_empty());
    }

    #[test]
    fn test_idempotent_and_disjoint() {
        let index = two_level_index();
        let first = index.find_for_viewport(-71.05, 42.35, 13);
        let second = index.find_for_viewport(-71.05, 42.35, 13);
        assert_eq!(first, second);

        let tier1: HashSet<_> = first.tier1.iter().collect();
        assert!(first.tier2.iter().all(|id| !tier1.contains(id)));
    }

    #[test]
    fn test_all_lists_tier1_first() {
        let index = two_level_index();
        let charts = index.find_for_viewport(-71.05, 42.35, 12);
        assert_eq!(charts.all().collect::<Vec<_>>(), vec!["root", "child"]);
    }
}
