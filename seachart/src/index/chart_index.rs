//! Immutable chart index.
//!
//! Records live in a flat arena; parent/child links are arena indices so the
//! whole structure is a handful of `Vec`s and one `HashMap`. Nothing is
//! mutated after construction, so a loaded index can be shared behind an
//! `Arc` and read from any number of threads.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};

use super::error::IndexError;
use super::manifest::{Manifest, ManifestStats};
use super::record::{ChartRecord, Tier, TierPolicy};
use super::resolver::{resolve_viewport, Viewport, ViewportCharts};

/// Summary statistics derived from a loaded index.
///
/// Same shape as the manifest's `stats` block so the two can be compared.
pub type IndexSummary = ManifestStats;

#[derive(Debug)]
pub(super) struct ChartNode {
    pub(super) record: ChartRecord,
    pub(super) parent: Option<usize>,
    pub(super) children: Vec<usize>,
}

/// Read-only chart hierarchy with tier assignment.
#[derive(Debug)]
pub struct ChartIndex {
    nodes: Vec<ChartNode>,
    by_id: HashMap<String, usize>,
    roots: Vec<usize>,
    tier1: Vec<usize>,
    tier2: Vec<usize>,
    manifest_stats: Option<ManifestStats>,
    policy: TierPolicy,
}

impl ChartIndex {
    /// Load the index from a manifest file using the default tier policy.
    ///
    /// Returns `Ok(None)` when the file does not exist; the caller is expected
    /// to fall back to scanning the charts directory.
    pub fn load(path: &Path) -> Result<Option<Self>, IndexError> {
        Self::load_with_policy(path, TierPolicy::default())
    }

    /// Load the index from a manifest file.
    pub fn load_with_policy(path: &Path, policy: TierPolicy) -> Result<Option<Self>, IndexError> {
        if !path.exists() {
            info!(path = %path.display(), "Chart manifest not found");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let index = Self::from_json_str(&content, policy)?;

        info!(
            path = %path.display(),
            charts = index.len(),
            roots = index.roots.len(),
            tier1 = index.tier1.len(),
            tier2 = index.tier2.len(),
            "Chart index loaded"
        );

        Ok(Some(index))
    }

    /// Parse a manifest document.
    pub fn from_json_str(json: &str, policy: TierPolicy) -> Result<Self, IndexError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        Self::from_manifest(manifest, policy)
    }

    /// Build the index from a parsed manifest, validating references.
    pub fn from_manifest(manifest: Manifest, policy: TierPolicy) -> Result<Self, IndexError> {
        let explicit = explicit_tiers(&manifest)?;

        let mut nodes = Vec::with_capacity(manifest.charts.len());
        let mut by_id = HashMap::with_capacity(manifest.charts.len());

        for (id, chart) in &manifest.charts {
            let bounds = match chart.bounds() {
                Some(b) if !b.is_valid() => {
                    warn!(
                        chart_id = %id,
                        bounds = %b,
                        "Malformed chart bounds, chart will not match any position"
                    );
                    None
                }
                other => other,
            };

            let tier = explicit
                .get(id.as_str())
                .copied()
                .unwrap_or_else(|| policy.tier_for_level(chart.level));

            by_id.insert(id.clone(), nodes.len());
            nodes.push(ChartNode {
                record: ChartRecord {
                    id: id.clone(),
                    bounds,
                    level: chart.level,
                    min_zoom: chart.min_zoom,
                    max_zoom: chart.max_zoom,
                    parent_id: chart.parent_id.clone(),
                    child_ids: Vec::new(),
                    size_bytes: chart.size_bytes,
                    tier,
                },
                parent: None,
                children: Vec::new(),
            });
        }

        link_hierarchy(&manifest, &mut nodes, &by_id)?;
        check_acyclic(&nodes)?;

        let roots = if manifest.roots.is_empty() {
            (0..nodes.len()).filter(|&i| nodes[i].parent.is_none()).collect()
        } else {
            manifest
                .roots
                .iter()
                .map(|id| {
                    by_id
                        .get(id)
                        .copied()
                        .ok_or_else(|| IndexError::invalid(format!("unknown root chart '{}'", id)))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let tier1 = (0..nodes.len())
            .filter(|&i| nodes[i].record.tier == Tier::Tier1)
            .collect();
        let tier2 = (0..nodes.len())
            .filter(|&i| nodes[i].record.tier == Tier::Tier2)
            .collect();

        let index = Self {
            nodes,
            by_id,
            roots,
            tier1,
            tier2,
            manifest_stats: manifest.stats,
            policy,
        };

        if let Some(stats) = &index.manifest_stats {
            let summary = index.summary();
            if summary.total_charts != stats.total_charts {
                warn!(
                    manifest = stats.total_charts,
                    loaded = summary.total_charts,
                    "Manifest statistics disagree with chart entries"
                );
            }
        }

        Ok(index)
    }

    /// Number of charts.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tier policy the index was built with.
    pub fn policy(&self) -> TierPolicy {
        self.policy
    }

    /// All chart ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.record.id.as_str())
    }

    /// All records in index order.
    pub fn records(&self) -> impl Iterator<Item = &ChartRecord> {
        self.nodes.iter().map(|n| &n.record)
    }

    pub fn get(&self, id: &str) -> Option<&ChartRecord> {
        self.slot(id).map(|i| &self.nodes[i].record)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn parent(&self, id: &str) -> Option<&ChartRecord> {
        let slot = self.slot(id)?;
        self.nodes[slot].parent.map(|p| &self.nodes[p].record)
    }

    /// Direct children in manifest order. Empty for unknown ids.
    pub fn children(&self, id: &str) -> Vec<&ChartRecord> {
        match self.slot(id) {
            Some(slot) => self.nodes[slot]
                .children
                .iter()
                .map(|&c| &self.nodes[c].record)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: &str) -> Vec<&ChartRecord> {
        let mut out = Vec::new();
        let mut current = self.slot(id).and_then(|s| self.nodes[s].parent);
        while let Some(slot) = current {
            out.push(&self.nodes[slot].record);
            current = self.nodes[slot].parent;
        }
        out
    }

    /// All descendants in depth-first pre-order.
    pub fn descendants(&self, id: &str) -> Vec<&ChartRecord> {
        let mut out = Vec::new();
        if let Some(slot) = self.slot(id) {
            self.collect_descendants(slot, &mut out);
        }
        out
    }

    fn collect_descendants<'a>(&'a self, slot: usize, out: &mut Vec<&'a ChartRecord>) {
        for &child in &self.nodes[slot].children {
            out.push(&self.nodes[child].record);
            self.collect_descendants(child, out);
        }
    }

    pub fn roots(&self) -> Vec<&ChartRecord> {
        self.roots.iter().map(|&r| &self.nodes[r].record).collect()
    }

    pub fn tier(&self, id: &str) -> Option<Tier> {
        self.get(id).map(|r| r.tier)
    }

    pub fn is_tier1(&self, id: &str) -> bool {
        self.tier(id) == Some(Tier::Tier1)
    }

    pub fn is_tier2(&self, id: &str) -> bool {
        self.tier(id) == Some(Tier::Tier2)
    }

    /// Tier 1 chart ids in index order.
    pub fn tier1_ids(&self) -> Vec<&str> {
        self.tier1
            .iter()
            .map(|&i| self.nodes[i].record.id.as_str())
            .collect()
    }

    /// Tier 2 chart ids in index order.
    pub fn tier2_ids(&self) -> Vec<&str> {
        self.tier2
            .iter()
            .map(|&i| self.nodes[i].record.id.as_str())
            .collect()
    }

    pub fn charts_at_level(&self, level: u8) -> Vec<&ChartRecord> {
        self.records().filter(|r| r.level == level).collect()
    }

    /// Charts whose bounds contain the point, optionally restricted to a level.
    ///
    /// Linear scan over every chart; use [`find_for_viewport`](Self::find_for_viewport)
    /// on hot paths.
    pub fn find_containing(&self, lon: f64, lat: f64, level: Option<u8>) -> Vec<&str> {
        self.records()
            .filter(|r| level.map_or(true, |l| r.level == l))
            .filter(|r| r.contains(lon, lat))
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Charts relevant to a viewport, split by tier.
    pub fn find_for_viewport(&self, lon: f64, lat: f64, zoom: u8) -> ViewportCharts {
        resolve_viewport(self, Viewport::new(lon, lat, zoom))
    }

    /// Statistics recomputed from the loaded records.
    pub fn summary(&self) -> IndexSummary {
        let max_depth = self
            .roots
            .iter()
            .map(|&r| self.depth_below(r))
            .max()
            .unwrap_or(0);

        IndexSummary {
            total_charts: self.nodes.len(),
            tier1_count: self.tier1.len(),
            tier2_count: self.tier2.len(),
            total_size_bytes: self.records().map(|r| r.size_bytes).sum(),
            max_depth,
        }
    }

    fn depth_below(&self, slot: usize) -> usize {
        1 + self.nodes[slot]
            .children
            .iter()
            .map(|&c| self.depth_below(c))
            .max()
            .unwrap_or(0)
    }

    /// Statistics as written in the manifest, if present.
    pub fn manifest_stats(&self) -> Option<&ManifestStats> {
        self.manifest_stats.as_ref()
    }

    pub(super) fn slot(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(super) fn node(&self, slot: usize) -> &ChartNode {
        &self.nodes[slot]
    }

    pub(super) fn root_slots(&self) -> &[usize] {
        &self.roots
    }
}

/// Collect explicit tier lists, rejecting charts listed in both.
fn explicit_tiers(manifest: &Manifest) -> Result<HashMap<&str, Tier>, IndexError> {
    let mut tiers = HashMap::new();

    for (list, tier) in [(&manifest.tier1, Tier::Tier1), (&manifest.tier2, Tier::Tier2)] {
        for id in list {
            if !manifest.charts.contains_key(id) {
                warn!(chart_id = %id, %tier, "Tier list names unknown chart, ignoring");
                continue;
            }
            if let Some(existing) = tiers.insert(id.as_str(), tier) {
                if existing != tier {
                    return Err(IndexError::invalid(format!(
                        "chart '{}' is listed in both tier1 and tier2",
                        id
                    )));
                }
            }
        }
    }

    Ok(tiers)
}

/// Resolve `childIds`/`parentId` into arena links.
///
/// A child listed by a parent inherits that parent when it has no `parentId`;
/// a chart naming a parent that does not list it is appended to the parent's
/// children.
fn link_hierarchy(
    manifest: &Manifest,
    nodes: &mut [ChartNode],
    by_id: &HashMap<String, usize>,
) -> Result<(), IndexError> {
    for (parent_id, chart) in &manifest.charts {
        let parent = by_id[parent_id];
        for child_id in &chart.child_ids {
            let child = *by_id.get(child_id).ok_or_else(|| {
                IndexError::invalid(format!(
                    "chart '{}' lists unknown child '{}'",
                    parent_id, child_id
                ))
            })?;

            match nodes[child].record.parent_id.as_deref() {
                Some(declared) if declared != parent_id => {
                    return Err(IndexError::invalid(format!(
                        "chart '{}' is listed under '{}' but declares parent '{}'",
                        child_id, parent_id, declared
                    )));
                }
                Some(_) => {}
                None => nodes[child].record.parent_id = Some(parent_id.clone()),
            }

            if nodes[child].parent.is_some() {
                return Err(IndexError::invalid(format!(
                    "chart '{}' is listed as a child more than once",
                    child_id
                )));
            }
            nodes[child].parent = Some(parent);
            nodes[parent].children.push(child);
        }
    }

    // Back-references without a matching childIds entry.
    for slot in 0..nodes.len() {
        if nodes[slot].parent.is_some() {
            continue;
        }
        let Some(parent_id) = nodes[slot].record.parent_id.clone() else {
            continue;
        };
        let parent = *by_id.get(&parent_id).ok_or_else(|| {
            IndexError::invalid(format!(
                "chart '{}' declares unknown parent '{}'",
                nodes[slot].record.id, parent_id
            ))
        })?;
        debug!(
            chart_id = %nodes[slot].record.id,
            parent_id = %parent_id,
            "Linking chart missing from its parent's child list"
        );
        nodes[slot].parent = Some(parent);
        nodes[parent].children.push(slot);
    }

    for slot in 0..nodes.len() {
        let child_ids = nodes[slot]
            .children
            .iter()
            .map(|&c| nodes[c].record.id.clone())
            .collect();
        nodes[slot].record.child_ids = child_ids;
    }

    Ok(())
}

fn check_acyclic(nodes: &[ChartNode]) -> Result<(), IndexError> {
    for (slot, node) in nodes.iter().enumerate() {
        let mut seen = HashSet::new();
        seen.insert(slot);
        let mut current = node.parent;
        while let Some(p) = current {
            if !seen.insert(p) {
                return Err(IndexError::invalid(format!(
                    "parent chain of chart '{}' forms a cycle",
                    node.record.id
                )));
            }
            current = nodes[p].parent;
        }
    }
    Ok(())
}
