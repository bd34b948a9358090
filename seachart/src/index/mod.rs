//! Precomputed chart index.
//!
//! The index describes every chart dataset on the device: its footprint,
//! its place in the overview → coastal → harbour hierarchy, its zoom range
//! and the tier it is served from. It is built offline, shipped as a JSON
//! manifest, and loaded once per process.
//!
//! # Architecture
//!
//! ```text
//! chart_index.json ──► Manifest ──► ChartIndex (immutable arena)
//!                                     │
//!                                     ├── get / parent / children / ancestors / descendants
//!                                     ├── is_tier1 / is_tier2           O(1)
//!                                     ├── find_containing               linear scan
//!                                     └── find_for_viewport             O(depth) via resolver
//! ```
//!
//! # Tier assignment
//!
//! A chart listed in the manifest's `tier1` or `tier2` list keeps that tier.
//! Charts listed in neither are assigned by [`TierPolicy`] from their level.
//! The resolved tier is stored on each [`ChartRecord`], so membership checks
//! and viewport resolution always agree.
//!
//! # Example
//!
//! ```ignore
//! use seachart::index::ChartIndex;
//!
//! match ChartIndex::load(&charts_dir.join("chart_index.json"))? {
//!     Some(index) => {
//!         let charts = index.find_for_viewport(-122.42, 37.80, 14);
//!         println!("{} overview, {} detail charts", charts.tier1.len(), charts.tier2.len());
//!     }
//!     None => println!("no manifest, falling back to directory scan"),
//! }
//! ```

mod chart_index;
mod error;
mod manifest;
mod record;
mod resolver;

pub use chart_index::{ChartIndex, IndexSummary};
pub use error::IndexError;
pub use manifest::{
    Manifest, ManifestChart, ManifestStats, DEFAULT_MANIFEST_FILE, MANIFEST_VERSION,
};
pub use record::{ChartRecord, Tier, TierPolicy, DEFAULT_TIER1_MAX_LEVEL};
pub use resolver::{resolve_viewport, Viewport, ViewportCharts};
