//! SeaChart - tiered tile serving for offline nautical charts
//!
//! Serves map tiles from hundreds of per-region MBTiles datasets on a
//! storage-constrained device. Overview charts are held fully in memory
//! (Tier 1); harbour charts are opened on demand through a bounded LRU pool
//! of database handles (Tier 2). A precomputed chart index decides which
//! tier a chart lives in and which charts a viewport needs.
//!
//! # High-Level API
//!
//! The [`server`] module provides the façade:
//!
//! ```ignore
//! use seachart::coord::TileCoord;
//! use seachart::server::{InitOutcome, ServerConfig, TieredTileServer};
//!
//! let server = TieredTileServer::new(ServerConfig::new("/data/charts"));
//! if server.initialize().await? == InitOutcome::IndexUnavailable {
//!     // fall back to a directory scan
//! }
//!
//! let tile = server.get_tile("us5ma1", TileCoord::new(13, 2479, 3029)).await;
//! ```

pub mod config;
pub mod coord;
pub mod dataset;
pub mod index;
pub mod logging;
pub mod manager;
pub mod memory;
pub mod pool;
pub mod progress;
pub mod server;

#[cfg(test)]
mod test_support;

/// Version of the SeaChart library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
