//! Tiered tile server.
//!
//! The public entry point for tile requests. Callers ask for
//! `(chart_id, z, x, y)` and never need to know where the tile lives.
//!
//! # Architecture
//!
//! ```text
//!                       ┌────────────────────┐
//!   get_tile(id, t) ──► │  TieredTileServer  │
//!                       └─────────┬──────────┘
//!                                 │ index.tier(id)
//!                ┌────────────────┼──────────────────┐
//!                ▼ Tier1          ▼ Tier2            ▼ unknown
//!        MemoryTileCache    spawn_blocking           None
//!        (hash lookup)      ConnectionPool::get_tile
//!                           (LRU, SQLite point query)
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──initialize()──► Initializing ──► Ready
//!       ▲                              │
//!       │                              └─────────► Failed (no index / bad index)
//!       └──────────── shutdown() ◄──── any state
//! ```
//!
//! Initialization runs in a spawned task and is shared: concurrent callers
//! await the same outcome. `shutdown()` cancels it between stages.

mod config;
mod error;
mod stats;
mod tiered;

pub use config::ServerConfig;
pub use error::ServerError;
pub use stats::{RequestStats, ServerStats, ServerStatus};
pub use tiered::{InitOutcome, TieredTileServer};
