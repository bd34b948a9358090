//! Tier 2: pooled handles to high-detail chart datasets.
//!
//! Harbour-scale charts are numerous and only relevant while the viewport is
//! over them, so they are opened on demand and kept in a small pool.
//!
//! # Eviction
//!
//! ```text
//!            head (next to evict)                     tail (most recent)
//! order:     [ "c" ] ──► [ "a" ] ──► [ "d" ]
//! handles:   { "a": db, "c": db, "d": db }
//!
//! get("a")   hit   → move "a" to tail           order: c d a
//! get("e")   miss  → open e, pop head "c"       order: d a e
//! ```
//!
//! The order queue and the handle map always hold the same ids; every insert
//! and eviction updates both under the pool lock.

mod connection_pool;
mod stats;

pub use connection_pool::{
    clamp_pool_size, ConnectionPool, DEFAULT_POOL_SIZE, MAX_POOL_SIZE, MIN_POOL_SIZE,
};
pub use stats::PoolStats;
