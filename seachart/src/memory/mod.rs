//! Tier 1: the always-resident tile set.
//!
//! Overview charts are touched on nearly every frame, so their datasets are
//! read completely into memory at startup and served from a hash table
//! thereafter.
//!
//! # Loading
//!
//! ```text
//! tier1 ids ──► exists on disk? ──► batches of N ──► spawn_blocking(read_chart) ×N
//!                    │ no                                     │
//!                    ▼                                        ▼
//!                 warn, skip                     join, progress event, next batch
//!                                                             │
//!                                                             ▼
//!                                          swap complete table in, state = Loaded
//! ```
//!
//! The table is built outside any lock and swapped in once, so readers see
//! either the empty table or the complete one. Rows are converted from the
//! storage (TMS) convention while reading; lookups use standard rows.

mod cache;
mod loader;
mod stats;

pub use cache::{MemoryCacheConfig, MemoryTileCache, DEFAULT_BATCH_SIZE};
pub use stats::{MemoryCacheStats, PayloadEncoding};
