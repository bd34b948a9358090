//! Chart registration for the tile endpoint.
//!
//! The endpoint needs to know which chart ids it may route to. The
//! [`ChartManager`] answers that from the datasets present on disk and the
//! loaded index, and registers harbour charts as the viewport reaches them.
//! It holds no tiles itself.

mod chart_manager;

pub use chart_manager::{ChartManager, ViewportUpdate};
