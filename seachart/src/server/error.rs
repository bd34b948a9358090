//! Server initialization errors.

use std::sync::Arc;

use thiserror::Error;

use crate::index::IndexError;

/// Errors from [`TieredTileServer::initialize`](super::TieredTileServer::initialize).
///
/// Cloneable so that every caller coalesced onto one initialization receives
/// the same outcome. Tile lookups never fail; see
/// [`TieredTileServer::get_tile`](super::TieredTileServer::get_tile).
#[derive(Debug, Clone, Error)]
pub enum ServerError {
    /// The manifest exists but is unreadable or invalid.
    #[error("Failed to load chart index: {0}")]
    Index(#[source] Arc<IndexError>),

    /// The initialization task panicked or was aborted.
    #[error("Initialization task failed: {0}")]
    Runtime(String),

    /// The tier-1 cache was cleared while it was loading.
    #[error("Tier-1 load was interrupted")]
    Interrupted,

    /// `shutdown()` was called before initialization finished.
    #[error("Initialization cancelled")]
    Cancelled,
}

impl From<IndexError> for ServerError {
    fn from(e: IndexError) -> Self {
        ServerError::Index(Arc::new(e))
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(e: tokio::task::JoinError) -> Self {
        ServerError::Runtime(e.to_string())
    }
}
