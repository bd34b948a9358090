//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (show, path, init)
//! - [`index`] - Chart index summary and listing
//! - [`stats`] - Initialize the server and report cache statistics
//! - [`tile`] - Fetch a single tile
//! - [`viewport`] - Resolve the charts a viewport needs

pub mod common;
pub mod config;
pub mod index;
pub mod stats;
pub mod tile;
pub mod viewport;
