//! User configuration.
//!
//! Settings are read from `~/.seachart/config.ini`; a missing file means
//! defaults. Each INI section maps to one settings struct:
//!
//! | Section      | Struct               |
//! |--------------|----------------------|
//! | `[charts]`   | [`ChartsSettings`]   |
//! | `[tier1]`    | [`Tier1Settings`]    |
//! | `[tier2]`    | [`Tier2Settings`]    |
//! | `[viewport]` | [`ViewportSettings`] |
//!
//! The library itself is configured through
//! [`ServerConfig`](crate::server::ServerConfig), which can be built from a
//! [`ConfigFile`].

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{default_charts_dir, CONFIG_DIR_NAME, DEFAULT_PRELOAD_LIMIT};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ChartsSettings, ConfigFile, Tier1Settings, Tier2Settings, ViewportSettings};
