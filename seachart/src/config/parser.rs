//! INI parsing: `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::pool::{clamp_pool_size, MAX_POOL_SIZE, MIN_POOL_SIZE};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [charts] section
    if let Some(section) = ini.section(Some("charts")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.charts.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("manifest") {
            let v = v.trim();
            config.charts.manifest = (!v.is_empty()).then(|| expand_tilde(v));
        }
    }

    // [tier1] section
    if let Some(section) = ini.section(Some("tier1")) {
        if let Some(v) = section.get("batch_size") {
            config.tier1.batch_size = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(invalid(
                        "tier1",
                        "batch_size",
                        v,
                        "must be a positive integer",
                    ))
                }
            };
        }
        if let Some(v) = section.get("payload_encoding") {
            config.tier1.payload_encoding = v
                .parse()
                .map_err(|_| invalid("tier1", "payload_encoding", v, "must be 'raw' or 'base64'"))?;
        }
    }

    // [tier2] section
    if let Some(section) = ini.section(Some("tier2")) {
        if let Some(v) = section.get("pool_size") {
            let requested: usize = v
                .trim()
                .parse()
                .map_err(|_| invalid("tier2", "pool_size", v, "must be a positive integer"))?;
            let clamped = clamp_pool_size(requested);
            if clamped != requested {
                tracing::warn!(
                    requested = requested,
                    min = MIN_POOL_SIZE,
                    max = MAX_POOL_SIZE,
                    "pool_size out of range, clamping to {}",
                    clamped
                );
            }
            config.tier2.pool_size = clamped;
        }
        if let Some(v) = section.get("staging_dir") {
            let v = v.trim();
            config.tier2.staging_dir = (!v.is_empty()).then(|| expand_tilde(v));
        }
    }

    // [viewport] section
    if let Some(section) = ini.section(Some("viewport")) {
        if let Some(v) = section.get("preload_limit") {
            config.viewport.preload_limit = v
                .trim()
                .parse()
                .map_err(|_| invalid("viewport", "preload_limit", v, "must be a non-negative integer"))?;
        }
        if let Some(v) = section.get("tier1_max_level") {
            config.viewport.tier1_max_level = v
                .trim()
                .parse()
                .map_err(|_| invalid("viewport", "tier1_max_level", v, "must be an integer from 0 to 255"))?;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
