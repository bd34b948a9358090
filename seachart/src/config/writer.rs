//! INI serialization: `ConfigFile` → commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let manifest = config
        .charts
        .manifest
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();
    let staging_dir = config
        .tier2
        .staging_dir
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[charts]
; Directory holding the <chart_id>.mbtiles datasets
directory = {}
; Chart index manifest. If empty, <directory>/chart_index.json is used
manifest = {}

[tier1]
; Overview charts loaded concurrently during startup
batch_size = {}
; Encoding tiles are handed out in, used for the memory estimate: raw or base64
payload_encoding = {}

[tier2]
; Maximum number of open harbour datasets (1-50)
pool_size = {}
; Copy datasets here before opening them. If empty, datasets are opened in place
staging_dir = {}

[viewport]
; Maximum harbour charts opened ahead of need per viewport change
preload_limit = {}
; Highest chart level served from memory when the manifest does not say
tier1_max_level = {}
"#,
        path_to_string(&config.charts.directory),
        manifest,
        config.tier1.batch_size,
        config.tier1.payload_encoding,
        config.tier2.pool_size,
        staging_dir,
        config.viewport.preload_limit,
        config.viewport.tier1_max_level,
    )
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
