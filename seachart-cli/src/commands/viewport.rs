//! Viewport command - resolve the charts a map view needs.

use clap::Args;
use seachart::coord::to_tile_coords;
use seachart::index::ViewportCharts;

use super::common::{load_index, GlobalArgs};
use crate::error::CliError;

/// Arguments for the viewport command.
#[derive(Debug, Args)]
pub struct ViewportArgs {
    /// Longitude of the view centre in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Latitude of the view centre in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Map zoom level
    #[arg(long)]
    pub zoom: u8,
}

/// Run the viewport command.
pub fn run(global: &GlobalArgs, args: ViewportArgs) -> Result<(), CliError> {
    let config = global.server_config()?;
    let index = load_index(&config)?;

    let charts = index.find_for_viewport(args.lon, args.lat, args.zoom);

    println!("Viewport: {}, {} at zoom {}", args.lon, args.lat, args.zoom);
    println!("  {}", tile_line(args.lon, args.lat, args.zoom));
    println!();
    print!("{}", report(&charts, config.preload_limit));

    Ok(())
}

/// The tile under the viewport centre; outside Web Mercator there is none.
fn tile_line(lon: f64, lat: f64, zoom: u8) -> String {
    match to_tile_coords(lon, lat, zoom) {
        Ok(tile) => format!("Tile: {}/{}/{}", tile.zoom, tile.x, tile.y),
        Err(e) => format!("Tile: none ({})", e),
    }
}

fn report(charts: &ViewportCharts, preload_limit: usize) -> String {
    if charts.is_empty() {
        return "No charts cover this viewport\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("Tier 1 ({}): {}\n", charts.tier1.len(), join(&charts.tier1)));
    out.push_str(&format!("Tier 2 ({}): {}\n", charts.tier2.len(), join(&charts.tier2)));
    if charts.tier2.len() > preload_limit {
        out.push_str(&format!(
            "  Only the first {} tier-2 charts are preloaded per viewport change\n",
            preload_limit
        ));
    }
    out
}

fn join(ids: &[String]) -> String {
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}
