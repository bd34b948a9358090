//! Tile command - fetch a single tile through the tiered server.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use seachart::coord::TileCoord;
use seachart::server::TieredTileServer;

use super::common::{format_size, initialize_with_bar, runtime, GlobalArgs};
use crate::error::CliError;

/// Arguments for the tile command.
#[derive(Debug, Args)]
pub struct TileArgs {
    /// Chart id
    pub chart: String,

    /// Zoom level
    pub z: u8,

    /// Tile column
    pub x: u32,

    /// Tile row (XYZ scheme, 0 at the top)
    pub y: u32,

    /// Write the tile payload to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Run the tile command.
pub fn run(global: &GlobalArgs, args: TileArgs) -> Result<(), CliError> {
    let server = TieredTileServer::new(global.server_config()?);
    let rt = runtime()?;

    let result = rt.block_on(fetch(&server, &args));
    server.shutdown();
    result
}

async fn fetch(server: &TieredTileServer, args: &TileArgs) -> Result<(), CliError> {
    let start = Instant::now();
    initialize_with_bar(server).await?;
    println!(
        "Server ready in {:.2}s ({} charts in memory)",
        start.elapsed().as_secs_f64(),
        server.memory().stats().chart_count
    );

    let tier = server
        .index()
        .and_then(|index| index.tier(&args.chart))
        .ok_or_else(|| CliError::UnknownChart(args.chart.clone()))?;

    let tile = TileCoord::new(args.z, args.x, args.y);
    let payload = server
        .get_tile(&args.chart, tile)
        .await
        .ok_or_else(|| CliError::TileNotFound {
            chart_id: args.chart.clone(),
            tile,
        })?;

    println!(
        "Tile {}/{}/{} from '{}' ({}): {}",
        tile.zoom,
        tile.x,
        tile.y,
        args.chart,
        tier,
        format_size(payload.len() as u64)
    );

    if let Some(path) = &args.output {
        std::fs::write(path, &payload).map_err(|error| CliError::FileWrite {
            path: path.clone(),
            error,
        })?;
        println!("Saved to {}", path.display());
    }

    Ok(())
}
