//! SeaChart CLI - Command-line interface
//!
//! Inspects chart indexes and serves single tiles through the tiered cache.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use seachart::logging::{default_log_dir, default_log_file, init_logging};
use tracing::info;

use commands::common::GlobalArgs;
use commands::config::ConfigCommands;
use commands::index::IndexArgs;
use commands::stats::StatsArgs;
use commands::tile::TileArgs;
use commands::viewport::ViewportArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "seachart")]
#[command(version = seachart::VERSION)]
#[command(about = "Tiered tile cache for offline nautical charts", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the chart index
    Index(IndexArgs),

    /// Resolve the tier-1 and tier-2 charts covering a viewport
    Viewport(ViewportArgs),

    /// Fetch a single tile through the tiered server
    Tile(TileArgs),

    /// Initialize the server and print cache statistics
    Stats(StatsArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = match init_logging(&default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };
    info!(version = seachart::VERSION, "SeaChart CLI starting");

    let result = match cli.command {
        Commands::Index(args) => commands::index::run(&cli.global, args),
        Commands::Viewport(args) => commands::viewport::run(&cli.global, args),
        Commands::Tile(args) => commands::tile::run(&cli.global, args),
        Commands::Stats(args) => commands::stats::run(&cli.global, args),
        Commands::Config { command } => commands::config::run(&cli.global, command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_viewport_with_negative_longitude() {
        let cli = Cli::try_parse_from([
            "seachart", "viewport", "--lon", "-71.05", "--lat", "42.35", "--zoom", "12",
        ])
        .unwrap();
        match cli.command {
            Commands::Viewport(args) => {
                assert_eq!(args.lon, -71.05);
                assert_eq!(args.zoom, 12);
            }
            _ => panic!("expected viewport command"),
        }
    }

    #[test]
    fn test_parse_tile_with_global_charts_dir() {
        let cli = Cli::try_parse_from([
            "seachart", "tile", "us5ma1", "13", "2479", "3029", "-o", "tile.pbf",
            "--charts-dir", "/data/charts",
        ])
        .unwrap();
        assert_eq!(
            cli.global.charts_dir.as_deref(),
            Some(std::path::Path::new("/data/charts"))
        );
        match cli.command {
            Commands::Tile(args) => {
                assert_eq!(args.chart, "us5ma1");
                assert_eq!((args.z, args.x, args.y), (13, 2479, 3029));
                assert!(args.output.is_some());
            }
            _ => panic!("expected tile command"),
        }
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["seachart", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Init { force: true }
            }
        ));
    }
}
