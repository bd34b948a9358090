//! Stats command - initialize the server and print its statistics.

use clap::Args;
use seachart::server::TieredTileServer;

use super::common::{initialize_with_bar, runtime, GlobalArgs};
use crate::error::CliError;

/// Arguments for the stats command.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Preload the tier-2 charts for this viewport before reporting (LON,LAT,ZOOM)
    #[arg(long, value_name = "LON,LAT,ZOOM", allow_hyphen_values = true)]
    pub viewport: Option<String>,
}

/// Run the stats command.
pub fn run(global: &GlobalArgs, args: StatsArgs) -> Result<(), CliError> {
    let viewport = args.viewport.as_deref().map(parse_viewport).transpose()?;
    let server = TieredTileServer::new(global.server_config()?);
    let rt = runtime()?;

    let result = rt.block_on(async {
        initialize_with_bar(&server).await?;
        if let Some((lon, lat, zoom)) = viewport {
            let opened = server.preload_for_viewport(lon, lat, zoom).await;
            println!("Preloaded {} tier-2 charts", opened);
        }
        Ok::<(), CliError>(())
    });

    if result.is_ok() {
        println!("{}", server.get_stats());
    }
    server.shutdown();
    result
}

fn parse_viewport(s: &str) -> Result<(f64, f64, u8), CliError> {
    let invalid = || {
        CliError::InvalidArgument(format!("invalid viewport '{}', expected LON,LAT,ZOOM", s))
    };

    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [lon, lat, zoom] = parts.as_slice() else {
        return Err(invalid());
    };
    Ok((
        lon.parse().map_err(|_| invalid())?,
        lat.parse().map_err(|_| invalid())?,
        zoom.parse().map_err(|_| invalid())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        assert_eq!(
            parse_viewport("-71.05, 42.35, 12").unwrap(),
            (-71.05, 42.35, 12)
        );
    }

    #[test]
    fn test_parse_viewport_rejects_bad_input() {
        assert!(parse_viewport("-71.05,42.35").is_err());
        assert!(parse_viewport("a,b,c").is_err());
        assert!(parse_viewport("-71.05,42.35,300").is_err());
    }
}
