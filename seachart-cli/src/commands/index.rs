//! Index command - summarize the chart index.

use clap::Args;
use seachart::index::ChartRecord;

use super::common::{format_size, load_index, GlobalArgs};
use crate::error::CliError;

/// Arguments for the index command.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// List every chart, grouped by level
    #[arg(long)]
    pub list: bool,
}

/// Run the index command.
pub fn run(global: &GlobalArgs, args: IndexArgs) -> Result<(), CliError> {
    let config = global.server_config()?;
    let index = load_index(&config)?;
    let summary = index.summary();

    println!("Chart index: {}", config.manifest_path().display());
    println!("  Charts:     {}", summary.total_charts);
    println!("  Tier 1:     {}", summary.tier1_count);
    println!("  Tier 2:     {}", summary.tier2_count);
    println!("  Total size: {}", format_size(summary.total_size_bytes));
    println!("  Max depth:  {}", summary.max_depth);

    if let Some(written) = index.manifest_stats() {
        if written.total_charts != summary.total_charts {
            println!(
                "  Note: manifest declares {} charts, {} loaded",
                written.total_charts, summary.total_charts
            );
        }
    }

    if args.list {
        let mut records: Vec<&ChartRecord> = index.records().collect();
        records.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.id.cmp(&b.id)));

        println!();
        for record in records {
            println!("  {}", describe(record));
        }
    }

    Ok(())
}

fn describe(record: &ChartRecord) -> String {
    let zoom = match (record.min_zoom, record.max_zoom) {
        (None, None) => "any".to_string(),
        (min, max) => format!(
            "{}-{}",
            min.map_or("*".to_string(), |z| z.to_string()),
            max.map_or("*".to_string(), |z| z.to_string())
        ),
    };
    let parent = record.parent_id.as_deref().unwrap_or("-");

    format!(
        "{:<16} level {:<2} {}  zoom {:<7} parent {:<16} {}",
        record.id,
        record.level,
        record.tier,
        zoom,
        parent,
        format_size(record.size_bytes)
    )
}
