//! Per-level tile status counts.

use wmscache::cache::{FileStatusIndex, StatusCounts};
use wmscache::config::ConfigFile;

use super::common::print_row;
use crate::error::CliError;

/// Scan the storage root and print the status of every level.
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let description = config.cache_description()?;
    let index = FileStatusIndex::build(&description)?;

    println!("Tile cache: {}", description.storage_root().display());
    println!();
    println!(
        "  {:>5} {:>10} {:>10} {:>10} {:>8}",
        "level", "missing", "empty", "exists", "done"
    );

    let mut total = StatusCounts::default();
    for level in index.levels() {
        let counts = level.counts();
        println!(
            "  {:>5} {:>10} {:>10} {:>10} {:>7.1}%",
            level.level(),
            counts.missing,
            counts.empty,
            counts.exists,
            percent_done(&counts)
        );
        total.missing += counts.missing;
        total.empty += counts.empty;
        total.exists += counts.exists;
    }

    println!();
    print_row("Total tiles", total.total());
    print_row("Done", format!("{:.1}%", percent_done(&total)));
    let finest = if index.finest_level_resolved().is_some() {
        "resolved"
    } else {
        "incomplete"
    };
    print_row("Finest level", finest);

    Ok(())
}

fn percent_done(counts: &StatusCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 100.0;
    }
    (counts.empty + counts.exists) as f64 * 100.0 / total as f64
}
