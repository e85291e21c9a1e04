//! Grid layout of the configured cache.

use wmscache::config::ConfigFile;

use super::common::print_row;
use crate::error::CliError;

/// Print the grid without touching the storage root.
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let description = config.cache_description()?;
    let grid = description.grid();

    println!("Layer: {} ({})", description.layer().id, description.layer().title);
    print_row("Storage root", description.storage_root().display());
    print_row(
        "Tile size",
        format!(
            "{}x{} {}",
            description.tile_width(),
            description.tile_height(),
            description.data_type()
        ),
    );
    print_row("Pixels per degree", config.raster.pixels_per_degree);
    print_row("Levels", grid.num_levels());
    print_row(
        "Digits (l/x/y)",
        format!(
            "{}/{}/{}",
            grid.level_digits(),
            grid.x_digits(),
            grid.y_digits()
        ),
    );
    println!();

    println!("  {:>5} {:>8} {:>8} {:>12}", "level", "tiles_x", "tiles_y", "tiles");
    for level in 0..grid.num_levels() {
        if let Some((tiles_x, tiles_y)) = grid.level_tiles(level) {
            println!(
                "  {:>5} {:>8} {:>8} {:>12}",
                level,
                tiles_x,
                tiles_y,
                u64::from(tiles_x) * u64::from(tiles_y)
            );
        }
    }

    Ok(())
}
