//! Single tile lookup.

use wmscache::cache::{tile_path, TileCoord, TileStatus};
use wmscache::config::ConfigFile;
use wmscache::controller::CacheController;
use wmscache::layer::TileLookup;

use super::common::print_row;
use crate::error::CliError;

/// Print the state of one tile and, when stored, its value range.
pub fn run(config: &ConfigFile, level: u32, x: u32, y: u32) -> Result<(), CliError> {
    let controller = CacheController::from_config(config)?;
    let description = controller.description();
    let coord = TileCoord::new(level, x, y);

    let lookup = controller.layer().lookup(coord)?;
    let status = controller
        .index()
        .status(coord)
        .unwrap_or(TileStatus::Missing);

    println!("Tile {}", coord);
    print_row("Path", tile_path(description, coord).display());
    print_row("Status", status);

    match lookup {
        TileLookup::Pending => {
            print_row("Data", "pending");
        }
        TileLookup::Ready(raster) => {
            print_row(
                "Size",
                format!("{}x{} {}", raster.width(), raster.height(), raster.data_type()),
            );
            match raster.value_range(description.invalid_value()) {
                Some((min, max)) => print_row("Value range", format!("{} .. {}", min, max)),
                None => print_row("Value range", "no valid samples"),
            }
        }
    }

    Ok(())
}
