//! wmscache CLI - Command-line interface
//!
//! Builds and inspects a WMS tile-cache pyramid described by an INI file.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use error::CliError;

#[derive(Parser)]
#[command(name = "wmscache")]
#[command(version = wmscache::VERSION)]
#[command(about = "Build a tile pyramid from a WMS source", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.wmscache/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tile grid: levels, tiles per level and path digit widths
    Plan,

    /// Scan the cache and print Missing/Empty/Exists counts per level
    Status,

    /// Fetch the finest level and build every coarser level
    ///
    /// Tiles already on disk are kept, so an interrupted build resumes
    /// where it stopped. Press Ctrl-C to cancel.
    Build {
        /// Concurrent fetch requests (overrides [fetch] workers)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Look up one tile and print its state
    Tile {
        /// Pyramid level, 0 is coarsest
        level: u32,
        /// Column index
        x: u32,
        /// Row index
        y: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan => commands::plan::run(&config),
        Commands::Status => commands::status::run(&config),
        Commands::Build { workers } => commands::build::run(&config, workers),
        Commands::Tile { level, x, y } => commands::tile::run(&config, level, x, y),
    }
}
