//! Helpers shared by several commands.

use std::path::Path;
use tracing::info;
use wmscache::config::ConfigFile;
use wmscache::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Load the configuration from `path`, or from the default location.
///
/// A missing file yields the compiled-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Start logging for a long-running command.
///
/// The returned guard must stay alive until the command finishes.
pub fn start_logging(config: &ConfigFile, command: &str) -> Result<LoggingGuard, CliError> {
    let guard = init_logging(&config.logging.file).map_err(CliError::LoggingInit)?;
    info!("wmscache v{}", wmscache::VERSION);
    info!(log_file = %config.logging.file.display(), "wmscache CLI: {} command", command);
    Ok(guard)
}

/// Print a labelled row, aligned like the other command output.
pub fn print_row(label: &str, value: impl std::fmt::Display) {
    println!("  {:<20} {}", format!("{}:", label), value);
}
