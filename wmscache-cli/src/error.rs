//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use wmscache::cache::{CacheError, DescriptionError};
use wmscache::config::ConfigFileError;
use wmscache::controller::PipelineError;
use wmscache::provider::ProviderError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be read or parsed
    Config(ConfigFileError),
    /// Configuration values do not describe a valid cache
    Description(DescriptionError),
    /// Failed to create or scan the cache
    Cache(CacheError),
    /// Failed to create the map client
    Client(ProviderError),
    /// The pipeline stopped with an error
    Pipeline(PipelineError),
    /// The pipeline ended without building the full pyramid
    Unfinished(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) | CliError::Description(_) => {
                eprintln!();
                eprintln!(
                    "Check the configuration file, by default {}",
                    wmscache::config::config_file_path().display()
                );
            }
            CliError::Unfinished(_) => {
                eprintln!();
                eprintln!("Tiles already written are kept. Run 'wmscache build' again to resume.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Description(e) => write!(f, "Invalid cache settings: {}", e),
            CliError::Cache(e) => write!(f, "Tile cache error: {}", e),
            CliError::Client(e) => write!(f, "Failed to create map client: {}", e),
            CliError::Pipeline(e) => write!(f, "Pipeline failed: {}", e),
            CliError::Unfinished(msg) => write!(f, "Pipeline did not finish: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Description(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Unfinished(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<DescriptionError> for CliError {
    fn from(e: DescriptionError) -> Self {
        CliError::Description(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Client(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}
