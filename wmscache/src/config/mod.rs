//! Configuration for wmscache.
//!
//! The INI file at `~/.wmscache/config.ini` is parsed into a [`ConfigFile`]
//! with one settings struct per section. Every key is optional; missing
//! keys keep their compiled-in defaults.
//!
//! # Example
//!
//! ```
//! use wmscache::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let description = config.cache_description().unwrap();
//! assert_eq!(description.grid().num_levels(), 9);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, FetchSettings, LoggingSettings, RasterSettings, SourceSettings, StorageSettings,
    TileSettings,
};
