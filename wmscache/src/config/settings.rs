//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing logic.

use crate::cache::{LayerInfo, TilePadding};
use crate::codec::ContentType;
use crate::raster::{DataType, Value};
use std::path::PathBuf;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Identity of the served layer
    pub layer: LayerInfo,
    /// WMS source settings
    pub source: SourceSettings,
    /// On-disk layout
    pub storage: StorageSettings,
    /// Tile dimensions and padding
    pub tile: TileSettings,
    /// Element type, sentinel and grid density
    pub raster: RasterSettings,
    /// Finest-level retrieval
    pub fetch: FetchSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// WMS source configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub host: String,
    pub port: u16,
    /// Source layer sent as `LAYERS`
    pub layer: String,
    /// Format requested from the source
    pub content_type: ContentType,
    /// Timeout in seconds for HTTP requests
    pub timeout: u64,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Cache root directory
    pub directory: PathBuf,
    /// Tile file extension, with or without the leading dot
    pub extension: String,
    /// Format tiles are stored in
    pub content_type: ContentType,
}

/// Tile configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSettings {
    pub width: u32,
    pub height: u32,
    pub padding: TilePadding,
}

/// Raster configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSettings {
    /// Source pixel density the grid is planned from
    pub pixels_per_degree: u32,
    pub data_type: DataType,
    /// Sentinel marking pixels without data, if any
    pub invalid_value: Option<Value>,
    /// Fill value used when no sentinel is configured
    pub default_value: Value,
}

/// Fetch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Concurrent tile requests
    pub workers: usize,
    /// Attempts per tile before giving up; 0 retries forever
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub retry_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
