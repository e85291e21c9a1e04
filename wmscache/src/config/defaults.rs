//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::settings::*;
use crate::cache::{LayerInfo, TilePadding};
use crate::codec::ContentType;
use crate::fetch::default_workers;
use crate::grid::DEFAULT_PIXELS_PER_DEGREE;
use crate::logging::default_log_file;
use crate::provider::DEFAULT_TIMEOUT_SECS;
use crate::raster::{DataType, Value};

// =============================================================================
// Source
// =============================================================================

pub const DEFAULT_SOURCE_HOST: &str = "localhost";
pub const DEFAULT_SOURCE_PORT: u16 = 8282;
pub const DEFAULT_SOURCE_LAYER: &str = "QualityElevation";

// =============================================================================
// Storage and tiles
// =============================================================================

pub const DEFAULT_EXTENSION: &str = ".cem";
pub const DEFAULT_CACHED_CONTENT_TYPE: ContentType = ContentType::Elevation;
pub const DEFAULT_TILE_SIZE: u32 = 2048;

// =============================================================================
// Raster
// =============================================================================

pub const DEFAULT_DATA_TYPE: DataType = DataType::S16;

/// Void marker of ASTER-class elevation data.
pub const DEFAULT_INVALID_VALUE: Value = Value::S16(-9999);
pub const DEFAULT_VALUE: Value = Value::S16(0);

// =============================================================================
// Fetch
// =============================================================================

/// Retry forever.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 0;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 0;

/// Default cache root: the platform cache directory plus `wmscache`.
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wmscache")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            layer: LayerInfo::default(),
            source: SourceSettings {
                host: DEFAULT_SOURCE_HOST.to_string(),
                port: DEFAULT_SOURCE_PORT,
                layer: DEFAULT_SOURCE_LAYER.to_string(),
                content_type: ContentType::Raw(DEFAULT_DATA_TYPE),
                timeout: DEFAULT_TIMEOUT_SECS,
            },
            storage: StorageSettings {
                directory: default_cache_directory(),
                extension: DEFAULT_EXTENSION.to_string(),
                content_type: DEFAULT_CACHED_CONTENT_TYPE,
            },
            tile: TileSettings {
                width: DEFAULT_TILE_SIZE,
                height: DEFAULT_TILE_SIZE,
                padding: TilePadding::default(),
            },
            raster: RasterSettings {
                pixels_per_degree: DEFAULT_PIXELS_PER_DEGREE,
                data_type: DEFAULT_DATA_TYPE,
                invalid_value: Some(DEFAULT_INVALID_VALUE),
                default_value: DEFAULT_VALUE,
            },
            fetch: FetchSettings {
                workers: default_workers(),
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
