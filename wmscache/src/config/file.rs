//! Configuration file handling for ~/.wmscache/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`] and parsing in [`super::parser`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::cache::{CacheDescription, DescriptionError, SourceEndpoint};
use crate::controller::PipelineOptions;
use crate::fetch::{BoundedRetry, RetryForever, RetryPolicy};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.wmscache/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// The source endpoint described by `[source]`.
    pub fn source_endpoint(&self) -> SourceEndpoint {
        SourceEndpoint::new(&self.source.host, self.source.port, &self.source.layer)
    }

    /// Validated cache description.
    pub fn cache_description(&self) -> Result<CacheDescription, DescriptionError> {
        CacheDescription::builder(&self.storage.directory)
            .with_layer(self.layer.clone())
            .with_source(self.source_endpoint())
            .with_extension(&self.storage.extension)
            .with_tile_size(self.tile.width, self.tile.height)
            .with_padding(self.tile.padding)
            .with_source_content_type(self.source.content_type)
            .with_cached_content_type(self.storage.content_type)
            .with_data_type(self.raster.data_type)
            .with_invalid_value(self.raster.invalid_value)
            .with_default_value(self.raster.default_value)
            .with_pixels_per_degree(self.raster.pixels_per_degree)
            .build()
    }

    /// Retry policy described by `[fetch]`.
    pub fn retry_policy(&self) -> Arc<dyn RetryPolicy> {
        let delay = Duration::from_millis(self.fetch.retry_delay_ms);
        match self.fetch.max_attempts {
            0 => Arc::new(RetryForever::with_delay(delay)),
            attempts => Arc::new(BoundedRetry::new(attempts, delay)),
        }
    }

    /// Pipeline tuning described by `[fetch]`.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            retry: self.retry_policy(),
            workers: self.fetch.workers,
        }
    }
}

/// Get the path to the config directory (~/.wmscache).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wmscache")
}

/// Get the path to the config file (~/.wmscache/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ContentType;
    use crate::raster::{DataType, Value};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[source]\nhost = tiles.local\n[tile]\nwidth = 512\nheight = 512\n")
            .unwrap();

        let config = ConfigFile::load_from(&path).unwrap();

        assert_eq!(config.source.host, "tiles.local");
        assert_eq!(config.tile.width, 512);
    }

    #[test]
    fn test_invalid_file_reports_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[fetch]\nworkers = many\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("fetch.workers"));
    }

    #[test]
    fn test_default_description() {
        let mut config = ConfigFile::default();
        config.storage.directory = PathBuf::from("/srv/cache");

        let desc = config.cache_description().unwrap();

        assert_eq!(desc.storage_root(), Path::new("/srv/cache"));
        assert_eq!(desc.extension(), ".cem");
        assert_eq!(desc.tile_width(), 2048);
        assert_eq!(desc.grid().tiles_x(), 512);
        assert_eq!(desc.grid().tiles_y(), 256);
        assert_eq!(desc.data_type(), DataType::S16);
        assert_eq!(desc.invalid_value(), Some(Value::S16(-9999)));
        assert_eq!(desc.cached_content_type(), ContentType::Elevation);
        assert_eq!(desc.source().base_url(), "http://localhost:8282/");
    }

    #[test]
    fn test_mismatched_content_type_fails_description() {
        let mut config = ConfigFile::default();
        config.raster.data_type = DataType::U8;
        config.raster.invalid_value = None;
        config.raster.default_value = Value::U8(0);

        let err = config.cache_description().unwrap_err();
        assert!(matches!(err, DescriptionError::SourceContentType { .. }));
    }

    #[test]
    fn test_retry_policy_from_max_attempts() {
        let mut config = ConfigFile::default();
        assert!(config.retry_policy().next_delay(1_000).is_some());

        config.fetch.max_attempts = 2;
        let policy = config.retry_policy();
        assert!(policy.next_delay(1).is_some());
        assert!(policy.next_delay(2).is_none());
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with(".wmscache/config.ini"));
    }
}
