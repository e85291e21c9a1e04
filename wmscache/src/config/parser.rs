//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::codec::ContentType;
use crate::raster::{DataType, Value};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [layer] section
    if let Some(section) = ini.section(Some("layer")) {
        if let Some(v) = non_empty(section, "id") {
            config.layer.id = v.to_string();
        }
        if let Some(v) = non_empty(section, "title") {
            config.layer.title = v.to_string();
        }
        if let Some(v) = section.get("abstract") {
            config.layer.abstract_text = v.trim().to_string();
        }
    }

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = non_empty(section, "host") {
            config.source.host = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.source.port = parse_number(
                "source",
                "port",
                v,
                "must be a port number between 1 and 65535",
            )?;
            if config.source.port == 0 {
                return Err(invalid("source", "port", v, "port 0 is not allowed"));
            }
        }
        if let Some(v) = non_empty(section, "layer") {
            config.source.layer = v.to_string();
        }
        if let Some(v) = section.get("content_type") {
            config.source.content_type = parse_content_type("source", v)?;
        }
        if let Some(v) = section.get("timeout") {
            config.source.timeout =
                parse_number("source", "timeout", v, "must be a positive integer (seconds)")?;
            if config.source.timeout == 0 {
                return Err(invalid(
                    "source",
                    "timeout",
                    v,
                    "must be a positive integer (seconds)",
                ));
            }
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = non_empty(section, "directory") {
            config.storage.directory = expand_tilde(v);
        }
        if let Some(v) = section.get("extension") {
            let bare = v.trim().trim_start_matches('.');
            if bare.is_empty() {
                return Err(invalid("storage", "extension", v, "must not be empty"));
            }
            config.storage.extension = format!(".{}", bare);
        }
        if let Some(v) = section.get("content_type") {
            config.storage.content_type = parse_content_type("storage", v)?;
        }
    }

    // [tile] section
    if let Some(section) = ini.section(Some("tile")) {
        if let Some(v) = section.get("width") {
            config.tile.width = parse_tile_size("width", v)?;
        }
        if let Some(v) = section.get("height") {
            config.tile.height = parse_tile_size("height", v)?;
        }
        let padding = &mut config.tile.padding;
        for (key, field) in [
            ("padding_left", &mut padding.left),
            ("padding_top", &mut padding.top),
            ("padding_right", &mut padding.right),
            ("padding_bottom", &mut padding.bottom),
        ] {
            if let Some(v) = section.get(key) {
                *field = parse_number("tile", key, v, "must be a non-negative integer (pixels)")?;
            }
        }
    }

    // [raster] section
    //
    // Values are parsed with the configured data type. When the data type is
    // changed without giving them, the sentinel becomes unset and the default
    // becomes zero of the new type.
    if let Some(section) = ini.section(Some("raster")) {
        if let Some(v) = section.get("pixels_per_degree") {
            config.raster.pixels_per_degree = parse_number(
                "raster",
                "pixels_per_degree",
                v,
                "must be a positive integer",
            )?;
            if config.raster.pixels_per_degree == 0 {
                return Err(invalid(
                    "raster",
                    "pixels_per_degree",
                    v,
                    "must be a positive integer",
                ));
            }
        }

        if let Some(v) = section.get("data_type") {
            let data_type = DataType::from_str(v.trim())
                .map_err(|e| invalid("raster", "data_type", v, &e.to_string()))?;
            if data_type != config.raster.data_type {
                config.raster.data_type = data_type;
                config.raster.invalid_value = None;
                config.raster.default_value = zero_of(data_type);
            }
        }
        let data_type = config.raster.data_type;

        if let Some(v) = section.get("invalid_value") {
            config.raster.invalid_value = if v.trim().is_empty() {
                None
            } else {
                Some(parse_value("invalid_value", data_type, v)?)
            };
        }
        if let Some(v) = section.get("default_value") {
            config.raster.default_value = parse_value("default_value", data_type, v)?;
        }
    }

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = section.get("workers") {
            let workers: usize =
                parse_number("fetch", "workers", v, "must be a positive integer")?;
            if workers == 0 {
                return Err(invalid("fetch", "workers", v, "must be a positive integer"));
            }
            config.fetch.workers = workers;
        }
        if let Some(v) = section.get("max_attempts") {
            config.fetch.max_attempts = parse_number(
                "fetch",
                "max_attempts",
                v,
                "must be a non-negative integer (0 = retry forever)",
            )?;
        }
        if let Some(v) = section.get("retry_delay_ms") {
            config.fetch.retry_delay_ms = parse_number(
                "fetch",
                "retry_delay_ms",
                v,
                "must be a non-negative integer (milliseconds)",
            )?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_tile_size(key: &str, value: &str) -> Result<u32, ConfigFileError> {
    let size: u32 = parse_number("tile", key, value, "must be a positive integer (pixels)")?;
    if size == 0 {
        return Err(invalid("tile", key, value, "must be a positive integer (pixels)"));
    }
    Ok(size)
}

fn parse_content_type(section: &str, value: &str) -> Result<ContentType, ConfigFileError> {
    value
        .parse()
        .map_err(|reason: String| invalid(section, "content_type", value, &reason))
}

fn parse_value(key: &str, data_type: DataType, value: &str) -> Result<Value, ConfigFileError> {
    Value::parse(data_type, value.trim()).map_err(|e| invalid("raster", key, value, &e.to_string()))
}

fn zero_of(data_type: DataType) -> Value {
    match data_type {
        DataType::U8 => Value::U8(0),
        DataType::S16 => Value::S16(0),
        DataType::U16 => Value::U16(0),
        DataType::S32 => Value::S32(0),
        DataType::F32 => Value::F32(0.0),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
