//! Immutable description of one tile cache.
//!
//! A [`CacheDescription`] is assembled once through
//! [`CacheDescriptionBuilder`], which validates the element type, the
//! sentinel values and the grid before anything touches the disk.

use crate::codec::ContentType;
use crate::grid::{GridError, GridPlan, GridPlanner, DEFAULT_PIXELS_PER_DEGREE};
use crate::raster::{DataType, TileShape, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while validating a cache description.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptionError {
    #[error("element data type is not set")]
    MissingDataType,

    #[error("default value is not set")]
    MissingDefaultValue,

    #[error("invalid value {value} does not match data type {data_type}")]
    InvalidValueType { value: Value, data_type: DataType },

    #[error("default value {value} does not match data type {data_type}")]
    DefaultValueType { value: Value, data_type: DataType },

    #[error("source content type {content_type} cannot deliver {data_type} tiles")]
    SourceContentType {
        content_type: ContentType,
        data_type: DataType,
    },

    #[error("cached content type {content_type} cannot store {data_type} tiles")]
    CachedContentType {
        content_type: ContentType,
        data_type: DataType,
    },

    #[error("file extension must not be empty")]
    EmptyExtension,

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Identity of the layer served from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub id: String,
    pub title: String,
    pub abstract_text: String,
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            id: "tile-cache".to_string(),
            title: "Tile Cache".to_string(),
            abstract_text: String::new(),
        }
    }
}

/// WMS server and layer the finest level is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoint {
    host: String,
    port: u16,
    layer: String,
}

impl SourceEndpoint {
    pub fn new(host: impl Into<String>, port: u16, layer: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            layer: layer.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Source layer name sent as `LAYERS`.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Base URL requests are issued against, e.g. `http://localhost:8282/`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl Default for SourceEndpoint {
    fn default() -> Self {
        Self::new("localhost", 8282, "QualityElevation")
    }
}

/// Extra pixels requested around each tile edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TilePadding {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl TilePadding {
    /// Same padding on all four edges.
    pub fn uniform(pixels: u32) -> Self {
        Self {
            left: pixels,
            top: pixels,
            right: pixels,
            bottom: pixels,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }
}

/// Validated, immutable cache parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheDescription {
    layer: LayerInfo,
    source: SourceEndpoint,
    storage_root: PathBuf,
    extension: String,
    tile_width: u32,
    tile_height: u32,
    padding: TilePadding,
    source_content_type: ContentType,
    cached_content_type: ContentType,
    data_type: DataType,
    invalid_value: Option<Value>,
    default_value: Value,
    grid: GridPlan,
}

impl CacheDescription {
    /// Start building a description rooted at `storage_root`.
    pub fn builder(storage_root: impl Into<PathBuf>) -> CacheDescriptionBuilder {
        CacheDescriptionBuilder::new(storage_root)
    }

    pub fn layer(&self) -> &LayerInfo {
        &self.layer
    }

    pub fn source(&self) -> &SourceEndpoint {
        &self.source
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Stored-file extension including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn padding(&self) -> TilePadding {
        self.padding
    }

    pub fn source_content_type(&self) -> ContentType {
        self.source_content_type
    }

    pub fn cached_content_type(&self) -> ContentType {
        self.cached_content_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn invalid_value(&self) -> Option<Value> {
        self.invalid_value
    }

    pub fn default_value(&self) -> Value {
        self.default_value
    }

    pub fn grid(&self) -> &GridPlan {
        &self.grid
    }

    /// Shape of every tile in the cache.
    pub fn tile_shape(&self) -> TileShape {
        TileShape::new(self.tile_width, self.tile_height, self.data_type)
    }

    /// Value used for pixels without data: the sentinel if set, else the default.
    pub fn fill_value(&self) -> Value {
        self.invalid_value.unwrap_or(self.default_value)
    }
}

/// Builder for [`CacheDescription`].
#[derive(Debug, Clone)]
pub struct CacheDescriptionBuilder {
    layer: LayerInfo,
    source: SourceEndpoint,
    storage_root: PathBuf,
    extension: String,
    tile_width: u32,
    tile_height: u32,
    padding: TilePadding,
    source_content_type: Option<ContentType>,
    cached_content_type: Option<ContentType>,
    data_type: Option<DataType>,
    invalid_value: Option<Value>,
    default_value: Option<Value>,
    pixels_per_degree: u32,
    grid: Option<GridPlan>,
}

impl CacheDescriptionBuilder {
    fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            layer: LayerInfo::default(),
            source: SourceEndpoint::default(),
            storage_root: storage_root.into(),
            extension: ".cem".to_string(),
            tile_width: 2048,
            tile_height: 2048,
            padding: TilePadding::default(),
            source_content_type: None,
            cached_content_type: None,
            data_type: None,
            invalid_value: None,
            default_value: None,
            pixels_per_degree: DEFAULT_PIXELS_PER_DEGREE,
            grid: None,
        }
    }

    pub fn with_layer(mut self, layer: LayerInfo) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_source(mut self, source: SourceEndpoint) -> Self {
        self.source = source;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_padding(mut self, padding: TilePadding) -> Self {
        self.padding = padding;
        self
    }

    /// Content type requested from the source. Defaults to raw elements of
    /// the configured data type.
    pub fn with_source_content_type(mut self, content_type: ContentType) -> Self {
        self.source_content_type = Some(content_type);
        self
    }

    /// Content type tiles are stored as. Defaults to raw elements.
    pub fn with_cached_content_type(mut self, content_type: ContentType) -> Self {
        self.cached_content_type = Some(content_type);
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_invalid_value(mut self, value: Option<Value>) -> Self {
        self.invalid_value = value;
        self
    }

    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Source pixel density the grid is planned from.
    pub fn with_pixels_per_degree(mut self, pixels_per_degree: u32) -> Self {
        self.pixels_per_degree = pixels_per_degree;
        self
    }

    /// Use a pre-planned grid instead of planning from the pixel density.
    pub fn with_grid(mut self, grid: GridPlan) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Validate and freeze the description.
    pub fn build(self) -> Result<CacheDescription, DescriptionError> {
        let data_type = self.data_type.ok_or(DescriptionError::MissingDataType)?;
        let default_value = self
            .default_value
            .ok_or(DescriptionError::MissingDefaultValue)?;

        if default_value.data_type() != data_type {
            return Err(DescriptionError::DefaultValueType {
                value: default_value,
                data_type,
            });
        }
        if let Some(value) = self.invalid_value {
            if value.data_type() != data_type {
                return Err(DescriptionError::InvalidValueType { value, data_type });
            }
        }

        let source_content_type = self
            .source_content_type
            .unwrap_or(ContentType::Raw(data_type));
        if source_content_type != ContentType::Raw(data_type) {
            return Err(DescriptionError::SourceContentType {
                content_type: source_content_type,
                data_type,
            });
        }

        let cached_content_type = self
            .cached_content_type
            .unwrap_or(ContentType::Raw(data_type));
        let storable = match cached_content_type {
            ContentType::Raw(stored) => stored == data_type,
            ContentType::Elevation => data_type.is_integer(),
        };
        if !storable {
            return Err(DescriptionError::CachedContentType {
                content_type: cached_content_type,
                data_type,
            });
        }

        let extension = normalize_extension(&self.extension)?;

        let grid = match self.grid {
            Some(grid) => {
                if self.tile_width == 0 || self.tile_height == 0 {
                    return Err(GridError::ZeroTileSize {
                        width: self.tile_width,
                        height: self.tile_height,
                    }
                    .into());
                }
                grid
            }
            None => GridPlanner::new(self.pixels_per_degree)
                .plan(self.tile_width, self.tile_height)?,
        };

        Ok(CacheDescription {
            layer: self.layer,
            source: self.source,
            storage_root: self.storage_root,
            extension,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            padding: self.padding,
            source_content_type,
            cached_content_type,
            data_type,
            invalid_value: self.invalid_value,
            default_value,
            grid,
        })
    }
}

fn normalize_extension(extension: &str) -> Result<String, DescriptionError> {
    let bare = extension.trim().trim_start_matches('.');
    if bare.is_empty() {
        return Err(DescriptionError::EmptyExtension);
    }
    Ok(format!(".{}", bare))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s16_builder() -> CacheDescriptionBuilder {
        CacheDescription::builder("/tmp/cache")
            .with_data_type(DataType::S16)
            .with_default_value(Value::S16(0))
    }

    #[test]
    fn test_defaults_plan_full_grid() {
        let desc = s16_builder().build().unwrap();
        assert_eq!(desc.extension(), ".cem");
        assert_eq!(desc.grid().tiles_x(), 512);
        assert_eq!(desc.grid().tiles_y(), 256);
        assert_eq!(desc.source_content_type(), ContentType::Raw(DataType::S16));
        assert_eq!(desc.source().base_url(), "http://localhost:8282/");
        assert_eq!(desc.fill_value(), Value::S16(0));
    }

    #[test]
    fn test_data_type_required() {
        let err = CacheDescription::builder("/tmp/cache")
            .with_default_value(Value::S16(0))
            .build()
            .unwrap_err();
        assert_eq!(err, DescriptionError::MissingDataType);
    }

    #[test]
    fn test_default_value_required() {
        let err = CacheDescription::builder("/tmp/cache")
            .with_data_type(DataType::S16)
            .build()
            .unwrap_err();
        assert_eq!(err, DescriptionError::MissingDefaultValue);
    }

    #[test]
    fn test_sentinel_types_must_match() {
        let err = s16_builder()
            .with_invalid_value(Some(Value::S32(-9999)))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptionError::InvalidValueType { .. }));

        let err = s16_builder()
            .with_default_value(Value::U16(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptionError::DefaultValueType { .. }));
    }

    #[test]
    fn test_fill_prefers_invalid_value() {
        let desc = s16_builder()
            .with_invalid_value(Some(Value::S16(-9999)))
            .build()
            .unwrap();
        assert_eq!(desc.fill_value(), Value::S16(-9999));
    }

    #[test]
    fn test_content_type_checks() {
        let err = s16_builder()
            .with_source_content_type(ContentType::Elevation)
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptionError::SourceContentType { .. }));

        let err = CacheDescription::builder("/tmp/cache")
            .with_data_type(DataType::F32)
            .with_default_value(Value::F32(0.0))
            .with_cached_content_type(ContentType::Elevation)
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptionError::CachedContentType { .. }));
    }

    #[test]
    fn test_extension_normalized() {
        let desc = s16_builder().with_extension("bin").build().unwrap();
        assert_eq!(desc.extension(), ".bin");
        assert_eq!(
            s16_builder().with_extension(".").build().unwrap_err(),
            DescriptionError::EmptyExtension
        );
    }

    #[test]
    fn test_uneven_tile_size_rejected() {
        let err = s16_builder().with_tile_size(3000, 2048).build().unwrap_err();
        assert!(matches!(
            err,
            DescriptionError::Grid(GridError::UnevenTiling { .. })
        ));
    }

    #[test]
    fn test_explicit_grid() {
        let grid = GridPlan::from_tile_counts(4, 2).unwrap();
        let desc = s16_builder()
            .with_tile_size(2, 2)
            .with_grid(grid)
            .build()
            .unwrap();
        assert_eq!(desc.grid().num_levels(), 2);
        assert_eq!(desc.tile_shape().byte_len(), 8);
    }
}
