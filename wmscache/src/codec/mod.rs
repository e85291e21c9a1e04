//! Tile content codecs.
//!
//! A [`TileCodec`] turns a raw [`Raster`] into the bytes written to disk for a
//! given [`ContentType`] and back. Failure on either side means the buffer
//! must not be used.
//!
//! # Example
//!
//! ```
//! use wmscache::codec::{ContentType, StandardCodec, TileCodec};
//! use wmscache::raster::{Raster, Value};
//!
//! let codec = StandardCodec;
//! let tile = Raster::filled(4, 4, Value::S16(120));
//! let bytes = codec.encode(&tile, ContentType::Elevation).unwrap();
//! let decoded = codec.decode(&bytes, ContentType::Elevation, tile.shape()).unwrap();
//! assert_eq!(decoded, tile);
//! ```

mod elevation;
mod raw;

use crate::raster::{DataType, Raster, RasterError, TileShape};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Raster element type does not match the content type
    #[error("content type {content_type} cannot hold {data_type} elements")]
    DataTypeMismatch {
        content_type: ContentType,
        data_type: DataType,
    },

    /// The content type does not support this element type at all
    #[error("{content_type} does not support {data_type} elements")]
    UnsupportedDataType {
        content_type: ContentType,
        data_type: DataType,
    },

    /// Stored bytes are malformed
    #[error("corrupt {content_type} payload: {reason}")]
    Corrupt {
        content_type: ContentType,
        reason: String,
    },

    /// Decoded buffer is inconsistent with its shape
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Content representation of a tile, either on the wire or on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Uncompressed little-endian elements of the given type
    Raw(DataType),
    /// Delta + zigzag varint compressed integer elevation
    Elevation,
}

impl ContentType {
    /// Identifier used in the WMS `FORMAT` parameter and configuration.
    pub fn id(&self) -> String {
        match self {
            ContentType::Raw(data_type) => format!("image/raw-{}", data_type.name()),
            ContentType::Elevation => "image/elevation".to_string(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "image/elevation" {
            return Ok(ContentType::Elevation);
        }
        s.strip_prefix("image/raw-")
            .and_then(|name| name.parse::<DataType>().ok())
            .map(ContentType::Raw)
            .ok_or_else(|| {
                format!(
                    "unknown content type '{}' (expected image/raw-<type> or image/elevation)",
                    s
                )
            })
    }
}

/// Encodes rasters for storage and decodes them back.
///
/// Implementations must be thread-safe; the fetcher encodes tiles from
/// several workers at once.
pub trait TileCodec: Send + Sync {
    /// Encodes `raster` into the `content_type` representation.
    fn encode(&self, raster: &Raster, content_type: ContentType) -> Result<Vec<u8>, CodecError>;

    /// Decodes stored bytes back into a raster of the expected shape.
    fn decode(
        &self,
        bytes: &[u8],
        content_type: ContentType,
        shape: TileShape,
    ) -> Result<Raster, CodecError>;

    /// Human-readable codec name.
    fn name(&self) -> &str;
}

impl<T: TileCodec + ?Sized> TileCodec for Arc<T> {
    fn encode(&self, raster: &Raster, content_type: ContentType) -> Result<Vec<u8>, CodecError> {
        (**self).encode(raster, content_type)
    }

    fn decode(
        &self,
        bytes: &[u8],
        content_type: ContentType,
        shape: TileShape,
    ) -> Result<Raster, CodecError> {
        (**self).decode(bytes, content_type, shape)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Codec covering every built-in [`ContentType`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCodec;

impl TileCodec for StandardCodec {
    fn encode(&self, raster: &Raster, content_type: ContentType) -> Result<Vec<u8>, CodecError> {
        match content_type {
            ContentType::Raw(data_type) => raw::encode(raster, data_type),
            ContentType::Elevation => elevation::encode(raster),
        }
    }

    fn decode(
        &self,
        bytes: &[u8],
        content_type: ContentType,
        shape: TileShape,
    ) -> Result<Raster, CodecError> {
        match content_type {
            ContentType::Raw(data_type) => raw::decode(bytes, data_type, shape),
            ContentType::Elevation => elevation::decode(bytes, shape),
        }
    }

    fn name(&self) -> &str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Value;

    #[test]
    fn test_content_type_ids() {
        assert_eq!(ContentType::Raw(DataType::S16).id(), "image/raw-s16");
        assert_eq!(ContentType::Elevation.id(), "image/elevation");
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!(
            "image/raw-f32".parse::<ContentType>(),
            Ok(ContentType::Raw(DataType::F32))
        );
        assert_eq!(
            " Image/Elevation ".parse::<ContentType>(),
            Ok(ContentType::Elevation)
        );
        assert!("image/png".parse::<ContentType>().is_err());
        assert!("image/raw-s64".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_standard_codec_dispatches_by_content_type() {
        let codec = StandardCodec;
        let tile = Raster::filled(8, 8, Value::S16(1500));

        let raw = codec.encode(&tile, ContentType::Raw(DataType::S16)).unwrap();
        let compressed = codec.encode(&tile, ContentType::Elevation).unwrap();

        assert_eq!(raw.len(), 128);
        assert!(compressed.len() < raw.len());
    }

    #[test]
    fn test_arc_codec_delegates() {
        let codec: Arc<dyn TileCodec> = Arc::new(StandardCodec);
        assert_eq!(codec.name(), "standard");
        let tile = Raster::filled(2, 2, Value::U8(9));
        let bytes = codec.encode(&tile, ContentType::Raw(DataType::U8)).unwrap();
        assert_eq!(bytes, vec![9, 9, 9, 9]);
    }
}
