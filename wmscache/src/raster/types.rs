//! Element data types and typed scalar values.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raster-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    /// Byte buffer length does not match `width * height * element size`
    #[error("buffer of {actual} bytes does not match {width}x{height} {data_type} ({expected} bytes)")]
    LengthMismatch {
        width: u32,
        height: u32,
        data_type: DataType,
        expected: usize,
        actual: usize,
    },

    /// Two rasters or a raster and a value disagree on the element type
    #[error("data type mismatch: expected {expected}, got {actual}")]
    DataTypeMismatch {
        expected: DataType,
        actual: DataType,
    },

    /// A sub-image does not fit at the requested offset
    #[error("{src_width}x{src_height} raster does not fit at ({x}, {y}) in {width}x{height}")]
    OutOfBounds {
        src_width: u32,
        src_height: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Unknown data type name
    #[error("unknown data type '{0}' (expected one of: u8, s16, u16, s32, f32)")]
    UnknownDataType(String),

    /// A literal could not be parsed as the given data type
    #[error("'{literal}' is not a valid {data_type} value")]
    InvalidLiteral { literal: String, data_type: DataType },
}

/// Element type of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 16-bit integer
    S16,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 32-bit integer
    S32,
    /// 32-bit IEEE float
    F32,
}

impl DataType {
    /// All supported data types.
    pub const ALL: [DataType; 5] = [
        DataType::U8,
        DataType::S16,
        DataType::U16,
        DataType::S32,
        DataType::F32,
    ];

    /// Size of one element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DataType::U8 => 1,
            DataType::S16 | DataType::U16 => 2,
            DataType::S32 | DataType::F32 => 4,
        }
    }

    /// Short lowercase name used in configuration and content types.
    pub fn name(self) -> &'static str {
        match self {
            DataType::U8 => "u8",
            DataType::S16 => "s16",
            DataType::U16 => "u16",
            DataType::S32 => "s32",
            DataType::F32 => "f32",
        }
    }

    /// Whether the type holds integers.
    pub fn is_integer(self) -> bool {
        !matches!(self, DataType::F32)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        DataType::ALL
            .into_iter()
            .find(|dt| dt.name() == s)
            .ok_or(RasterError::UnknownDataType(s))
    }
}

/// A scalar tagged with its data type.
///
/// Used for the invalid sentinel and the default fill value so both can be
/// checked against the configured element type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    S16(i16),
    U16(u16),
    S32(i32),
    F32(f32),
}

impl Value {
    /// The data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::U8(_) => DataType::U8,
            Value::S16(_) => DataType::S16,
            Value::U16(_) => DataType::U16,
            Value::S32(_) => DataType::S32,
            Value::F32(_) => DataType::F32,
        }
    }

    /// Parses a literal as a value of the given type.
    pub fn parse(data_type: DataType, literal: &str) -> Result<Self, RasterError> {
        let trimmed = literal.trim();
        let invalid = || RasterError::InvalidLiteral {
            literal: literal.to_string(),
            data_type,
        };
        Ok(match data_type {
            DataType::U8 => Value::U8(trimmed.parse().map_err(|_| invalid())?),
            DataType::S16 => Value::S16(trimmed.parse().map_err(|_| invalid())?),
            DataType::U16 => Value::U16(trimmed.parse().map_err(|_| invalid())?),
            DataType::S32 => Value::S32(trimmed.parse().map_err(|_| invalid())?),
            DataType::F32 => Value::F32(trimmed.parse().map_err(|_| invalid())?),
        })
    }

    /// Little-endian byte encoding of the value.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Value::U8(v) => v.to_le_bytes().to_vec(),
            Value::S16(v) => v.to_le_bytes().to_vec(),
            Value::U16(v) => v.to_le_bytes().to_vec(),
            Value::S32(v) => v.to_le_bytes().to_vec(),
            Value::F32(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// Decodes one little-endian element. `bytes` must hold at least one element.
    pub(crate) fn from_le_slice(data_type: DataType, bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        let size = data_type.size_bytes();
        buf[..size].copy_from_slice(&bytes[..size]);
        match data_type {
            DataType::U8 => Value::U8(buf[0]),
            DataType::S16 => Value::S16(i16::from_le_bytes([buf[0], buf[1]])),
            DataType::U16 => Value::U16(u16::from_le_bytes([buf[0], buf[1]])),
            DataType::S32 => Value::S32(i32::from_le_bytes(buf)),
            DataType::F32 => Value::F32(f32::from_le_bytes(buf)),
        }
    }

    /// The value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::U8(v) => v as f64,
            Value::S16(v) => v as f64,
            Value::U16(v) => v as f64,
            Value::S32(v) => v as f64,
            Value::F32(v) => v as f64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{}", v),
            Value::S16(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::S32(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
        }
    }
}

/// Dimensions and element type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileShape {
    pub width: u32,
    pub height: u32,
    pub data_type: DataType,
}

impl TileShape {
    /// Creates a tile shape.
    pub fn new(width: u32, height: u32, data_type: DataType) -> Self {
        Self {
            width,
            height,
            data_type,
        }
    }

    /// Raw byte length of a tile of this shape.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.data_type.size_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_str() {
        assert_eq!("s16".parse::<DataType>(), Ok(DataType::S16));
        assert_eq!(" F32 ".parse::<DataType>(), Ok(DataType::F32));
        assert_eq!(
            "i16".parse::<DataType>(),
            Err(RasterError::UnknownDataType("i16".to_string()))
        );
    }

    #[test]
    fn test_value_parse_respects_range() {
        assert_eq!(Value::parse(DataType::S16, "-9999"), Ok(Value::S16(-9999)));
        assert_eq!(Value::parse(DataType::U8, "255"), Ok(Value::U8(255)));
        assert!(Value::parse(DataType::U8, "256").is_err());
        assert!(Value::parse(DataType::U16, "-1").is_err());
        assert!(Value::parse(DataType::S32, "1.5").is_err());
    }

    #[test]
    fn test_value_le_bytes() {
        let value = Value::S16(-2);
        let bytes = value.to_le_bytes();
        assert_eq!(bytes, vec![0xFE, 0xFF]);
        assert_eq!(Value::from_le_slice(DataType::S16, &bytes), value);
    }

    #[test]
    fn test_tile_shape_byte_len() {
        assert_eq!(TileShape::new(2048, 2048, DataType::S16).byte_len(), 8 * 1024 * 1024);
        assert_eq!(TileShape::new(3, 2, DataType::F32).byte_len(), 24);
    }
}
