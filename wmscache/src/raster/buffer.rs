//! Raw raster buffers.

use super::types::{DataType, RasterError, TileShape, Value};

/// A `width × height` raster of little-endian elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data_type: DataType,
    data: Vec<u8>,
}

impl Raster {
    /// Creates a raster with every element set to `value`.
    pub fn filled(width: u32, height: u32, value: Value) -> Self {
        let pattern = value.to_le_bytes();
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            data_type: value.data_type(),
            data: pattern.repeat(count),
        }
    }

    /// Wraps raw little-endian bytes, checking the length.
    pub fn from_bytes(
        width: u32,
        height: u32,
        data_type: DataType,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        let expected = TileShape::new(width, height, data_type).byte_len();
        if data.len() != expected {
            return Err(RasterError::LengthMismatch {
                width,
                height,
                data_type,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data_type,
            data,
        })
    }

    /// Wraps bytes already known to match the shape.
    pub(super) fn from_parts(width: u32, height: u32, data_type: DataType, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            TileShape::new(width, height, data_type).byte_len()
        );
        Self {
            width,
            height,
            data_type,
            data,
        }
    }

    /// Builds a raster from typed values in row-major order.
    pub fn from_values(width: u32, height: u32, values: &[Value]) -> Result<Self, RasterError> {
        let data_type = values.first().map(Value::data_type).unwrap_or(DataType::U8);
        let mut data = Vec::with_capacity(values.len() * data_type.size_bytes());
        for value in values {
            if value.data_type() != data_type {
                return Err(RasterError::DataTypeMismatch {
                    expected: data_type,
                    actual: value.data_type(),
                });
            }
            data.extend_from_slice(&value.to_le_bytes());
        }
        Self::from_bytes(width, height, data_type, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Shape of this raster.
    pub fn shape(&self) -> TileShape {
        TileShape::new(self.width, self.height, self.data_type)
    }

    /// Raw little-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Element at `(x, y)`, or `None` when out of bounds.
    pub fn value_at(&self, x: u32, y: u32) -> Option<Value> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let size = self.data_type.size_bytes();
        let offset = (y as usize * self.width as usize + x as usize) * size;
        Some(Value::from_le_slice(
            self.data_type,
            &self.data[offset..offset + size],
        ))
    }

    /// Whether every element equals `value` bit for bit.
    ///
    /// An empty raster is never uniform.
    pub fn is_uniform(&self, value: Value) -> bool {
        if value.data_type() != self.data_type || self.data.is_empty() {
            return false;
        }
        let pattern = value.to_le_bytes();
        self.data
            .chunks_exact(pattern.len())
            .all(|element| element == pattern.as_slice())
    }

    /// Copies `src` into this raster with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, src: &Raster, x: u32, y: u32) -> Result<(), RasterError> {
        if src.data_type != self.data_type {
            return Err(RasterError::DataTypeMismatch {
                expected: self.data_type,
                actual: src.data_type,
            });
        }
        let fits_x = x.checked_add(src.width).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(src.height).is_some_and(|end| end <= self.height);
        if !fits_x || !fits_y {
            return Err(RasterError::OutOfBounds {
                src_width: src.width,
                src_height: src.height,
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let size = self.data_type.size_bytes();
        let row_bytes = src.width as usize * size;
        for row in 0..src.height as usize {
            let src_start = row * row_bytes;
            let dst_start = ((y as usize + row) * self.width as usize + x as usize) * size;
            self.data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src.data[src_start..src_start + row_bytes]);
        }
        Ok(())
    }

    /// Minimum and maximum element, skipping elements equal to `invalid`.
    ///
    /// Returns `None` when no valid element exists.
    pub fn value_range(&self, invalid: Option<Value>) -> Option<(f64, f64)> {
        let size = self.data_type.size_bytes();
        let invalid = invalid.map(|v| v.to_le_bytes());
        self.data
            .chunks_exact(size)
            .filter(|element| invalid.as_deref() != Some(*element))
            .map(|element| Value::from_le_slice(self.data_type, element).as_f64())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
