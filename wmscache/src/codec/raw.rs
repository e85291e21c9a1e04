//! Uncompressed content: the raster bytes as they are.

use super::{CodecError, ContentType};
use crate::raster::{DataType, Raster, TileShape};

pub(super) fn encode(raster: &Raster, data_type: DataType) -> Result<Vec<u8>, CodecError> {
    if raster.data_type() != data_type {
        return Err(CodecError::DataTypeMismatch {
            content_type: ContentType::Raw(data_type),
            data_type: raster.data_type(),
        });
    }
    Ok(raster.as_bytes().to_vec())
}

pub(super) fn decode(
    bytes: &[u8],
    data_type: DataType,
    shape: TileShape,
) -> Result<Raster, CodecError> {
    if shape.data_type != data_type {
        return Err(CodecError::DataTypeMismatch {
            content_type: ContentType::Raw(data_type),
            data_type: shape.data_type,
        });
    }
    Ok(Raster::from_bytes(
        shape.width,
        shape.height,
        data_type,
        bytes.to_vec(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{RasterError, Value};

    #[test]
    fn test_roundtrip() {
        let tile = Raster::from_values(
            2,
            1,
            &[Value::F32(1.5), Value::F32(-0.25)],
        )
        .unwrap();
        let bytes = encode(&tile, DataType::F32).unwrap();
        assert_eq!(decode(&bytes, DataType::F32, tile.shape()).unwrap(), tile);
    }

    #[test]
    fn test_encode_rejects_other_type() {
        let tile = Raster::filled(2, 2, Value::U16(1));
        assert!(matches!(
            encode(&tile, DataType::S16),
            Err(CodecError::DataTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let shape = TileShape::new(2, 2, DataType::S16);
        let err = decode(&[0u8; 6], DataType::S16, shape).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Raster(RasterError::LengthMismatch { .. })
        ));
    }
}
