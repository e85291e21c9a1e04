//! Compressed integer elevation content.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "WCEM" | version u8 | data type u8 | width u32 | height u32 | deltas...
//! ```
//!
//! Elements are visited in row-major order; each is stored as the zigzag
//! LEB128 varint of its difference from the previous element (the first
//! element is relative to zero). Smooth terrain produces mostly one-byte
//! deltas.

use super::{CodecError, ContentType};
use crate::raster::{DataType, Raster, TileShape, Value};

const MAGIC: &[u8; 4] = b"WCEM";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 14;

pub(super) fn encode(raster: &Raster) -> Result<Vec<u8>, CodecError> {
    let data_type = raster.data_type();
    let code = type_code(data_type)?;

    let size = data_type.size_bytes();
    let count = raster.width() as usize * raster.height() as usize;
    let mut out = Vec::with_capacity(HEADER_LEN + count);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.push(code);
    out.extend_from_slice(&raster.width().to_le_bytes());
    out.extend_from_slice(&raster.height().to_le_bytes());

    let mut previous = 0i64;
    for element in raster.as_bytes().chunks_exact(size) {
        let current = integer_of(Value::from_le_slice(data_type, element));
        write_varint(&mut out, zigzag(current - previous));
        previous = current;
    }

    Ok(out)
}

pub(super) fn decode(bytes: &[u8], shape: TileShape) -> Result<Raster, CodecError> {
    let code = type_code(shape.data_type)?;

    if bytes.len() < HEADER_LEN {
        return Err(corrupt("payload shorter than header"));
    }
    if &bytes[..4] != MAGIC {
        return Err(corrupt("bad magic"));
    }
    if bytes[4] != VERSION {
        return Err(corrupt(format!("unsupported version {}", bytes[4])));
    }
    if bytes[5] != code {
        return Err(corrupt(format!(
            "stored data type code {} does not match {}",
            bytes[5], shape.data_type
        )));
    }
    let width = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    let height = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);
    if width != shape.width || height != shape.height {
        return Err(corrupt(format!(
            "stored dimensions {}x{} do not match {}x{}",
            width, height, shape.width, shape.height
        )));
    }

    let mut cursor = &bytes[HEADER_LEN..];
    let mut data = Vec::with_capacity(shape.byte_len());
    let mut previous = 0i64;
    for _ in 0..(width as usize * height as usize) {
        let delta = unzigzag(read_varint(&mut cursor)?);
        let current = previous
            .checked_add(delta)
            .ok_or_else(|| corrupt("delta overflow"))?;
        data.extend_from_slice(&element_bytes(shape.data_type, current)?);
        previous = current;
    }
    if !cursor.is_empty() {
        return Err(corrupt(format!("{} trailing bytes", cursor.len())));
    }

    Ok(Raster::from_bytes(width, height, shape.data_type, data)?)
}

fn type_code(data_type: DataType) -> Result<u8, CodecError> {
    match data_type {
        DataType::U8 => Ok(1),
        DataType::S16 => Ok(2),
        DataType::U16 => Ok(3),
        DataType::S32 => Ok(4),
        DataType::F32 => Err(CodecError::UnsupportedDataType {
            content_type: ContentType::Elevation,
            data_type,
        }),
    }
}

fn integer_of(value: Value) -> i64 {
    match value {
        Value::U8(v) => v as i64,
        Value::S16(v) => v as i64,
        Value::U16(v) => v as i64,
        Value::S32(v) => v as i64,
        // Rejected by type_code before any element is read
        Value::F32(v) => v as i64,
    }
}

fn element_bytes(data_type: DataType, value: i64) -> Result<Vec<u8>, CodecError> {
    let out_of_range = || corrupt(format!("value {} out of range for {}", value, data_type));
    Ok(match data_type {
        DataType::U8 => u8::try_from(value).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        DataType::S16 => i16::try_from(value).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        DataType::U16 => u16::try_from(value).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        DataType::S32 => i32::try_from(value).map_err(|_| out_of_range())?.to_le_bytes().to_vec(),
        DataType::F32 => {
            return Err(CodecError::UnsupportedDataType {
                content_type: ContentType::Elevation,
                data_type,
            })
        }
    })
}

fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn write_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn read_varint(cursor: &mut &[u8]) -> Result<u64, CodecError> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let (&byte, rest) = cursor
            .split_first()
            .ok_or_else(|| corrupt("truncated varint"))?;
        *cursor = rest;
        if shift >= 64 {
            return Err(corrupt("varint too long"));
        }
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

fn corrupt(reason: impl Into<String>) -> CodecError {
    CodecError::Corrupt {
        content_type: ContentType::Elevation,
        reason: reason.into(),
    }
}
