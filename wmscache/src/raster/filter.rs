//! Sentinel-aware 2× box-filter downsampling.

use super::buffer::Raster;
use super::sample::Sample;
use super::types::{DataType, Value};

/// Downsamples a raster by 2× using a box filter.
///
/// Each output pixel is the average of the 2×2 block of input pixels it
/// covers. When `invalid` is set, input pixels equal to it are left out of the
/// average; a block with no valid pixel produces `invalid`. Integer types are
/// rounded to nearest.
///
/// Odd trailing rows or columns are dropped.
pub fn downsample_box_2x(source: &Raster, invalid: Option<Value>) -> Raster {
    let invalid = invalid.filter(|v| v.data_type() == source.data_type());
    let data = match source.data_type() {
        DataType::U8 => downsample::<u8>(source, invalid),
        DataType::S16 => downsample::<i16>(source, invalid),
        DataType::U16 => downsample::<u16>(source, invalid),
        DataType::S32 => downsample::<i32>(source, invalid),
        DataType::F32 => downsample::<f32>(source, invalid),
    };

    let new_width = source.width() / 2;
    let new_height = source.height() / 2;
    Raster::from_parts(new_width, new_height, source.data_type(), data)
}

fn downsample<T: Sample>(source: &Raster, invalid: Option<Value>) -> Vec<u8> {
    let width = source.width() as usize;
    let new_width = width / 2;
    let new_height = source.height() as usize / 2;
    let bytes = source.as_bytes();
    let invalid_bytes = invalid.map(|v| v.to_le_bytes());

    let mut output = vec![0u8; new_width * new_height * T::SIZE];

    for y in 0..new_height {
        for x in 0..new_width {
            let mut sum = 0.0f64;
            let mut count = 0u32;

            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let offset = ((y * 2 + dy) * width + x * 2 + dx) * T::SIZE;
                let element = &bytes[offset..offset + T::SIZE];
                if invalid_bytes.as_deref() == Some(element) {
                    continue;
                }
                sum += T::read(element).to_f64();
                count += 1;
            }

            let out_offset = (y * new_width + x) * T::SIZE;
            let out = &mut output[out_offset..out_offset + T::SIZE];
            match (&invalid_bytes, count) {
                (Some(sentinel), 0) => out.copy_from_slice(sentinel),
                _ => T::from_f64(sum / count.max(1) as f64).write(out),
            }
        }
    }

    output
}
