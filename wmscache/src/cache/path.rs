//! Cache path construction.
//!
//! Every tile lives at
//! ```text
//! <root>/<level>/<y>/<x><ext>
//! ```
//! with each integer left-padded with zeros to the digit width the grid
//! plan assigns to its axis.

use super::description::CacheDescription;
use super::types::TileCoord;
use std::path::PathBuf;

/// Left-pad `value` with zeros to at least `digits` characters.
///
/// # Example
///
/// ```
/// use wmscache::cache::zero_pad;
///
/// assert_eq!(zero_pad(7, 3), "007");
/// assert_eq!(zero_pad(1234, 2), "1234");
/// assert_eq!(zero_pad(0, 0), "0");
/// ```
pub fn zero_pad(value: u32, digits: u32) -> String {
    format!("{:0width$}", value, width = digits as usize)
}

/// Directory holding every row of `level`.
pub fn level_directory(desc: &CacheDescription, level: u32) -> PathBuf {
    desc.storage_root()
        .join(zero_pad(level, desc.grid().level_digits()))
}

/// Directory holding every tile of row `y` on `level`.
pub fn row_directory(desc: &CacheDescription, level: u32, y: u32) -> PathBuf {
    level_directory(desc, level).join(zero_pad(y, desc.grid().y_digits()))
}

/// Full path of a tile artifact.
pub fn tile_path(desc: &CacheDescription, coord: TileCoord) -> PathBuf {
    row_directory(desc, coord.level, coord.y).join(format!(
        "{}{}",
        zero_pad(coord.x, desc.grid().x_digits()),
        desc.extension()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{DataType, Value};
    use std::path::Path;

    fn full_grid() -> CacheDescription {
        CacheDescription::builder("/cache")
            .with_data_type(DataType::S16)
            .with_default_value(Value::S16(0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_tile_path_layout() {
        let desc = full_grid();
        assert_eq!(
            tile_path(&desc, TileCoord::new(8, 12, 3)),
            Path::new("/cache/8/003/012.cem")
        );
        assert_eq!(
            tile_path(&desc, TileCoord::new(0, 0, 0)),
            Path::new("/cache/0/000/000.cem")
        );
    }

    #[test]
    fn test_row_and_level_directories() {
        let desc = full_grid();
        assert_eq!(row_directory(&desc, 5, 42), Path::new("/cache/5/042"));
        assert_eq!(level_directory(&desc, 5), Path::new("/cache/5"));
    }

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad(5, 1), "5");
        assert_eq!(zero_pad(5, 4), "0005");
        assert_eq!(zero_pad(511, 3), "511");
    }
}
