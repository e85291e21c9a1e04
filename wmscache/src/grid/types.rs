//! Grid type definitions

use thiserror::Error;

/// Source pixel density of ASTER-class global elevation data.
pub const DEFAULT_PIXELS_PER_DEGREE: u32 = 3600;

/// Degrees of longitude covered by the global raster.
pub const LONGITUDE_SPAN: f64 = 360.0;

/// Degrees of latitude covered by the global raster.
pub const LATITUDE_SPAN: f64 = 180.0;

/// Errors raised while planning the pyramid grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Tile width or height configured as zero
    #[error("tile dimensions must be non-zero (got {width}x{height})")]
    ZeroTileSize { width: u32, height: u32 },

    /// Pixel density configured as zero
    #[error("pixels per degree must be non-zero")]
    ZeroDensity,

    /// The raster extent along an axis is not a multiple of the tile dimension
    #[error("{axis} extent of {extent} pixels is not divisible by tile dimension {tile}")]
    UnevenTiling {
        axis: &'static str,
        extent: u64,
        tile: u32,
    },

    /// A tile count is zero or not a power of two
    #[error("{axis} tile count {count} must be a non-zero power of two")]
    InvalidTileCount { axis: &'static str, count: u64 },
}

/// Geometry of the tile pyramid.
///
/// Level `num_levels - 1` is the finest (full resolution) level and level `0`
/// the coarsest. Every level halves the tile counts of the level above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPlan {
    tiles_x: u32,
    tiles_y: u32,
    num_levels: u32,
    x_digits: u32,
    y_digits: u32,
    level_digits: u32,
}

impl GridPlan {
    /// Builds a grid from full-resolution tile counts.
    ///
    /// Both counts must be non-zero powers of two so that every level's counts
    /// stay integral.
    pub fn from_tile_counts(tiles_x: u32, tiles_y: u32) -> Result<Self, GridError> {
        for (axis, count) in [("x", tiles_x), ("y", tiles_y)] {
            if count == 0 || !count.is_power_of_two() {
                return Err(GridError::InvalidTileCount {
                    axis,
                    count: count as u64,
                });
            }
        }

        let num_levels = tiles_x.trailing_zeros().min(tiles_y.trailing_zeros()) + 1;

        Ok(Self {
            tiles_x,
            tiles_y,
            num_levels,
            x_digits: decimal_digits(tiles_x as u64),
            y_digits: decimal_digits(tiles_y as u64),
            level_digits: decimal_digits(num_levels as u64),
        })
    }

    /// Tile count along x at full resolution.
    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    /// Tile count along y at full resolution.
    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    /// Number of pyramid levels.
    pub fn num_levels(&self) -> u32 {
        self.num_levels
    }

    /// Index of the full-resolution level.
    pub fn finest_level(&self) -> u32 {
        self.num_levels - 1
    }

    /// Zero-pad width for x path segments.
    pub fn x_digits(&self) -> u32 {
        self.x_digits
    }

    /// Zero-pad width for y path segments.
    pub fn y_digits(&self) -> u32 {
        self.y_digits
    }

    /// Zero-pad width for level path segments.
    pub fn level_digits(&self) -> u32 {
        self.level_digits
    }

    /// Tile counts `(x, y)` at the given level, or `None` past the finest level.
    pub fn level_tiles(&self, level: u32) -> Option<(u32, u32)> {
        if level >= self.num_levels {
            return None;
        }
        let shift = self.finest_level() - level;
        Some((self.tiles_x >> shift, self.tiles_y >> shift))
    }
}

/// Smallest `d` with `10^d >= count`, i.e. `ceil(log10(count))`.
pub(crate) fn decimal_digits(count: u64) -> u32 {
    let mut digits = 0;
    let mut bound = 1u64;
    while bound < count {
        bound = bound.saturating_mul(10);
        digits += 1;
    }
    digits
}
