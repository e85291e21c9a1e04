//! Pyramid grid planning
//!
//! Derives tile counts, level count and path digit widths from the global
//! source pixel density and the configured tile size.

mod types;


pub use types::{
    GridError, GridPlan, DEFAULT_PIXELS_PER_DEGREE, LATITUDE_SPAN, LONGITUDE_SPAN,
};

/// Plans the full-resolution grid for a global equirectangular raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlanner {
    pixels_per_degree: u32,
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELS_PER_DEGREE)
    }
}

impl GridPlanner {
    /// Creates a planner for a source with the given pixel density.
    pub fn new(pixels_per_degree: u32) -> Self {
        Self { pixels_per_degree }
    }

    /// Target full-resolution extent `(x, y)` in pixels.
    ///
    /// Each global extent is rounded up to the next power of two and halved,
    /// so the target never exceeds the source resolution.
    pub fn target_extent(&self) -> (u64, u64) {
        let ppd = self.pixels_per_degree as u64;
        let source_x = LONGITUDE_SPAN as u64 * ppd;
        let source_y = LATITUDE_SPAN as u64 * ppd;
        (
            source_x.next_power_of_two() / 2,
            source_y.next_power_of_two() / 2,
        )
    }

    /// Plans the grid for the given tile size.
    ///
    /// A tile dimension that does not divide the target extent is rejected
    /// rather than truncated or rounded.
    pub fn plan(&self, tile_width: u32, tile_height: u32) -> Result<GridPlan, GridError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(GridError::ZeroTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        if self.pixels_per_degree == 0 {
            return Err(GridError::ZeroDensity);
        }

        let (extent_x, extent_y) = self.target_extent();
        let tiles_x = tiles_along("x", extent_x, tile_width)?;
        let tiles_y = tiles_along("y", extent_y, tile_height)?;

        GridPlan::from_tile_counts(tiles_x, tiles_y)
    }
}

fn tiles_along(axis: &'static str, extent: u64, tile: u32) -> Result<u32, GridError> {
    if extent % tile as u64 != 0 {
        return Err(GridError::UnevenTiling { axis, extent, tile });
    }
    let count = extent / tile as u64;
    u32::try_from(count).map_err(|_| GridError::InvalidTileCount { axis, count })
}
