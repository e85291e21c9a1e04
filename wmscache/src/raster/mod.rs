//! Raw raster buffers and element types.
//!
//! Tiles travel between the fetcher, the mip builder and the codec as
//! [`Raster`] values: `width × height` little-endian elements of one
//! [`DataType`]. The invalid sentinel and default fill are carried as typed
//! [`Value`]s so they can be checked against the element type.

mod buffer;
mod filter;
mod sample;
mod types;

pub use buffer::Raster;
pub use filter::downsample_box_2x;
pub use types::{DataType, RasterError, TileShape, Value};
