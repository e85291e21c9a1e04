//! On-disk tile pyramid.
//!
//! Provides the validated cache description, deterministic tile paths, the
//! per-level status index built from a directory scan, and tile persistence
//! through a codec.

mod description;
mod path;
mod status;
mod store;
mod types;

pub use description::{
    CacheDescription, CacheDescriptionBuilder, DescriptionError, LayerInfo, SourceEndpoint,
    TilePadding,
};
pub use status::{FileStatusIndex, FinestLevelReady, LevelStatus, StatusCounts};
pub use store::{StoreError, TileStore};
pub use types::{CacheError, TileCoord, TileStatus};

// Re-export path utilities for convenience
pub use path::{level_directory, row_directory, tile_path, zero_pad};
