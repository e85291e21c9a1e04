//! Coarse level synthesis.
//!
//! Each Missing tile on level `l` is built from its four children on level
//! `l + 1`: Exists children are copied into a double-size composite that
//! starts out filled with the sentinel (or the default value), which is
//! then box-filtered back down to one tile. Levels are processed from the
//! finest toward level 0, so every level reads only tiles produced before
//! it.

use crate::cache::{
    FileStatusIndex, FinestLevelReady, StoreError, TileCoord, TilePadding, TileStatus, TileStore,
};
use crate::raster::{downsample_box_2x, Raster, RasterError};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that stop the mip pass.
#[derive(Debug, Error)]
pub enum MipError {
    /// Padded tiles cannot be reduced yet
    #[error("cannot build mip levels for a cache with tile padding {0:?}")]
    PaddingUnsupported(TilePadding),

    #[error("failed to load child tile {coord}: {source}")]
    Load {
        coord: TileCoord,
        #[source]
        source: StoreError,
    },

    #[error("failed to store tile {coord}: {source}")]
    Store {
        coord: TileCoord,
        #[source]
        source: StoreError,
    },

    #[error("failed to compose children of tile {coord}: {source}")]
    Compose {
        coord: TileCoord,
        #[source]
        source: RasterError,
    },
}

/// Counts from one mip pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MipReport {
    /// Tiles stored with data
    pub written: u64,
    /// Tiles stored as Empty markers
    pub empty: u64,
    /// Levels fully processed
    pub levels_completed: u32,
    /// The pass stopped early on cancellation
    pub cancelled: bool,
}

/// Builds every coarser level from the finest one.
#[derive(Debug, Clone)]
pub struct MipPyramidBuilder {
    store: TileStore,
    index: Arc<FileStatusIndex>,
}

impl MipPyramidBuilder {
    pub fn new(store: TileStore, index: Arc<FileStatusIndex>) -> Self {
        Self { store, index }
    }

    /// Synthesize all Missing tiles below the finest level.
    ///
    /// Runs synchronously; call it from a blocking context. The first load
    /// or store failure ends the pass and is returned, leaving tiles written
    /// so far in place.
    pub fn build(
        &self,
        _ready: FinestLevelReady,
        cancel: &CancellationToken,
    ) -> Result<MipReport, MipError> {
        let desc = self.store.description();
        let padding = desc.padding();
        if !padding.is_zero() {
            error!(?padding, "Cannot create mip levels for a padded tile cache");
            return Err(MipError::PaddingUnsupported(padding));
        }

        let mut report = MipReport::default();
        let finest = desc.grid().finest_level();

        for level in (0..finest).rev() {
            let Some(status) = self.index.level(level) else {
                continue;
            };
            info!(
                level,
                missing = status.counts().missing,
                "Building mip level"
            );

            for y in 0..status.tiles_y() {
                for x in 0..status.tiles_x() {
                    if cancel.is_cancelled() {
                        info!(level, "Mip construction cancelled");
                        report.cancelled = true;
                        return Ok(report);
                    }
                    if status.get(x, y) != Some(TileStatus::Missing) {
                        continue;
                    }

                    let coord = TileCoord::new(level, x, y);
                    match self.reduce_tile(coord) {
                        Ok(TileStatus::Empty) => report.empty += 1,
                        Ok(_) => report.written += 1,
                        Err(e) => {
                            error!(
                                level = coord.level,
                                x = coord.x,
                                y = coord.y,
                                error = %e,
                                "Mip construction aborted"
                            );
                            return Err(e);
                        }
                    }
                }
                debug!(level, row = y, "Mip row complete");
            }

            report.levels_completed += 1;
        }

        info!(
            written = report.written,
            empty = report.empty,
            levels = report.levels_completed,
            "Mip construction finished"
        );
        Ok(report)
    }

    /// Build, store and mark one tile from its children.
    fn reduce_tile(&self, coord: TileCoord) -> Result<TileStatus, MipError> {
        let desc = self.store.description();
        let (width, height) = (desc.tile_width(), desc.tile_height());
        let mut composite = Raster::filled(2 * width, 2 * height, desc.fill_value());

        for sy in 0..2 {
            for sx in 0..2 {
                let child = coord.child(sx, sy);
                match self.index.status(child) {
                    Some(TileStatus::Exists) => {
                        let tile = self
                            .store
                            .load(child)
                            .map_err(|source| MipError::Load {
                                coord: child,
                                source,
                            })?;
                        composite
                            .blit(&tile, sx * width, sy * height)
                            .map_err(|source| MipError::Compose { coord, source })?;
                    }
                    Some(TileStatus::Empty) => {}
                    _ => warn!(
                        level = child.level,
                        x = child.x,
                        y = child.y,
                        "Child tile missing during mip construction"
                    ),
                }
            }
        }

        let reduced = downsample_box_2x(&composite, desc.invalid_value());

        let status = match desc.invalid_value() {
            Some(invalid) if reduced.is_uniform(invalid) => {
                self.store
                    .store_empty(coord)
                    .map_err(|source| MipError::Store { coord, source })?;
                TileStatus::Empty
            }
            _ => {
                self.store
                    .store(&reduced, coord)
                    .map_err(|source| MipError::Store { coord, source })?;
                TileStatus::Exists
            }
        };

        self.index.mark(coord, status);
        Ok(status)
    }
}
