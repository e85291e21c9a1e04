//! Tile persistence.
//!
//! [`TileStore`] maps a [`TileCoord`] to its artifact path and moves rasters
//! between memory and disk through a [`TileCodec`]. It never touches the
//! status index; callers mark cells only after a store succeeds.

use super::description::CacheDescription;
use super::path::tile_path;
use super::types::TileCoord;
use crate::codec::{CodecError, TileCodec};
use crate::raster::{Raster, TileShape};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Extension of a tile written but not yet renamed into place.
pub(crate) const TEMP_EXTENSION: &str = "tmp";

/// Errors reading or writing a tile artifact.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode tile {coord}: {source}")]
    Encode {
        coord: TileCoord,
        #[source]
        source: CodecError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode tile {coord}: {source}")]
    Decode {
        coord: TileCoord,
        #[source]
        source: CodecError,
    },

    #[error("Tile {coord} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        coord: TileCoord,
        expected: TileShape,
        actual: TileShape,
    },
}

/// Reads and writes single tiles under the cache root.
#[derive(Clone)]
pub struct TileStore {
    desc: Arc<CacheDescription>,
    codec: Arc<dyn TileCodec>,
}

impl std::fmt::Debug for TileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStore")
            .field("root", &self.desc.storage_root())
            .field("codec", &self.codec.name())
            .finish()
    }
}

impl TileStore {
    pub fn new(desc: Arc<CacheDescription>, codec: Arc<dyn TileCodec>) -> Self {
        Self { desc, codec }
    }

    pub fn description(&self) -> &CacheDescription {
        &self.desc
    }

    pub fn tile_path(&self, coord: TileCoord) -> PathBuf {
        tile_path(&self.desc, coord)
    }

    /// Encode `tile` and write it for `coord`.
    ///
    /// Returns the number of bytes written.
    pub fn store(&self, tile: &Raster, coord: TileCoord) -> Result<u64, StoreError> {
        let expected = self.desc.tile_shape();
        if tile.shape() != expected {
            return Err(StoreError::ShapeMismatch {
                coord,
                expected,
                actual: tile.shape(),
            });
        }

        let path = self.prepare(coord)?;
        let bytes = self
            .codec
            .encode(tile, self.desc.cached_content_type())
            .map_err(|source| StoreError::Encode { coord, source })?;
        write_atomic(&path, &bytes)?;

        trace!(tile = %coord, bytes = bytes.len(), "Tile stored");
        Ok(bytes.len() as u64)
    }

    /// Write the zero-length marker for a tile without valid data.
    pub fn store_empty(&self, coord: TileCoord) -> Result<(), StoreError> {
        let path = self.prepare(coord)?;
        write_atomic(&path, &[])?;
        trace!(tile = %coord, "Empty tile stored");
        Ok(())
    }

    /// Read and decode the tile at `coord`.
    ///
    /// An Empty marker yields a tile filled with the sentinel, or the
    /// default value when no sentinel is configured.
    pub fn load(&self, coord: TileCoord) -> Result<Raster, StoreError> {
        let path = self.tile_path(coord);
        let bytes = fs::read(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;

        let shape = self.desc.tile_shape();
        if bytes.is_empty() {
            return Ok(Raster::filled(
                shape.width,
                shape.height,
                self.desc.fill_value(),
            ));
        }

        let tile = self
            .codec
            .decode(&bytes, self.desc.cached_content_type(), shape)
            .map_err(|source| StoreError::Decode { coord, source })?;
        if tile.shape() != shape {
            return Err(StoreError::ShapeMismatch {
                coord,
                expected: shape,
                actual: tile.shape(),
            });
        }
        Ok(tile)
    }

    fn prepare(&self, coord: TileCoord) -> Result<PathBuf, StoreError> {
        let path = self.tile_path(coord);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StoreError::CreateDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(path)
    }
}

/// Write via a temp file and rename so scans never see a partial tile.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let temp_path = path.with_extension(TEMP_EXTENSION);
    let write_error = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&temp_path, bytes).map_err(write_error)?;
    fs::rename(&temp_path, path).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StandardCodec;
    use crate::raster::Value;
    use crate::test_support::small_description;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir, invalid: Option<Value>) -> TileStore {
        let desc = small_description(temp.path(), invalid);
        TileStore::new(Arc::new(desc), Arc::new(StandardCodec))
    }

    #[test]
    fn test_store_then_load_returns_original() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, Some(Value::S16(-9999)));
        let coord = TileCoord::new(1, 3, 1);
        let values = [1, -9999, 300, 4].map(Value::S16);
        let tile = Raster::from_values(2, 2, &values).unwrap();

        let written = store.store(&tile, coord).unwrap();

        assert!(written > 0);
        assert_eq!(fs::metadata(store.tile_path(coord)).unwrap().len(), written);
        assert_eq!(store.load(coord).unwrap(), tile);
    }

    #[test]
    fn test_no_temp_files_remain() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, None);
        let coord = TileCoord::new(1, 0, 0);
        store
            .store(&Raster::filled(2, 2, Value::S16(7)), coord)
            .unwrap();

        let row = store.tile_path(coord).parent().unwrap().to_path_buf();
        let temps: Vec<_> = fs::read_dir(row)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == TEMP_EXTENSION))
            .collect();
        assert!(temps.is_empty(), "Temp files should not remain");
    }

    #[test]
    fn test_empty_marker_loads_as_sentinel() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, Some(Value::S16(-9999)));
        let coord = TileCoord::new(0, 1, 0);

        store.store_empty(coord).unwrap();

        assert_eq!(fs::metadata(store.tile_path(coord)).unwrap().len(), 0);
        let tile = store.load(coord).unwrap();
        assert!(tile.is_uniform(Value::S16(-9999)));
    }

    #[test]
    fn test_empty_marker_without_sentinel_loads_default() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, None);
        let coord = TileCoord::new(0, 0, 0);

        store.store_empty(coord).unwrap();

        assert!(store.load(coord).unwrap().is_uniform(Value::S16(0)));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, None);
        let coord = TileCoord::new(1, 0, 0);

        let err = store
            .store(&Raster::filled(4, 4, Value::S16(1)), coord)
            .unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { .. }));

        let err = store
            .store(&Raster::filled(2, 2, Value::U16(1)), coord)
            .unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { .. }));
        assert!(!store.tile_path(coord).exists());
    }

    #[test]
    fn test_missing_and_corrupt_files_fail_to_load() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, None);
        let coord = TileCoord::new(1, 2, 1);

        assert!(matches!(
            store.load(coord).unwrap_err(),
            StoreError::Read { .. }
        ));

        let path = store.tile_path(coord);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"garbage").unwrap();
        assert!(matches!(
            store.load(coord).unwrap_err(),
            StoreError::Decode { .. }
        ));
    }

    #[test]
    fn test_unwritable_root_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let desc = small_description(&blocker, None);
        let store = TileStore::new(Arc::new(desc), Arc::new(StandardCodec));

        let err = store.store_empty(TileCoord::new(0, 0, 0)).unwrap_err();
        assert!(matches!(err, StoreError::CreateDirectory { .. }));
    }
}
