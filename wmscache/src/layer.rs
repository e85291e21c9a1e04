//! Read-only tile access for the serving side.

use crate::cache::{CacheError, FileStatusIndex, TileCoord, TileStatus, TileStore};
use crate::raster::{DataType, Raster};
use std::sync::Arc;

/// Result of a tile lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum TileLookup {
    /// The tile is stored; Empty tiles come back filled with the sentinel
    /// or default value.
    Ready(Raster),
    /// The tile has not been produced yet.
    Pending,
}

/// Layer backed by the tile cache.
#[derive(Debug, Clone)]
pub struct TileCacheLayer {
    store: TileStore,
    index: Arc<FileStatusIndex>,
}

impl TileCacheLayer {
    pub fn new(store: TileStore, index: Arc<FileStatusIndex>) -> Self {
        Self { store, index }
    }

    pub fn id(&self) -> &str {
        &self.store.description().layer().id
    }

    pub fn title(&self) -> &str {
        &self.store.description().layer().title
    }

    pub fn abstract_text(&self) -> &str {
        &self.store.description().layer().abstract_text
    }

    pub fn tile_width(&self) -> u32 {
        self.store.description().tile_width()
    }

    pub fn tile_height(&self) -> u32 {
        self.store.description().tile_height()
    }

    pub fn num_levels(&self) -> u32 {
        self.index.num_levels()
    }

    /// Element types tiles can be served as.
    pub fn supported_data_types(&self) -> Vec<DataType> {
        vec![self.store.description().data_type()]
    }

    /// Only tiles that reached Exists or Empty are ever read.
    pub fn lookup(&self, coord: TileCoord) -> Result<TileLookup, CacheError> {
        match self.index.status(coord) {
            None => Err(CacheError::OutOfBounds(coord)),
            Some(TileStatus::Missing) => Ok(TileLookup::Pending),
            Some(TileStatus::Empty) => {
                let desc = self.store.description();
                Ok(TileLookup::Ready(Raster::filled(
                    desc.tile_width(),
                    desc.tile_height(),
                    desc.fill_value(),
                )))
            }
            Some(TileStatus::Exists) => Ok(TileLookup::Ready(self.store.load(coord)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StandardCodec;
    use crate::raster::Value;
    use crate::test_support::small_description;
    use tempfile::TempDir;

    fn layer(temp: &TempDir) -> TileCacheLayer {
        let desc = Arc::new(small_description(temp.path(), Some(Value::S16(-9999))));
        let index = Arc::new(FileStatusIndex::build(&desc).unwrap());
        TileCacheLayer::new(TileStore::new(desc, Arc::new(StandardCodec)), index)
    }

    #[test]
    fn test_layer_identity() {
        let temp = TempDir::new().unwrap();
        let layer = layer(&temp);
        assert_eq!(layer.id(), "tile-cache");
        assert_eq!(layer.title(), "Tile Cache");
        assert_eq!(layer.tile_width(), 2);
        assert_eq!(layer.num_levels(), 2);
        assert_eq!(layer.supported_data_types(), vec![DataType::S16]);
    }

    #[test]
    fn test_lookup_by_status() {
        let temp = TempDir::new().unwrap();
        let layer = layer(&temp);
        let stored = TileCoord::new(1, 0, 0);
        let empty = TileCoord::new(1, 1, 0);
        let tile = Raster::filled(2, 2, Value::S16(77));
        layer.store.store(&tile, stored).unwrap();
        layer.index.mark(stored, TileStatus::Exists);
        layer.store.store_empty(empty).unwrap();
        layer.index.mark(empty, TileStatus::Empty);

        assert_eq!(layer.lookup(stored).unwrap(), TileLookup::Ready(tile));
        match layer.lookup(empty).unwrap() {
            TileLookup::Ready(filled) => assert!(filled.is_uniform(Value::S16(-9999))),
            TileLookup::Pending => panic!("empty tile should be ready"),
        }
        assert_eq!(
            layer.lookup(TileCoord::new(1, 2, 1)).unwrap(),
            TileLookup::Pending
        );
        assert!(matches!(
            layer.lookup(TileCoord::new(1, 4, 0)),
            Err(CacheError::OutOfBounds(_))
        ));
    }
}
