//! Core types for the tile cache.

use super::description::DescriptionError;
use super::store::StoreError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Tile address within the pyramid.
///
/// Level 0 is the coarsest level; `x` grows eastward and `y` southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Pyramid level
    pub level: u32,
    /// Column index
    pub x: u32,
    /// Row index
    pub y: u32,
}

impl TileCoord {
    /// Create a new tile coordinate.
    pub fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    /// The `(sx, sy)` child of this tile on the next finer level.
    pub fn child(&self, sx: u32, sy: u32) -> TileCoord {
        TileCoord {
            level: self.level + 1,
            x: 2 * self.x + sx,
            y: 2 * self.y + sy,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.level, self.x, self.y)
    }
}

/// Storage state of one tile.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileStatus {
    /// No artifact on disk; the tile must be produced
    #[default]
    Missing = 0,
    /// Zero-length marker: the tile is known to hold no valid data
    Empty = 1,
    /// Encoded tile data is on disk
    Exists = 2,
}

impl TileStatus {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => TileStatus::Empty,
            2 => TileStatus::Exists,
            _ => TileStatus::Missing,
        }
    }
}

impl fmt::Display for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileStatus::Missing => write!(f, "missing"),
            TileStatus::Empty => write!(f, "empty"),
            TileStatus::Exists => write!(f, "exists"),
        }
    }
}

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The storage root could not be created
    #[error("Failed to create cache root {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory of the storage tree could not be read
    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache description is inconsistent
    #[error("Invalid cache description: {0}")]
    InvalidDescription(#[from] DescriptionError),

    /// The coordinate lies outside the pyramid
    #[error("Tile {0} is outside the cache grid")]
    OutOfBounds(TileCoord),

    /// Reading or writing a tile failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_byte_roundtrip() {
        for status in [TileStatus::Missing, TileStatus::Empty, TileStatus::Exists] {
            assert_eq!(TileStatus::from_u8(status as u8), status);
        }
        assert_eq!(TileStatus::from_u8(200), TileStatus::Missing);
    }

    #[test]
    fn test_child_coordinates() {
        let parent = TileCoord::new(3, 5, 7);
        assert_eq!(parent.child(0, 0), TileCoord::new(4, 10, 14));
        assert_eq!(parent.child(1, 1), TileCoord::new(4, 11, 15));
    }

    #[test]
    fn test_coord_display() {
        assert_eq!(TileCoord::new(2, 3, 4).to_string(), "(2, 3, 4)");
    }
}
