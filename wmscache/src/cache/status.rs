//! Per-level tile status bitmaps backed by the storage tree.

use super::description::CacheDescription;
use super::path::level_directory;
use super::store::TEMP_EXTENSION;
use super::types::{CacheError, TileCoord, TileStatus};
use crate::grid::GridPlan;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, info, warn};

/// Tile counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub missing: u64,
    pub empty: u64,
    pub exists: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.missing + self.empty + self.exists
    }
}

/// Status bitmap of one pyramid level.
///
/// Cells are atomic so readers never block the background pipeline; each
/// cell is only ever written by the task that owns its coordinate.
#[derive(Debug)]
pub struct LevelStatus {
    level: u32,
    tiles_x: u32,
    tiles_y: u32,
    cells: Box<[AtomicU8]>,
}

impl LevelStatus {
    fn new(level: u32, tiles_x: u32, tiles_y: u32) -> Self {
        let cells = (0..tiles_x as usize * tiles_y as usize)
            .map(|_| AtomicU8::new(TileStatus::Missing as u8))
            .collect();
        Self {
            level,
            tiles_x,
            tiles_y,
            cells,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    /// Status at `(x, y)`, or `None` outside the level.
    pub fn get(&self, x: u32, y: u32) -> Option<TileStatus> {
        let index = self.index(x, y)?;
        Some(TileStatus::from_u8(self.cells[index].load(Ordering::Acquire)))
    }

    /// Record the status at `(x, y)`. Returns false outside the level.
    pub(crate) fn set(&self, x: u32, y: u32, status: TileStatus) -> bool {
        match self.index(x, y) {
            Some(index) => {
                self.cells[index].store(status as u8, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for cell in self.cells.iter() {
            match TileStatus::from_u8(cell.load(Ordering::Acquire)) {
                TileStatus::Missing => counts.missing += 1,
                TileStatus::Empty => counts.empty += 1,
                TileStatus::Exists => counts.exists += 1,
            }
        }
        counts
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.tiles_x && y < self.tiles_y)
            .then(|| y as usize * self.tiles_x as usize + x as usize)
    }
}

/// Proof that the finest level has been fetched.
///
/// Mip reduction requires one, so it can only start once the fetch phase
/// is over or the finest level was already complete on disk.
#[derive(Debug)]
pub struct FinestLevelReady {
    _private: (),
}

impl FinestLevelReady {
    pub(crate) fn after_fetch() -> Self {
        Self { _private: () }
    }
}

/// Which tiles of every level are stored, and how.
///
/// Built once by scanning the storage tree, then updated in place as tiles
/// are produced.
#[derive(Debug)]
pub struct FileStatusIndex {
    levels: Vec<LevelStatus>,
}

impl FileStatusIndex {
    /// Create the storage root if needed and scan it.
    ///
    /// Failing to create the root is fatal. Entries whose names are not
    /// decimal coordinates within the grid, or whose extension differs, are
    /// ignored.
    pub fn build(desc: &CacheDescription) -> Result<Self, CacheError> {
        let root = desc.storage_root();
        fs::create_dir_all(root).map_err(|source| CacheError::CreateRoot {
            path: root.to_path_buf(),
            source,
        })?;

        let index = Self::all_missing(desc.grid());
        for level in &index.levels {
            let dir = level_directory(desc, level.level);
            if dir.is_dir() {
                scan_level(&dir, desc.extension(), level)?;
            }
            let counts = level.counts();
            debug!(
                level = level.level,
                missing = counts.missing,
                empty = counts.empty,
                exists = counts.exists,
                "Scanned cache level"
            );
        }

        info!(
            root = %root.display(),
            levels = index.levels.len(),
            "Cache index built"
        );
        Ok(index)
    }

    /// An index with every cell Missing.
    pub fn all_missing(grid: &GridPlan) -> Self {
        let levels = (0..grid.num_levels())
            .filter_map(|level| {
                grid.level_tiles(level)
                    .map(|(tx, ty)| LevelStatus::new(level, tx, ty))
            })
            .collect();
        Self { levels }
    }

    pub fn num_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn levels(&self) -> &[LevelStatus] {
        &self.levels
    }

    pub fn level(&self, level: u32) -> Option<&LevelStatus> {
        self.levels.get(level as usize)
    }

    /// Status of a tile, or `None` outside the grid.
    pub fn status(&self, coord: TileCoord) -> Option<TileStatus> {
        self.level(coord.level)?.get(coord.x, coord.y)
    }

    pub(crate) fn mark(&self, coord: TileCoord, status: TileStatus) -> bool {
        self.level(coord.level)
            .is_some_and(|level| level.set(coord.x, coord.y, status))
    }

    /// Token for mip reduction if no finest-level tile is Missing.
    pub fn finest_level_resolved(&self) -> Option<FinestLevelReady> {
        let finest = self.levels.last()?;
        (finest.counts().missing == 0).then(FinestLevelReady::after_fetch)
    }
}

/// A temp file left behind by a write that never reached its rename.
fn is_stale_temp(path: &Path, extension: &str) -> bool {
    extension.trim_start_matches('.') != TEMP_EXTENSION
        && path.extension().is_some_and(|ext| ext == TEMP_EXTENSION)
        && path.is_file()
}

fn remove_stale_temp(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed stale temp file"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale temp file"),
    }
}

fn scan_level(dir: &Path, extension: &str, level: &LevelStatus) -> Result<(), CacheError> {
    for entry in read_dir(dir)? {
        let row_path = entry.path();
        if !row_path.is_dir() {
            continue;
        }
        let Some(y) = parse_index(&entry.file_name().to_string_lossy()) else {
            debug!(path = %row_path.display(), "Skipping non-numeric row directory");
            continue;
        };
        if y >= level.tiles_y {
            debug!(level = level.level, y, "Skipping row outside grid");
            continue;
        }

        for file in read_dir(&row_path)? {
            let path = file.path();
            if is_stale_temp(&path, extension) {
                remove_stale_temp(&path);
                continue;
            }
            let name = file.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(extension)) else {
                continue;
            };
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Some(x) = parse_index(stem) else {
                debug!(path = %path.display(), "Skipping non-numeric tile file");
                continue;
            };
            if x >= level.tiles_x {
                debug!(level = level.level, x, y, "Skipping tile outside grid");
                continue;
            }

            let status = if metadata.len() == 0 {
                TileStatus::Empty
            } else {
                TileStatus::Exists
            };
            level.set(x, y, status);
        }
    }
    Ok(())
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>, CacheError> {
    let scan_error = |source| CacheError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    fs::read_dir(dir)
        .map_err(scan_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(scan_error)
}

/// Plain decimal integer, digits only.
fn parse_index(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::path::tile_path;
    use crate::test_support::small_description;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_root_is_all_missing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("cache");
        let desc = small_description(&root, None);

        let index = FileStatusIndex::build(&desc).unwrap();

        assert!(root.is_dir());
        assert_eq!(index.num_levels(), desc.grid().num_levels());
        for level in index.levels() {
            let counts = level.counts();
            assert_eq!(counts.missing, counts.total());
            assert!(counts.total() > 0);
        }
        assert!(index.finest_level_resolved().is_none());
    }

    #[test]
    fn test_scan_classifies_files_by_size() {
        let temp = TempDir::new().unwrap();
        let desc = small_description(temp.path(), None);
        let finest = desc.grid().finest_level();

        let exists = tile_path(&desc, TileCoord::new(finest, 1, 0));
        let empty = tile_path(&desc, TileCoord::new(finest, 0, 1));
        fs::create_dir_all(exists.parent().unwrap()).unwrap();
        fs::create_dir_all(empty.parent().unwrap()).unwrap();
        fs::write(&exists, [1, 2, 3]).unwrap();
        fs::write(&empty, []).unwrap();

        let index = FileStatusIndex::build(&desc).unwrap();

        assert_eq!(
            index.status(TileCoord::new(finest, 1, 0)),
            Some(TileStatus::Exists)
        );
        assert_eq!(
            index.status(TileCoord::new(finest, 0, 1)),
            Some(TileStatus::Empty)
        );
        assert_eq!(
            index.status(TileCoord::new(finest, 0, 0)),
            Some(TileStatus::Missing)
        );
    }

    #[test]
    fn test_scan_ignores_foreign_entries() {
        let temp = TempDir::new().unwrap();
        let desc = small_description(temp.path(), None);
        let finest = desc.grid().finest_level();
        let row = tile_path(&desc, TileCoord::new(finest, 0, 0))
            .parent()
            .unwrap()
            .to_path_buf();
        let level_dir = row.parent().unwrap().to_path_buf();
        fs::create_dir_all(&row).unwrap();

        // Wrong extension, non-numeric, out of range, temp file, directory
        fs::write(row.join("0.png"), [1]).unwrap();
        fs::write(row.join("abc.cem"), [1]).unwrap();
        fs::write(row.join("9.cem"), [1]).unwrap();
        fs::write(row.join("0.tmp"), [1]).unwrap();
        fs::create_dir_all(row.join("1.cem")).unwrap();
        fs::create_dir_all(level_dir.join("junk")).unwrap();
        fs::write(level_dir.join("0.cem"), [1]).unwrap();

        let index = FileStatusIndex::build(&desc).unwrap();
        let counts = index.level(finest).unwrap().counts();
        assert_eq!(counts.missing, counts.total());
    }

    #[test]
    fn test_scan_removes_interrupted_writes() {
        let temp = TempDir::new().unwrap();
        let desc = small_description(temp.path(), None);
        let finest = desc.grid().finest_level();
        let tile = tile_path(&desc, TileCoord::new(finest, 2, 1));
        let leftover = tile.with_extension("tmp");
        fs::create_dir_all(tile.parent().unwrap()).unwrap();
        fs::write(&tile, [1, 2]).unwrap();
        fs::write(&leftover, [1]).unwrap();

        let index = FileStatusIndex::build(&desc).unwrap();

        assert!(!leftover.exists());
        assert!(tile.exists());
        assert_eq!(
            index.status(TileCoord::new(finest, 2, 1)),
            Some(TileStatus::Exists)
        );
    }

    #[test]
    fn test_mark_and_resolve_finest_level() {
        let temp = TempDir::new().unwrap();
        let desc = small_description(temp.path(), None);
        let index = FileStatusIndex::build(&desc).unwrap();
        let finest = index.level(desc.grid().finest_level()).unwrap();

        for y in 0..finest.tiles_y() {
            for x in 0..finest.tiles_x() {
                assert!(index.mark(TileCoord::new(finest.level(), x, y), TileStatus::Empty));
            }
        }

        assert!(index.finest_level_resolved().is_some());
        assert!(!index.mark(TileCoord::new(0, 99, 0), TileStatus::Exists));
        assert_eq!(index.status(TileCoord::new(99, 0, 0)), None);
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("007"), Some(7));
        assert_eq!(parse_index("+7"), None);
        assert_eq!(parse_index(""), None);
        assert_eq!(parse_index("x1"), None);
    }
}
