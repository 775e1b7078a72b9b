//! # Region Persistence
//!
//! Columns are persisted a region at a time. A [`RegionSerializer`] turns a
//! [`Region`] into bytes and reads one back from a file; the [`RegionCache`]
//! keeps recently used regions in memory and writes modified ones out when they
//! are evicted or when the cache is flushed.
//!
//! The streaming pipeline talks to persistence only through [`RegionStore`], so
//! a world without a save directory can plug in [`UnavailableRegionStore`].

use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use cgmath::{Point2, Point3};
use log::{debug, info};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::{
    block::BlockId,
    chunk::{VoxelChunk, CHUNK_SIZE},
    column::{ChunkColumn, COLUMN_HEIGHT},
    region::Region,
};
use crate::engine_state::{error::PersistenceError, streaming::coords::chunk_to_region};

/// Serialized form of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub x: i32,
    pub y: i32,
    /// Block ids of every chunk, bottom to top, in chunk storage order
    pub chunks: Vec<Vec<BlockId>>,
}

/// Serialized form of one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub x: i32,
    pub y: i32,
    pub columns: Vec<ColumnRecord>,
}

impl From<&ChunkColumn> for ColumnRecord {
    fn from(column: &ChunkColumn) -> Self {
        ColumnRecord {
            x: column.position().x,
            y: column.position().y,
            chunks: column
                .chunks()
                .iter()
                .map(|chunk| chunk.blocks().to_vec())
                .collect(),
        }
    }
}

impl From<&Region> for RegionRecord {
    fn from(region: &Region) -> Self {
        RegionRecord {
            x: region.position().x,
            y: region.position().y,
            columns: region.columns().map(ColumnRecord::from).collect(),
        }
    }
}

impl TryFrom<ColumnRecord> for ChunkColumn {
    type Error = PersistenceError;

    fn try_from(record: ColumnRecord) -> Result<Self, Self::Error> {
        if record.chunks.len() != COLUMN_HEIGHT {
            return Err(PersistenceError::Malformed(format!(
                "column ({}, {}) has {} chunks",
                record.x,
                record.y,
                record.chunks.len()
            )));
        }

        let position = Point2::new(record.x, record.y);
        let chunks = record
            .chunks
            .into_iter()
            .enumerate()
            .map(|(z, blocks)| {
                if blocks.len() != CHUNK_SIZE {
                    return Err(PersistenceError::Malformed(format!(
                        "chunk ({}, {}, {z}) has {} blocks",
                        record.x,
                        record.y,
                        blocks.len()
                    )));
                }
                let mut chunk =
                    VoxelChunk::from_blocks(Point3::new(record.x, record.y, z as i32), blocks);
                chunk.mark_loaded();
                Ok(chunk)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ChunkColumn::from_chunks(position, chunks))
    }
}

impl TryFrom<RegionRecord> for Region {
    type Error = PersistenceError;

    fn try_from(record: RegionRecord) -> Result<Self, Self::Error> {
        let mut region = Region::new(Point2::new(record.x, record.y));
        for column in record.columns {
            let column = ChunkColumn::try_from(column)?;
            region
                .set_column(column)
                .map_err(|err| PersistenceError::Malformed(err.to_string()))?;
        }
        Ok(region)
    }
}

/// Converts whole regions to bytes and back.
pub trait RegionSerializer: Send {
    fn save(&self, region: &Region) -> Result<Vec<u8>, PersistenceError>;

    fn load(&self, path: &Path) -> Result<Region, PersistenceError>;
}

/// Stores regions as JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRegionSerializer;

impl RegionSerializer for JsonRegionSerializer {
    fn save(&self, region: &Region) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec(&RegionRecord::from(region))?)
    }

    fn load(&self, path: &Path) -> Result<Region, PersistenceError> {
        let bytes = fs::read(path)?;
        let record: RegionRecord = serde_json::from_slice(&bytes)?;
        Region::try_from(record)
    }
}

/// Where the streaming pipeline reads columns from and writes them back to.
pub trait RegionStore: Send {
    /// The stored version of a column, or `None` if it was never saved.
    fn load_column(&mut self, position: Point2<i32>) -> Result<Option<ChunkColumn>, PersistenceError>;

    fn save_column(&mut self, column: &ChunkColumn) -> Result<(), PersistenceError>;

    /// Writes every pending change to the backing storage.
    fn flush(&mut self) -> Result<(), PersistenceError>;
}

/// A store for worlds without persistence. Every call reports
/// [`PersistenceError::NotYetAvailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRegionStore;

impl RegionStore for UnavailableRegionStore {
    fn load_column(&mut self, _position: Point2<i32>) -> Result<Option<ChunkColumn>, PersistenceError> {
        Err(PersistenceError::NotYetAvailable)
    }

    fn save_column(&mut self, _column: &ChunkColumn) -> Result<(), PersistenceError> {
        Err(PersistenceError::NotYetAvailable)
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        Err(PersistenceError::NotYetAvailable)
    }
}

struct CachedRegion {
    region: Region,
    dirty: bool,
}

/// An LRU cache of regions backed by one file per region below `root`.
pub struct RegionCache<S: RegionSerializer> {
    root: PathBuf,
    serializer: S,
    regions: LruCache<Point2<i32>, CachedRegion>,
}

impl<S: RegionSerializer> RegionCache<S> {
    /// Creates a cache holding at most `capacity` regions (at least one).
    pub fn new(root: impl Into<PathBuf>, serializer: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        RegionCache {
            root: root.into(),
            serializer,
            regions: LruCache::new(capacity),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of regions currently held in memory.
    pub fn cached_regions(&self) -> usize {
        self.regions.len()
    }

    fn write_region(root: &Path, serializer: &S, region: &Region) -> Result<(), PersistenceError> {
        fs::create_dir_all(root)?;
        let bytes = serializer.save(region)?;
        fs::write(region.path(root), bytes)?;
        debug!("Wrote region {}", region.file_name());
        Ok(())
    }

    fn read_region(&self, position: Point2<i32>) -> Result<Region, PersistenceError> {
        let path = self.root.join(Region::file_name_for(position));
        if path.exists() {
            debug!("Reading region {}", path.display());
            self.serializer.load(&path)
        } else {
            Ok(Region::new(position))
        }
    }

    fn cached_region(&mut self, position: Point2<i32>) -> Result<&mut CachedRegion, PersistenceError> {
        if !self.regions.contains(&position) {
            let region = self.read_region(position)?;
            if self.regions.len() >= self.regions.cap().get() {
                // The least recently used region stays cached and dirty until
                // it has been written.
                if let Some((_, lru)) = self.regions.peek_lru() {
                    if lru.dirty {
                        Self::write_region(&self.root, &self.serializer, &lru.region)?;
                    }
                }
                self.regions.pop_lru();
            }
            self.regions.put(position, CachedRegion { region, dirty: false });
        }

        self.regions.get_mut(&position).ok_or_else(|| {
            PersistenceError::Malformed(format!(
                "region ({}, {}) vanished from the cache",
                position.x, position.y
            ))
        })
    }
}

impl<S: RegionSerializer> RegionStore for RegionCache<S> {
    fn load_column(&mut self, position: Point2<i32>) -> Result<Option<ChunkColumn>, PersistenceError> {
        let cached = self.cached_region(chunk_to_region(position))?;
        Ok(cached.region.column_at(position).map(ChunkColumn::snapshot))
    }

    fn save_column(&mut self, column: &ChunkColumn) -> Result<(), PersistenceError> {
        let cached = self.cached_region(chunk_to_region(column.position()))?;
        cached
            .region
            .set_column(column.snapshot())
            .map_err(|err| PersistenceError::Malformed(err.to_string()))?;
        cached.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        let RegionCache {
            root,
            serializer,
            regions,
        } = self;

        let mut written = 0;
        for (_, cached) in regions.iter_mut().filter(|(_, cached)| cached.dirty) {
            Self::write_region(root, serializer, &cached.region)?;
            cached.dirty = false;
            written += 1;
        }
        if written > 0 {
            info!("Flushed {written} regions to {}", root.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::{DIRT, STONE};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "voxel-world-{name}-{}-{}",
            std::process::id(),
            fastrand::u64(..)
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn marked_column(position: Point2<i32>, block: BlockId) -> ChunkColumn {
        let mut column = ChunkColumn::empty(position);
        column.chunk_mut(2).unwrap().set_block(1, 2, 3, block);
        column
    }

    #[test]
    fn json_regions_round_trip_through_files() {
        let dir = scratch_dir("json");
        let mut region = Region::new(Point2::new(-1, 0));
        region.set_column(marked_column(Point2::new(-3, 4), STONE.id)).unwrap();

        fs::create_dir_all(&dir).unwrap();
        let bytes = JsonRegionSerializer.save(&region).unwrap();
        fs::write(region.path(&dir), bytes).unwrap();

        let loaded = JsonRegionSerializer.load(&dir.join("-1,0.r")).unwrap();
        let column = loaded.column_at(Point2::new(-3, 4)).unwrap();
        assert_eq!(column.chunk(2).unwrap().get_block(1, 2, 3), STONE.id);
        assert!(column.chunk(2).unwrap().is_loaded());
        assert!(!column.needs_save());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_records_are_rejected() {
        let record = RegionRecord {
            x: 0,
            y: 0,
            columns: vec![ColumnRecord {
                x: 1,
                y: 1,
                chunks: vec![vec![0; CHUNK_SIZE]; 3],
            }],
        };
        assert!(matches!(
            Region::try_from(record),
            Err(PersistenceError::Malformed(_))
        ));

        let misplaced = RegionRecord {
            x: 0,
            y: 0,
            columns: vec![ColumnRecord::from(&ChunkColumn::empty(Point2::new(40, 0)))],
        };
        assert!(matches!(
            Region::try_from(misplaced),
            Err(PersistenceError::Malformed(_))
        ));
    }

    #[test]
    fn evicted_regions_are_written_and_read_back() {
        let dir = scratch_dir("cache");
        let mut cache = RegionCache::new(&dir, JsonRegionSerializer, 1);

        assert!(cache.load_column(Point2::new(0, 0)).unwrap().is_none());
        cache.save_column(&marked_column(Point2::new(0, 0), DIRT.id)).unwrap();
        assert!(!dir.join("0,0.r").exists());

        // Touching another region evicts region (0, 0) and writes it out.
        cache.load_column(Point2::new(16, 0)).unwrap();
        assert_eq!(cache.cached_regions(), 1);
        assert!(dir.join("0,0.r").exists());

        let column = cache.load_column(Point2::new(0, 0)).unwrap().unwrap();
        assert_eq!(column.chunk(2).unwrap().get_block(1, 2, 3), DIRT.id);
        fs::remove_dir_all(&dir).unwrap();
    }

    /// JSON serializer that can be switched into failing every save.
    struct FailingSerializer {
        failing: Arc<AtomicBool>,
    }

    impl RegionSerializer for FailingSerializer {
        fn save(&self, region: &Region) -> Result<Vec<u8>, PersistenceError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PersistenceError::Malformed("disk full".to_string()));
            }
            JsonRegionSerializer.save(region)
        }

        fn load(&self, path: &Path) -> Result<Region, PersistenceError> {
            JsonRegionSerializer.load(path)
        }
    }

    #[test]
    fn failed_eviction_writes_keep_the_region_cached() {
        let dir = scratch_dir("evict-fail");
        let failing = Arc::new(AtomicBool::new(false));
        let serializer = FailingSerializer {
            failing: Arc::clone(&failing),
        };
        let mut cache = RegionCache::new(&dir, serializer, 1);
        cache.save_column(&marked_column(Point2::new(0, 0), STONE.id)).unwrap();

        failing.store(true, Ordering::SeqCst);
        assert!(cache.load_column(Point2::new(16, 0)).is_err());
        assert_eq!(cache.cached_regions(), 1);
        assert!(!dir.join("0,0.r").exists());

        failing.store(false, Ordering::SeqCst);
        cache.flush().unwrap();

        let mut reopened = RegionCache::new(&dir, JsonRegionSerializer, 1);
        let column = reopened.load_column(Point2::new(0, 0)).unwrap().unwrap();
        assert_eq!(column.chunk(2).unwrap().get_block(1, 2, 3), STONE.id);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn flush_writes_dirty_regions_only() {
        let dir = scratch_dir("flush");
        let mut cache = RegionCache::new(&dir, JsonRegionSerializer, 4);
        cache.load_column(Point2::new(-20, 3)).unwrap();
        cache.save_column(&marked_column(Point2::new(5, 5), STONE.id)).unwrap();

        cache.flush().unwrap();
        assert!(dir.join("0,0.r").exists());
        assert!(!dir.join("-2,0.r").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unavailable_store_reports_it() {
        let mut store = UnavailableRegionStore;
        assert!(matches!(
            store.load_column(Point2::new(0, 0)),
            Err(PersistenceError::NotYetAvailable)
        ));
    }
}
