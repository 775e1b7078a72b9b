//! # World Module
//!
//! This module provides `ResidentColumns`, the arena of columns currently held
//! in memory, keyed by their horizontal chunk coordinate.
//!
//! ## Architecture
//!
//! The arena is sparse: only columns some player asked for (and idle columns
//! that have not been swept yet) are present, so the world can extend in every
//! direction. Lookups are O(1) through a hash map.
//!
//! The arena is owned by a single streaming controller and mutated only from its
//! drain steps, which serializes every reference count change on a column.
//! Idle columns are removed by [`ResidentColumns::sweep_evictable`], never
//! inline when their count drops to zero.

use std::collections::HashMap;

use cgmath::{Point2, Point3};

use super::{chunk::VoxelChunk, column::ChunkColumn};
use crate::engine_state::streaming::coords::column_of;

/// The set of columns currently held in memory.
#[derive(Debug, Default)]
pub struct ResidentColumns {
    columns: HashMap<Point2<i32>, ChunkColumn>,
}

impl ResidentColumns {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, position: Point2<i32>) -> bool {
        self.columns.contains_key(&position)
    }

    pub fn get(&self, position: Point2<i32>) -> Option<&ChunkColumn> {
        self.columns.get(&position)
    }

    pub fn get_mut(&mut self, position: Point2<i32>) -> Option<&mut ChunkColumn> {
        self.columns.get_mut(&position)
    }

    /// Retrieves the chunk at a chunk coordinate if its column is resident.
    ///
    /// # Arguments
    ///
    /// * `position` - The chunk coordinate to look up
    ///
    /// # Returns
    ///
    /// `None` if the column is absent or `position.z` is outside the column.
    pub fn get_chunk(&self, position: Point3<i32>) -> Option<&VoxelChunk> {
        self.get(column_of(position))
            .and_then(|column| column.chunk(position.z).ok())
    }

    /// Adds a column, returning the one it replaced.
    pub fn insert(&mut self, column: ChunkColumn) -> Option<ChunkColumn> {
        self.columns.insert(column.position(), column)
    }

    pub fn remove(&mut self, position: Point2<i32>) -> Option<ChunkColumn> {
        self.columns.remove(&position)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Point2<i32>> + '_ {
        self.columns.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkColumn> {
        self.columns.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChunkColumn> {
        self.columns.values_mut()
    }

    /// Removes every column that is idle, torn down and saved.
    ///
    /// # Returns
    ///
    /// The positions of the removed columns.
    pub fn sweep_evictable(&mut self) -> Vec<Point2<i32>> {
        let evicted: Vec<_> = self
            .columns
            .iter()
            .filter(|(_, column)| column.is_evictable())
            .map(|(&position, _)| position)
            .collect();
        for position in &evicted {
            self.columns.remove(position);
        }
        evicted
    }
}
