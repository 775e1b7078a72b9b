//! # Chunk Column Module
//!
//! A `ChunkColumn` is the vertical stack of `COLUMN_HEIGHT` chunks that share one
//! horizontal chunk coordinate. It is the unit the streaming pipeline loads,
//! meshes and evicts.
//!
//! ## Lifetime
//!
//! Several players may want the same column at once, so residency is reference
//! counted through `loading_players`. `load` and `unload` only move the counter
//! and report the transition; the caller decides what to do with it (enqueue a
//! setup, a teardown or a save). Removing an idle column from memory is done by a
//! separate eviction sweep, never as a side effect of the last `unload`.
//!
//! ## Setup generations
//!
//! Meshes may be built on worker threads. Every teardown bumps
//! `setup_generation`, and meshes produced for an older generation are
//! discarded when they arrive.

use cgmath::{Point2, Point3};
use log::debug;

use super::{block::BlockRegistry, chunk::VoxelChunk};
use crate::engine_state::{error::VoxelError, rendering::meshing::ChunkMesh};

/// Number of chunks stacked in one column.
pub const COLUMN_HEIGHT: usize = 16;

/// Outcome of [`ChunkColumn::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTransition {
    /// The counter went from 0 to 1.
    BecameResident,
    /// Someone else already wanted the column.
    AlreadyResident,
}

/// Outcome of [`ChunkColumn::unload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadTransition {
    /// The counter went from 1 to 0.
    BecameIdle,
    /// Other players still want the column.
    StillWanted,
    /// The counter was already 0 and stays there.
    AlreadyIdle,
}

/// A vertical stack of chunks at one horizontal chunk coordinate.
#[derive(Debug)]
pub struct ChunkColumn {
    position: Point2<i32>,
    chunks: Vec<VoxelChunk>,
    loading_players: u32,
    set_up: bool,
    setup_pending: bool,
    setup_generation: u64,
    needs_save: bool,
}

impl ChunkColumn {
    /// Builds a column from exactly `COLUMN_HEIGHT` chunks ordered bottom to top.
    ///
    /// # Panics
    /// Panics if the chunk count is wrong or a chunk is positioned outside of
    /// this column.
    pub fn from_chunks(position: Point2<i32>, chunks: Vec<VoxelChunk>) -> Self {
        assert_eq!(chunks.len(), COLUMN_HEIGHT, "a column holds {COLUMN_HEIGHT} chunks");
        for (z, chunk) in chunks.iter().enumerate() {
            assert_eq!(
                chunk.position,
                Point3::new(position.x, position.y, z as i32),
                "chunk is not part of column ({}, {})",
                position.x,
                position.y
            );
        }

        ChunkColumn {
            position,
            chunks,
            loading_players: 0,
            set_up: false,
            setup_pending: false,
            setup_generation: 0,
            needs_save: false,
        }
    }

    /// A column of air chunks.
    pub fn empty(position: Point2<i32>) -> Self {
        let chunks = (0..COLUMN_HEIGHT as i32)
            .map(|z| VoxelChunk::new(Point3::new(position.x, position.y, z)))
            .collect();
        Self::from_chunks(position, chunks)
    }

    pub fn position(&self) -> Point2<i32> {
        self.position
    }

    /// The chunk at height `z`.
    ///
    /// # Errors
    /// Returns [`VoxelError::IndexOutOfRange`] unless `0 <= z < COLUMN_HEIGHT`.
    pub fn chunk(&self, z: i32) -> Result<&VoxelChunk, VoxelError> {
        let index = Self::height_index(z)?;
        Ok(&self.chunks[index])
    }

    /// Mutable access to the chunk at height `z`. Marks the column as modified
    /// and invalidates meshes still being built from older block data.
    pub fn chunk_mut(&mut self, z: i32) -> Result<&mut VoxelChunk, VoxelError> {
        let index = Self::height_index(z)?;
        self.needs_save = true;
        if self.setup_pending {
            self.setup_generation += 1;
        }
        Ok(&mut self.chunks[index])
    }

    /// Validates a chunk height and converts it to a storage index.
    pub fn height_index(z: i32) -> Result<usize, VoxelError> {
        if (0..COLUMN_HEIGHT as i32).contains(&z) {
            Ok(z as usize)
        } else {
            Err(VoxelError::IndexOutOfRange {
                index: z,
                bound: COLUMN_HEIGHT as i32,
            })
        }
    }

    pub fn chunks(&self) -> &[VoxelChunk] {
        &self.chunks
    }

    pub fn loading_players(&self) -> u32 {
        self.loading_players
    }

    /// Whether at least one player wants this column.
    pub fn is_wanted(&self) -> bool {
        self.loading_players > 0
    }

    /// Records one more player that wants this column.
    pub fn load(&mut self) -> LoadTransition {
        self.loading_players += 1;
        if self.loading_players == 1 {
            debug!("Column ({}, {}) became resident", self.position.x, self.position.y);
            LoadTransition::BecameResident
        } else {
            LoadTransition::AlreadyResident
        }
    }

    /// Records that one player no longer wants this column.
    ///
    /// The counter never goes below zero; a surplus unload is reported as
    /// [`UnloadTransition::AlreadyIdle`] and changes nothing.
    pub fn unload(&mut self) -> UnloadTransition {
        match self.loading_players {
            0 => UnloadTransition::AlreadyIdle,
            1 => {
                self.loading_players = 0;
                debug!("Column ({}, {}) became idle", self.position.x, self.position.y);
                UnloadTransition::BecameIdle
            }
            _ => {
                self.loading_players -= 1;
                UnloadTransition::StillWanted
            }
        }
    }

    /// Builds the meshes of every chunk on the calling thread.
    ///
    /// On error no chunk keeps a half-built state visible: the column stays not
    /// set up.
    pub fn setup(&mut self, registry: &BlockRegistry) -> Result<(), VoxelError> {
        let built = self
            .chunks
            .iter_mut()
            .try_for_each(|chunk| chunk.setup(registry));
        if let Err(err) = built {
            self.chunks.iter_mut().for_each(VoxelChunk::teardown);
            return Err(err);
        }
        self.set_up = true;
        self.setup_pending = false;
        Ok(())
    }

    /// Drops the meshes of every chunk and invalidates meshes still in flight.
    pub fn teardown(&mut self) {
        self.chunks.iter_mut().for_each(VoxelChunk::teardown);
        self.set_up = false;
        self.setup_pending = false;
        self.setup_generation += 1;
    }

    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    /// Whether meshes for this column are being built elsewhere.
    pub fn is_setup_pending(&self) -> bool {
        self.setup_pending
    }

    /// Marks an off-thread setup as started and returns the generation token the
    /// results must carry.
    pub fn begin_async_setup(&mut self) -> u64 {
        self.setup_pending = true;
        self.setup_generation
    }

    /// Installs meshes built elsewhere, one `(visual, collision)` pair per chunk.
    ///
    /// Returns `false` and drops the meshes if the column was torn down or
    /// edited since `generation` was handed out. After an edit the setup stays
    /// pending and has to be restarted with [`ChunkColumn::begin_async_setup`].
    pub fn install_meshes(&mut self, generation: u64, meshes: Vec<(ChunkMesh, ChunkMesh)>) -> bool {
        if generation != self.setup_generation || !self.setup_pending {
            debug!(
                "Discarding stale meshes for column ({}, {})",
                self.position.x, self.position.y
            );
            return false;
        }
        debug_assert_eq!(meshes.len(), COLUMN_HEIGHT);

        for (chunk, (visual, collision)) in self.chunks.iter_mut().zip(meshes) {
            chunk.install_meshes(visual, collision);
        }
        self.set_up = true;
        self.setup_pending = false;
        true
    }

    /// Abandons an off-thread setup that failed.
    pub fn cancel_async_setup(&mut self, generation: u64) {
        if generation == self.setup_generation {
            self.setup_pending = false;
        }
    }

    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    /// Flags the column as differing from what the region store holds.
    pub fn mark_dirty(&mut self) {
        self.needs_save = true;
    }

    pub fn mark_saved(&mut self) {
        self.needs_save = false;
    }

    /// Whether the eviction sweep may drop this column.
    pub fn is_evictable(&self) -> bool {
        !self.is_wanted() && !self.set_up && !self.setup_pending && !self.needs_save
    }

    /// Block data of every chunk without meshes or lifecycle state.
    pub fn chunk_snapshots(&self) -> Vec<VoxelChunk> {
        self.chunks.iter().map(VoxelChunk::snapshot).collect()
    }

    /// A copy of the block data as a fresh, idle column.
    pub fn snapshot(&self) -> ChunkColumn {
        ChunkColumn::from_chunks(self.position, self.chunk_snapshots())
    }
}
