//! # Chunk Iteration Module
//!
//! An iterator over every cell of a chunk in storage order. Both mesher passes
//! use it, which guarantees that the count pass and the fill pass visit cells in
//! exactly the same sequence.

use cgmath::Point3;

use crate::engine_state::voxels::block::BlockId;

use super::{VoxelChunk, CHUNK_DIMENSION, CHUNK_SIZE};

/// Yields `(cell, block_id)` for all `CHUNK_SIZE` cells of a chunk.
pub struct ChunkCellIterator<'a> {
    chunk_ref: &'a VoxelChunk,
    offset: usize,
}

impl<'a> ChunkCellIterator<'a> {
    pub fn new(chunk_ref: &'a VoxelChunk) -> Self {
        ChunkCellIterator {
            chunk_ref,
            offset: 0,
        }
    }
}

impl Iterator for ChunkCellIterator<'_> {
    type Item = (Point3<usize>, BlockId);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= CHUNK_SIZE {
            return None;
        }

        let offset = self.offset;
        self.offset += 1;

        let x = offset % CHUNK_DIMENSION;
        let y = (offset / CHUNK_DIMENSION) % CHUNK_DIMENSION;
        let z = offset / (CHUNK_DIMENSION * CHUNK_DIMENSION);
        Some((Point3::new(x, y, z), self.chunk_ref.blocks()[offset]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = CHUNK_SIZE - self.offset;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkCellIterator<'_> {}
