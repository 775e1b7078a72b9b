//! # Chunk Creation Module
//!
//! A builder that fills a chunk one cell at a time in storage order. Generators
//! walk the grid in the same x, then y, then z order and push one block id per
//! cell; the builder keeps track of the current cell so they don't have to.

use cgmath::Point3;

use crate::engine_state::voxels::block::BlockId;

use super::{VoxelChunk, CHUNK_DIMENSION, CHUNK_SIZE};

/// A builder for populating a chunk in storage order.
pub struct ChunkCreationIterator {
    /// The chunk-coordinate position of the chunk being created
    position: Point3<i32>,
    /// Block ids pushed so far
    blocks: Vec<BlockId>,
    /// Current X position within the chunk
    local_x: usize,
    /// Current Y position within the chunk
    local_y: usize,
    /// Current Z position within the chunk
    local_z: usize,
}

impl ChunkCreationIterator {
    /// Creates a new `ChunkCreationIterator` for building a chunk at the given position.
    pub fn new(position: Point3<i32>) -> Self {
        ChunkCreationIterator {
            position,
            blocks: Vec::with_capacity(CHUNK_SIZE),
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// The cell the next pushed block will land in, or `None` once the grid is full.
    pub fn current_cell(&self) -> Option<Point3<usize>> {
        (self.blocks.len() < CHUNK_SIZE)
            .then(|| Point3::new(self.local_x, self.local_y, self.local_z))
    }

    /// The world-space block coordinate of the next cell.
    pub fn current_world_block(&self) -> Point3<i32> {
        let dimension = CHUNK_DIMENSION as i32;
        Point3::new(
            self.position.x * dimension + self.local_x as i32,
            self.position.y * dimension + self.local_y as i32,
            self.position.z * dimension + self.local_z as i32,
        )
    }

    /// Adds a block at the current cell and advances to the next one.
    ///
    /// # Panics
    /// Panics if the chunk is already full.
    pub fn push_block(&mut self, block_id: BlockId) {
        assert!(self.blocks.len() < CHUNK_SIZE, "chunk is already full");
        self.blocks.push(block_id);

        self.local_x += 1;
        if self.local_x == CHUNK_DIMENSION {
            self.local_x = 0;
            self.local_y += 1;
            if self.local_y == CHUNK_DIMENSION {
                self.local_y = 0;
                self.local_z += 1;
            }
        }
    }

    /// Finalizes the chunk creation and returns the constructed, loaded chunk.
    ///
    /// # Panics
    /// Panics if fewer than `CHUNK_SIZE` blocks were pushed.
    pub fn return_chunk(self) -> VoxelChunk {
        let mut chunk = VoxelChunk::from_blocks(self.position, self.blocks);
        chunk.mark_loaded();
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushes_follow_storage_order() {
        let mut cci = ChunkCreationIterator::new(Point3::new(1, 0, 0));
        assert_eq!(cci.current_cell(), Some(Point3::new(0, 0, 0)));
        assert_eq!(cci.current_world_block(), Point3::new(16, 0, 0));

        for _ in 0..CHUNK_DIMENSION + 1 {
            cci.push_block(0);
        }
        assert_eq!(cci.current_cell(), Some(Point3::new(1, 1, 0)));

        for _ in CHUNK_DIMENSION + 1..CHUNK_SIZE {
            cci.push_block(0);
        }
        assert_eq!(cci.current_cell(), None);
        assert!(cci.return_chunk().is_loaded());
    }
}
