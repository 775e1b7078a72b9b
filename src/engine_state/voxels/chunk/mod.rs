//! # Chunk Module
//!
//! This module provides the `VoxelChunk` struct: a dense 16x16x16 grid of block
//! ids together with the two meshes generated from it.
//!
//! ## Storage
//!
//! Blocks are stored in a flat vector in x-major order (x, then y, then z), so the
//! cell `(x, y, z)` lives at `x + CHUNK_DIMENSION * y + CHUNK_PLANE_SIZE * z`.
//! Every cell holds a block id; properties such as solidity are resolved through
//! the [`BlockRegistry`] only when a mesh is built.
//!
//! ## Lifecycle
//!
//! A chunk starts out unloaded and without meshes. Once its contents come from the
//! region store or the world generator it is marked loaded. `setup` builds the
//! visual and collision meshes, `teardown` drops them again.

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use chunk_iteration::ChunkCellIterator;

use super::block::{BlockId, BlockRegistry, AIR_BLOCK_ID};
use crate::engine_state::{
    error::VoxelError,
    rendering::meshing::{self, ChunkMesh},
};

pub mod chunk_creation;
pub mod chunk_iteration;

/// The edge length of a chunk in blocks.
pub const CHUNK_DIMENSION: usize = 16;
/// The number of blocks in a single plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: usize = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: usize = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

/// A fixed-size dense grid of block ids plus its generated meshes.
///
/// Chunks are exclusively owned by their [`ChunkColumn`](super::column::ChunkColumn).
#[derive(Debug)]
pub struct VoxelChunk {
    /// The position of this chunk in chunk coordinates (world / CHUNK_DIMENSION).
    pub position: Point3<i32>,
    blocks: Vec<BlockId>,
    loaded: bool,
    mesh_built: bool,
    visual_mesh: Option<Arc<ChunkMesh>>,
    collision_mesh: Option<Arc<ChunkMesh>>,
}

impl VoxelChunk {
    /// Creates a new chunk filled with air.
    pub fn new(position: Point3<i32>) -> Self {
        Self::filled(position, AIR_BLOCK_ID)
    }

    /// Creates a new chunk where every cell holds `block_id`.
    pub fn filled(position: Point3<i32>, block_id: BlockId) -> Self {
        Self::from_blocks(position, vec![block_id; CHUNK_SIZE])
    }

    /// Builds a chunk from a complete block vector in storage order.
    ///
    /// # Panics
    /// Panics if `blocks` does not hold exactly `CHUNK_SIZE` ids.
    pub fn from_blocks(position: Point3<i32>, blocks: Vec<BlockId>) -> Self {
        assert_eq!(
            blocks.len(),
            CHUNK_SIZE,
            "a chunk needs exactly {CHUNK_SIZE} blocks"
        );
        VoxelChunk {
            position,
            blocks,
            loaded: false,
            mesh_built: false,
            visual_mesh: None,
            collision_mesh: None,
        }
    }

    /// Flat storage index of a cell.
    ///
    /// # Panics
    /// Panics if any coordinate is outside `[0, CHUNK_DIMENSION)`.
    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        assert!(
            x < CHUNK_DIMENSION && y < CHUNK_DIMENSION && z < CHUNK_DIMENSION,
            "cell ({x}, {y}, {z}) is outside of the chunk"
        );
        x + CHUNK_DIMENSION * y + CHUNK_PLANE_SIZE * z
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    /// Writes a block id without consulting the registry.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block_id: BlockId) {
        let index = Self::index(x, y, z);
        self.blocks[index] = block_id;
    }

    /// Replaces a block after checking that the id is registered.
    ///
    /// Existing meshes are not rebuilt; the caller re-runs setup when it wants the
    /// change to become visible.
    pub fn change_block(
        &mut self,
        registry: &BlockRegistry,
        x: usize,
        y: usize,
        z: usize,
        block_id: BlockId,
    ) -> Result<(), VoxelError> {
        registry.lookup(block_id)?;
        self.set_block(x, y, z, block_id);
        Ok(())
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Iterates over every cell in storage order.
    pub fn cells(&self) -> ChunkCellIterator<'_> {
        ChunkCellIterator::new(self)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Whether the mesh buffers are valid for rendering.
    pub fn is_mesh_built(&self) -> bool {
        self.mesh_built
    }

    /// Builds the visual and collision meshes from the current grid.
    pub fn setup(&mut self, registry: &BlockRegistry) -> Result<(), VoxelError> {
        let (visual, collision) = meshing::generate_chunk_meshes(self, registry)?;
        self.install_meshes(visual, collision);
        Ok(())
    }

    /// Stores meshes that were generated elsewhere, e.g. on a worker thread.
    pub fn install_meshes(&mut self, visual: ChunkMesh, collision: ChunkMesh) {
        self.visual_mesh = Some(Arc::new(visual));
        self.collision_mesh = Some(Arc::new(collision));
        self.mesh_built = true;
    }

    /// Drops both meshes.
    pub fn teardown(&mut self) {
        self.visual_mesh = None;
        self.collision_mesh = None;
        self.mesh_built = false;
    }

    pub fn visual_mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.visual_mesh.as_ref()
    }

    pub fn collision_mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.collision_mesh.as_ref()
    }

    /// Translation of this chunk in world space (`position * CHUNK_DIMENSION`).
    pub fn world_placement(&self) -> Vector3<f32> {
        let dimension = CHUNK_DIMENSION as f32;
        Vector3::new(
            self.position.x as f32 * dimension,
            self.position.y as f32 * dimension,
            self.position.z as f32 * dimension,
        )
    }

    /// A copy of the block data without meshes, used for saving and for meshing
    /// on worker threads.
    pub fn snapshot(&self) -> VoxelChunk {
        VoxelChunk {
            position: self.position,
            blocks: self.blocks.clone(),
            loaded: self.loaded,
            mesh_built: false,
            visual_mesh: None,
            collision_mesh: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::STONE;

    #[test]
    fn new_chunks_are_air_and_unloaded() {
        let chunk = VoxelChunk::new(Point3::new(1, 2, 3));
        assert!(chunk.blocks().iter().all(|&id| id == AIR_BLOCK_ID));
        assert!(!chunk.is_loaded());
        assert!(!chunk.is_mesh_built());

        let stone = VoxelChunk::filled(Point3::new(0, 0, 0), STONE.id);
        assert!(stone.blocks().iter().all(|&id| id == STONE.id));
        assert!(!stone.is_loaded());
    }

    #[test]
    fn storage_is_x_major() {
        let mut chunk = VoxelChunk::new(Point3::new(0, 0, 0));
        chunk.set_block(1, 2, 3, STONE.id);
        assert_eq!(chunk.blocks()[1 + 2 * 16 + 3 * 256], STONE.id);
        assert_eq!(chunk.get_block(1, 2, 3), STONE.id);
    }

    #[test]
    #[should_panic]
    fn indexing_outside_the_grid_fails_fast() {
        let chunk = VoxelChunk::new(Point3::new(0, 0, 0));
        chunk.get_block(CHUNK_DIMENSION, 0, 0);
    }

    #[test]
    fn change_block_rejects_unknown_ids() {
        let registry = BlockRegistry::with_builtin_blocks();
        let mut chunk = VoxelChunk::new(Point3::new(0, 0, 0));
        assert_eq!(
            chunk.change_block(&registry, 0, 0, 0, 42),
            Err(VoxelError::UnknownBlockId(42))
        );
        assert_eq!(chunk.get_block(0, 0, 0), AIR_BLOCK_ID);
        chunk.change_block(&registry, 0, 0, 0, STONE.id).unwrap();
        assert_eq!(chunk.get_block(0, 0, 0), STONE.id);
    }

    #[test]
    fn setup_and_teardown_toggle_meshes() {
        let registry = BlockRegistry::with_builtin_blocks();
        let mut chunk = VoxelChunk::filled(Point3::new(0, 0, 0), STONE.id);
        chunk.setup(&registry).unwrap();
        assert!(chunk.is_mesh_built());
        assert!(chunk.visual_mesh().is_some());
        assert!(chunk.collision_mesh().is_some());

        chunk.teardown();
        assert!(!chunk.is_mesh_built());
        assert!(chunk.visual_mesh().is_none());
    }

    #[test]
    fn placement_scales_by_chunk_dimension() {
        let chunk = VoxelChunk::new(Point3::new(2, -1, 3));
        assert_eq!(chunk.world_placement(), Vector3::new(32.0, -16.0, 48.0));
    }
}
