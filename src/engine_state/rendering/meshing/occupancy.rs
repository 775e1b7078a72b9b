//! Per-cell block properties resolved once before meshing.
//!
//! Neighbor checks run six times per cell, so instead of asking the registry each
//! time the mesher resolves every cell's solidity and opacity into two bit
//! vectors up front. Each distinct block id is looked up only once per chunk.

use std::collections::HashMap;

use bitvec::prelude::BitVec;

use crate::engine_state::{
    error::VoxelError,
    voxels::{
        block::{BlockCatalogEntry, BlockId, BlockRegistry},
        chunk::{VoxelChunk, CHUNK_SIZE},
    },
};

/// Solidity and opacity of every cell of a chunk, indexed like the chunk grid.
pub struct OccupancyMasks {
    solid: BitVec,
    opaque: BitVec,
}

impl OccupancyMasks {
    /// Resolves the masks for `chunk`.
    ///
    /// # Errors
    /// Fails with [`VoxelError::UnknownBlockId`] if the chunk references a block that
    /// is not in `registry`.
    pub fn resolve(chunk: &VoxelChunk, registry: &BlockRegistry) -> Result<Self, VoxelError> {
        let mut solid = BitVec::with_capacity(CHUNK_SIZE);
        let mut opaque = BitVec::with_capacity(CHUNK_SIZE);
        let mut resolved: HashMap<BlockId, &BlockCatalogEntry> = HashMap::new();

        for &block_id in chunk.blocks() {
            let entry = match resolved.get(&block_id) {
                Some(entry) => *entry,
                None => {
                    let entry = registry.lookup(block_id)?;
                    resolved.insert(block_id, entry);
                    entry
                }
            };
            solid.push(entry.is_solid());
            opaque.push(!entry.is_transparent());
        }

        Ok(OccupancyMasks { solid, opaque })
    }

    #[inline]
    pub fn is_solid(&self, index: usize) -> bool {
        self.solid[index]
    }

    #[inline]
    pub fn is_opaque(&self, index: usize) -> bool {
        self.opaque[index]
    }
}
