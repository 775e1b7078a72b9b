//! Triangle-index buckets keyed by block id.
//!
//! Faces are grouped by the block that owns them so the renderer can issue one
//! draw call per texture. Buckets are sized from the count pass, so the fill pass
//! never reallocates.

use std::collections::BTreeMap;

use crate::engine_state::voxels::block::BlockId;

use super::SubMesh;

/// Indices per quad (two triangles).
pub const INDICES_PER_FACE: usize = 6;

/// Collects triangle indices per block id.
pub struct TextureBuckets {
    buckets: BTreeMap<BlockId, Vec<u32>>,
}

impl TextureBuckets {
    /// Allocates one bucket per block id with room for `faces` quads each.
    pub fn with_face_counts(face_counts: &BTreeMap<BlockId, usize>) -> Self {
        let buckets = face_counts
            .iter()
            .map(|(&block_id, &faces)| (block_id, Vec::with_capacity(faces * INDICES_PER_FACE)))
            .collect();
        TextureBuckets { buckets }
    }

    /// Appends the two triangles of one face to the bucket of `block_id`.
    pub fn push_face(&mut self, block_id: BlockId, first_vertex: u32, offsets: [u32; 6]) {
        self.buckets
            .entry(block_id)
            .or_default()
            .extend(offsets.map(|offset| first_vertex + offset));
    }

    /// Converts the buckets into sub-meshes, dropping empty ones.
    pub fn into_sub_meshes(self) -> Vec<SubMesh> {
        self.buckets
            .into_iter()
            .filter(|(_, indices)| !indices.is_empty())
            .map(|(block_id, indices)| SubMesh { block_id, indices })
            .collect()
    }
}
