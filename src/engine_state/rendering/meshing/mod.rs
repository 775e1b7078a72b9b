//! Face-culling mesh generation for voxel chunks.
//!
//! This module converts a chunk's block grid into the two meshes the host engine
//! needs: a visual mesh for drawing and a collision mesh for physics. Both are
//! produced by the same algorithm and differ only in the face-visibility
//! predicate:
//!
//! - **Visual**: a face of cell `v` towards neighbor `n` is emitted when `v` is
//!   opaque and `n` is transparent or outside the chunk.
//! - **Collision**: a face is emitted when `v` is solid and `n` is not solid or is
//!   outside the chunk.
//!
//! Cells on the chunk boundary always treat the missing neighbor as exposed; there
//! is no wrap-around and no lookup into adjacent chunks.
//!
//! # Algorithm
//! 1. Count pass: visit every cell and count exposed faces per block id.
//! 2. Allocate vertex storage for `4 * faces` and one index bucket per block id.
//! 3. Fill pass: visit the cells again in the same order, emitting a unit quad,
//!    outward-facing triangles, UVs and the face normal for every exposed face.
//! 4. Assemble sub-meshes and compute normals and bounds from the final topology.

use std::collections::BTreeMap;

use cgmath::Point3;

mod chunk_mesh;
mod occupancy;
mod texture_buckets;

pub use chunk_mesh::{Aabb, ChunkMesh, SubMesh};
pub use occupancy::OccupancyMasks;
pub use texture_buckets::{TextureBuckets, INDICES_PER_FACE};

use crate::engine_state::{
    error::VoxelError,
    rendering::Vertex,
    voxels::{
        block::{block_side::BlockSide, BlockId, BlockRegistry},
        chunk::{VoxelChunk, CHUNK_DIMENSION},
    },
};

/// Vertices per emitted quad.
pub const VERTICES_PER_FACE: usize = 4;

/// Texture coordinates assigned to the four corners of every face.
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

/// Selects which face-visibility predicate a mesh is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Visual,
    Collision,
}

impl MeshKind {
    /// Whether the face between `cell` and `neighbor` (`None` when outside the
    /// chunk) should be emitted.
    #[inline]
    pub fn face_exposed(self, masks: &OccupancyMasks, cell: usize, neighbor: Option<usize>) -> bool {
        match self {
            MeshKind::Visual => {
                masks.is_opaque(cell) && neighbor.map_or(true, |n| !masks.is_opaque(n))
            }
            MeshKind::Collision => {
                masks.is_solid(cell) && neighbor.map_or(true, |n| !masks.is_solid(n))
            }
        }
    }
}

/// Result of the count pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceCount {
    pub total: usize,
    pub per_block: BTreeMap<BlockId, usize>,
}

fn neighbor_index(side: BlockSide, cell: Point3<usize>) -> Option<usize> {
    side.neighbor(cell.x, cell.y, cell.z, CHUNK_DIMENSION)
        .map(|n| VoxelChunk::index(n.x, n.y, n.z))
}

/// Counts the faces `kind` would emit for `chunk`.
pub fn count_faces(chunk: &VoxelChunk, masks: &OccupancyMasks, kind: MeshKind) -> FaceCount {
    let mut count = FaceCount::default();
    for (index, (cell, block_id)) in chunk.cells().enumerate() {
        let exposed = BlockSide::all()
            .into_iter()
            .filter(|&side| kind.face_exposed(masks, index, neighbor_index(side, cell)))
            .count();
        if exposed > 0 {
            count.total += exposed;
            *count.per_block.entry(block_id).or_default() += exposed;
        }
    }
    count
}

/// Builds one mesh of `kind` from resolved occupancy masks.
pub fn build_mesh(chunk: &VoxelChunk, masks: &OccupancyMasks, kind: MeshKind) -> ChunkMesh {
    let count = count_faces(chunk, masks, kind);
    if count.total == 0 {
        return ChunkMesh::empty(kind);
    }

    let mut vertices = Vec::with_capacity(count.total * VERTICES_PER_FACE);
    let mut buckets = TextureBuckets::with_face_counts(&count.per_block);

    for (index, (cell, block_id)) in chunk.cells().enumerate() {
        for side in BlockSide::all() {
            if !kind.face_exposed(masks, index, neighbor_index(side, cell)) {
                continue;
            }

            let first_vertex = vertices.len() as u32;
            let normal = side.outward_normal();
            for (corner, uv) in side.quad_corners(cell.x, cell.y, cell.z).into_iter().zip(FACE_UVS) {
                vertices.push(Vertex::new(corner, normal, uv));
            }
            buckets.push_face(block_id, first_vertex, side.winding().triangle_offsets());
        }
    }
    debug_assert_eq!(vertices.len(), count.total * VERTICES_PER_FACE);

    let mut mesh = ChunkMesh {
        kind,
        vertices,
        sub_meshes: buckets.into_sub_meshes(),
        bounds: None,
    };
    mesh.recalculate_normals();
    mesh.recalculate_bounds();
    mesh
}

/// Generates a single mesh of `kind` for `chunk`.
pub fn generate_mesh(
    chunk: &VoxelChunk,
    registry: &BlockRegistry,
    kind: MeshKind,
) -> Result<ChunkMesh, VoxelError> {
    let masks = OccupancyMasks::resolve(chunk, registry)?;
    Ok(build_mesh(chunk, &masks, kind))
}

/// Generates the visual and collision meshes for `chunk`, resolving block
/// properties only once.
pub fn generate_chunk_meshes(
    chunk: &VoxelChunk,
    registry: &BlockRegistry,
) -> Result<(ChunkMesh, ChunkMesh), VoxelError> {
    let masks = OccupancyMasks::resolve(chunk, registry)?;
    Ok((
        build_mesh(chunk, &masks, MeshKind::Visual),
        build_mesh(chunk, &masks, MeshKind::Collision),
    ))
}
