//! Mesh data records for voxel chunks.
//!
//! A [`ChunkMesh`] is plain data: vertex attributes plus one triangle-index list per
//! block id. It owns no GPU or collider resources; the rendering collaborator
//! uploads it and is responsible for disposal.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::engine_state::{rendering::Vertex, voxels::block::BlockId};

use super::MeshKind;

/// Triangles that share one texture, i.e. one draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    /// The block id whose texture these faces use
    pub block_id: BlockId,
    /// Triangle list indices into the parent mesh's vertices
    pub indices: Vec<u32>,
}

/// Axis-aligned bounds of a mesh in chunk-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

/// The geometry generated for one chunk and one mesh kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    /// Which predicate produced this mesh
    pub kind: MeshKind,
    /// Four vertices per emitted face
    pub vertices: Vec<Vertex>,
    /// One sub-mesh per block id, in ascending id order
    pub sub_meshes: Vec<SubMesh>,
    /// Bounds of all vertices, `None` for an empty mesh
    pub bounds: Option<Aabb>,
}

impl ChunkMesh {
    /// Creates an empty mesh of the given kind.
    pub fn empty(kind: MeshKind) -> Self {
        ChunkMesh {
            kind,
            vertices: Vec::new(),
            sub_meshes: Vec::new(),
            bounds: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of quads in the mesh.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn triangle_count(&self) -> usize {
        self.sub_meshes
            .iter()
            .map(|sub_mesh| sub_mesh.indices.len() / 3)
            .sum()
    }

    /// The sub-mesh for a block id, if any face used it.
    pub fn sub_mesh(&self, block_id: BlockId) -> Option<&SubMesh> {
        self.sub_meshes
            .iter()
            .find(|sub_mesh| sub_mesh.block_id == block_id)
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.vertices.iter().map(Vertex::position)
    }

    pub fn normals(&self) -> impl Iterator<Item = Vector3<f32>> + '_ {
        self.vertices.iter().map(Vertex::normal)
    }

    pub fn uvs(&self) -> impl Iterator<Item = [f32; 2]> + '_ {
        self.vertices.iter().map(|vertex| vertex.uv)
    }

    /// The vertex buffer as raw bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Rebuilds every vertex normal from the triangle topology.
    ///
    /// Each triangle contributes its counter-clockwise face normal to its three
    /// vertices; the sums are normalized afterwards. Vertices that no triangle
    /// references keep a zero normal.
    pub fn recalculate_normals(&mut self) {
        let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];

        for sub_mesh in &self.sub_meshes {
            for triangle in sub_mesh.indices.chunks_exact(3) {
                let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
                let pa = self.vertices[a].position();
                let pb = self.vertices[b].position();
                let pc = self.vertices[c].position();
                let face_normal = (pb - pa).cross(pc - pa);
                sums[a] += face_normal;
                sums[b] += face_normal;
                sums[c] += face_normal;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = if sum.magnitude2() > 0.0 {
                sum.normalize().into()
            } else {
                [0.0; 3]
            };
        }
    }

    /// Recomputes `bounds` from the vertex positions.
    pub fn recalculate_bounds(&mut self) {
        let bounds = {
            let mut positions = self.positions();
            positions.next().map(|first| {
                let (min, max) = positions.fold((first, first), |(min, max), p| {
                    (
                        Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                        Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
                    )
                });
                Aabb { min, max }
            })
        };
        self.bounds = bounds;
    }
}
