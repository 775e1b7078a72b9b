/// Integration tests for chunk meshing
/// These check face counts against the culling rules for full, empty and mixed chunks
use cgmath::Point3;
use voxel_world::engine_state::{
    error::VoxelError,
    rendering::meshing::{generate_chunk_meshes, generate_mesh},
    rendering::MeshKind,
    voxels::{
        block::{
            block_type::{AIR, DIRT, STONE},
            BlockCatalogEntry, BlockId, BlockRegistry,
        },
        chunk::{VoxelChunk, CHUNK_DIMENSION},
    },
};

const GLASS: BlockId = 10;

fn registry_with_glass() -> BlockRegistry {
    let mut registry = BlockRegistry::with_builtin_blocks();
    registry
        .register(BlockCatalogEntry::new(GLASS, "BlockGlass", true, true))
        .unwrap();
    registry
}

#[test]
fn solid_chunk_only_has_boundary_faces() {
    let registry = BlockRegistry::with_builtin_blocks();
    let chunk = VoxelChunk::filled(Point3::new(0, 0, 0), STONE.id);
    let (visual, collision) = generate_chunk_meshes(&chunk, &registry).unwrap();

    let boundary = 6 * CHUNK_DIMENSION * CHUNK_DIMENSION;
    assert_eq!(visual.face_count(), boundary);
    assert_eq!(collision.face_count(), boundary);
    assert_eq!(visual.triangle_count(), 2 * boundary);
}

#[test]
fn empty_chunk_has_no_faces() {
    let registry = BlockRegistry::with_builtin_blocks();
    let chunk = VoxelChunk::new(Point3::new(4, -2, 1));
    let (visual, collision) = generate_chunk_meshes(&chunk, &registry).unwrap();
    assert!(visual.is_empty());
    assert!(collision.is_empty());
}

#[test]
fn adjacent_blocks_hide_their_shared_faces() {
    let registry = BlockRegistry::with_builtin_blocks();
    let mut chunk = VoxelChunk::new(Point3::new(0, 0, 0));
    chunk.set_block(3, 3, 3, STONE.id);
    chunk.set_block(3, 3, 4, DIRT.id);

    let mesh = generate_mesh(&chunk, &registry, MeshKind::Visual).unwrap();
    assert_eq!(mesh.face_count(), 10);
    assert_eq!(mesh.sub_mesh(STONE.id).unwrap().indices.len(), 5 * 6);
    assert_eq!(mesh.sub_mesh(DIRT.id).unwrap().indices.len(), 5 * 6);
    assert!(mesh.sub_mesh(AIR.id).is_none());
}

#[test]
fn glass_collides_but_does_not_occlude() {
    let registry = registry_with_glass();
    let mut chunk = VoxelChunk::new(Point3::new(0, 0, 0));
    chunk.set_block(5, 5, 5, STONE.id);
    chunk.set_block(6, 5, 5, GLASS);

    let (visual, collision) = generate_chunk_meshes(&chunk, &registry).unwrap();
    // The stone face against the glass stays visible; glass itself is not drawn.
    assert_eq!(visual.face_count(), 6);
    // Both blocks are solid, so they share a hidden collision face.
    assert_eq!(collision.face_count(), 10);
}

#[test]
fn unknown_blocks_fail_meshing() {
    let registry = BlockRegistry::with_builtin_blocks();
    let mut chunk = VoxelChunk::new(Point3::new(0, 0, 0));
    chunk.set_block(0, 0, 0, 999);
    assert_eq!(
        generate_chunk_meshes(&chunk, &registry).unwrap_err(),
        VoxelError::UnknownBlockId(999)
    );
}
