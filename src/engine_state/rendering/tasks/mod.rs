//! Background tasks for the rendering hand-off.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: builds the meshes of a column on a worker thread

pub mod chunk_mesh_generation_task;

pub use chunk_mesh_generation_task::ChunkMeshGenerationTask;
