//! Task for generating the meshes of a whole column in a background thread.
//!
//! The task owns snapshots of the column's chunks, so the resident column can
//! keep changing while the worker meshes. The result is only installed if the
//! column is still resident and has been neither torn down nor edited since
//! the task was created. An edit restarts the task from fresh snapshots.

use std::sync::Arc;

use cgmath::Point2;
use log::error;

use crate::engine_state::{
    error::VoxelError,
    rendering::{
        meshing::{generate_chunk_meshes, ChunkMesh},
        present_column, RenderCommand,
    },
    task_management::task::{Task, TaskResult},
    voxels::{block::BlockRegistry, chunk::VoxelChunk, world::ResidentColumns},
};

/// Builds visual and collision meshes for every chunk of a column.
pub struct ChunkMeshGenerationTask {
    /// The block catalog shared with the driving thread
    registry: Arc<BlockRegistry>,
    /// The column the meshes belong to
    column: Point2<i32>,
    /// Setup generation of the column when the task was created
    generation: u64,
    /// Block data to mesh, bottom to top
    chunks: Vec<VoxelChunk>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new mesh generation task.
    ///
    /// # Arguments
    /// * `registry` - Block catalog used to resolve solidity and transparency
    /// * `column` - Position of the column being meshed
    /// * `generation` - Token from `ChunkColumn::begin_async_setup`
    /// * `chunks` - Snapshots of the column's chunks
    pub fn new(
        registry: Arc<BlockRegistry>,
        column: Point2<i32>,
        generation: u64,
        chunks: Vec<VoxelChunk>,
    ) -> Self {
        ChunkMeshGenerationTask {
            registry,
            column,
            generation,
            chunks,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let meshes = self
            .chunks
            .iter()
            .map(|chunk| generate_chunk_meshes(chunk, &self.registry))
            .collect();

        Box::new(ChunkMeshGenerationTaskResult {
            registry: Arc::clone(&self.registry),
            column: self.column,
            generation: self.generation,
            meshes,
        })
    }
}

/// The meshes built by a [`ChunkMeshGenerationTask`].
pub struct ChunkMeshGenerationTaskResult {
    registry: Arc<BlockRegistry>,
    column: Point2<i32>,
    generation: u64,
    meshes: Result<Vec<(ChunkMesh, ChunkMesh)>, VoxelError>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    /// Installs the meshes into the resident column and queues `Present`
    /// commands for it. Results for a torn down column are dropped, results
    /// for an edited column are rebuilt, and failures clear the pending flag.
    fn handle_result(
        self: Box<Self>,
        columns: &mut ResidentColumns,
        outbox: &mut Vec<RenderCommand>,
    ) -> Vec<Box<dyn Task + Send>> {
        let Some(column) = columns.get_mut(self.column) else {
            return Vec::new();
        };

        match self.meshes {
            Ok(meshes) => {
                if column.install_meshes(self.generation, meshes) {
                    outbox.extend(present_column(column));
                } else if column.is_setup_pending() {
                    let generation = column.begin_async_setup();
                    return vec![Box::new(ChunkMeshGenerationTask::new(
                        self.registry,
                        self.column,
                        generation,
                        column.chunk_snapshots(),
                    ))];
                }
            }
            Err(err) => {
                error!(
                    "Meshing column ({}, {}) failed: {err}",
                    self.column.x, self.column.y
                );
                column.cancel_async_setup(self.generation);
            }
        }
        Vec::new()
    }
}
