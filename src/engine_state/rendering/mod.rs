//! Rendering hand-off for the voxel world.
//!
//! This module turns chunk block data into mesh records and hands them to the
//! host engine. The host renderer and physics engine are external collaborators:
//! they receive [`RenderCommand`]s through [`RenderCollaborator::apply`] and own
//! every GPU buffer, collider and scene object created from them.
//!
//! Commands are collected in an outbox while the streaming pipeline drains its
//! queues and flushed on the thread that owns the collaborator.

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::debug;

use super::voxels::column::ChunkColumn;

pub mod meshing;
pub mod tasks;
mod vertex;

pub use meshing::{ChunkMesh, MeshKind};
pub use vertex::Vertex;

/// An instruction for the rendering collaborator.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Show a chunk, replacing whatever was shown for it before.
    Present {
        chunk: Point3<i32>,
        /// World-space translation, `chunk * CHUNK_DIMENSION`
        placement: Vector3<f32>,
        visual: Arc<ChunkMesh>,
        collision: Arc<ChunkMesh>,
    },
    /// Remove a chunk's renderable object and collider.
    Release { chunk: Point3<i32> },
}

impl RenderCommand {
    /// The chunk this command is about.
    pub fn chunk(&self) -> Point3<i32> {
        match self {
            RenderCommand::Present { chunk, .. } | RenderCommand::Release { chunk } => *chunk,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, RenderCommand::Present { .. })
    }
}

/// `Present` commands for every meshed chunk of a column.
pub fn present_column(column: &ChunkColumn) -> impl Iterator<Item = RenderCommand> + '_ {
    column.chunks().iter().filter_map(|chunk| {
        let visual = chunk.visual_mesh()?;
        let collision = chunk.collision_mesh()?;
        Some(RenderCommand::Present {
            chunk: chunk.position,
            placement: chunk.world_placement(),
            visual: Arc::clone(visual),
            collision: Arc::clone(collision),
        })
    })
}

/// `Release` commands for every chunk of a column.
pub fn release_column(column: &ChunkColumn) -> impl Iterator<Item = RenderCommand> + '_ {
    column
        .chunks()
        .iter()
        .map(|chunk| RenderCommand::Release {
            chunk: chunk.position,
        })
}

/// The host engine side of the mesh hand-off.
pub trait RenderCollaborator {
    fn apply(&mut self, command: RenderCommand);
}

/// A collaborator that only logs what it receives. Used by the headless demo.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    pub presented: usize,
    pub released: usize,
    pub faces: usize,
}

impl RenderCollaborator for LoggingRenderer {
    fn apply(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::Present {
                chunk,
                visual,
                collision,
                ..
            } => {
                self.presented += 1;
                self.faces += visual.face_count();
                debug!(
                    "Present chunk ({}, {}, {}): {} visual / {} collision faces",
                    chunk.x,
                    chunk.y,
                    chunk.z,
                    visual.face_count(),
                    collision.face_count()
                );
            }
            RenderCommand::Release { chunk } => {
                self.released += 1;
                debug!("Release chunk ({}, {}, {})", chunk.x, chunk.y, chunk.z);
            }
        }
    }
}
