use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point2;
use log::{debug, info};

use super::{coords::footprint, PlayerId, QueueKind, StreamingController, StreamingCore};
use crate::{
    config::WorldConfig,
    engine_state::{error::VoxelError, voxels::block::BlockRegistry},
};

/// Streams columns for many players at once.
///
/// Every tracked player keeps the columns of its load footprint resident. A
/// column wanted by several players is loaded once and reference counted.
pub struct ServerStreamingController {
    core: StreamingCore,
    players: HashMap<PlayerId, Point2<i32>>,
}

impl ServerStreamingController {
    pub fn new(config: &WorldConfig, registry: Arc<BlockRegistry>) -> Self {
        Self::from_core(StreamingCore::new(config, registry))
    }

    pub fn from_core(core: StreamingCore) -> Self {
        ServerStreamingController {
            core,
            players: HashMap::new(),
        }
    }

    /// Starts tracking a player and queues its footprint for loading.
    pub fn add_player(&mut self, id: PlayerId, column: Point2<i32>) -> Result<(), VoxelError> {
        if self.players.contains_key(&id) {
            return Err(VoxelError::DuplicatePlayerId(id));
        }
        self.players.insert(id, column);
        self.core
            .enqueue(QueueKind::Load, footprint(column, self.core.load_radius()));
        info!("Player {id} joined at column ({}, {})", column.x, column.y);
        Ok(())
    }

    /// Stops tracking a player and queues its footprint for unloading.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), VoxelError> {
        let column = self
            .players
            .remove(&id)
            .ok_or(VoxelError::UnknownPlayerId(id))?;
        self.core
            .enqueue(QueueKind::Unload, footprint(column, self.core.load_radius()));
        info!("Player {id} left from column ({}, {})", column.x, column.y);
        Ok(())
    }

    pub fn player_position(&self, id: PlayerId) -> Option<Point2<i32>> {
        self.players.get(&id).copied()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl StreamingController for ServerStreamingController {
    fn core(&self) -> &StreamingCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StreamingCore {
        &mut self.core
    }

    fn update_player_locations(
        &mut self,
        positions: &[(PlayerId, Point2<i32>)],
    ) -> Result<(), VoxelError> {
        if let Some(&(id, _)) = positions.iter().find(|(id, _)| !self.players.contains_key(id)) {
            return Err(VoxelError::UnknownPlayerId(id));
        }

        let radius = self.core.load_radius();
        for &(id, column) in positions {
            let Some(previous) = self.players.insert(id, column) else {
                continue;
            };
            if previous == column {
                continue;
            }
            debug!(
                "Player {id} moved from ({}, {}) to ({}, {})",
                previous.x, previous.y, column.x, column.y
            );
            self.core.enqueue(QueueKind::Unload, footprint(previous, radius));
            self.core.enqueue(QueueKind::Load, footprint(column, radius));
        }
        Ok(())
    }
}
