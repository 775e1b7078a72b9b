use std::sync::Arc;

use cgmath::Point2;
use log::info;

use super::{
    coords::{footprint, in_footprint},
    PlayerId, QueueKind, RenderWindow, StreamingController, StreamingCore,
};
use crate::{
    config::WorldConfig,
    engine_state::{error::VoxelError, voxels::block::BlockRegistry},
};

/// Streams columns around the local player.
///
/// The load footprint keeps columns resident; the smaller render window
/// decides which of them get meshes. Columns leaving the window are torn down
/// but stay in memory until they also leave the load footprint.
pub struct ClientStreamingController {
    core: StreamingCore,
    player: PlayerId,
    position: Option<Point2<i32>>,
}

impl ClientStreamingController {
    pub fn new(config: &WorldConfig, registry: Arc<BlockRegistry>, player: PlayerId) -> Self {
        Self::from_core(StreamingCore::new(config, registry), player)
    }

    pub fn from_core(mut core: StreamingCore, player: PlayerId) -> Self {
        core.set_render_window(RenderWindow::Nowhere);
        ClientStreamingController {
            core,
            player,
            position: None,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn position(&self) -> Option<Point2<i32>> {
        self.position
    }

    /// Places the local player in the world.
    pub fn spawn(&mut self, column: Point2<i32>) -> Result<(), VoxelError> {
        if self.position.is_some() {
            return Err(VoxelError::DuplicatePlayerId(self.player));
        }
        self.position = Some(column);
        self.core.set_render_window(RenderWindow::Around(column));
        self.core
            .enqueue(QueueKind::Load, footprint(column, self.core.load_radius()));
        info!("Spawned at column ({}, {})", column.x, column.y);
        Ok(())
    }

    /// Removes the local player, releasing everything it kept resident.
    pub fn despawn(&mut self) -> Result<(), VoxelError> {
        let column = self
            .position
            .take()
            .ok_or(VoxelError::UnknownPlayerId(self.player))?;
        self.core
            .enqueue(QueueKind::Unload, footprint(column, self.core.load_radius()));
        self.core.set_render_window(RenderWindow::Nowhere);
        Ok(())
    }

    /// Moves the local player, shifting both the load footprint and the render
    /// window.
    pub fn move_to(&mut self, column: Point2<i32>) -> Result<(), VoxelError> {
        let previous = self
            .position
            .ok_or(VoxelError::UnknownPlayerId(self.player))?;
        if previous == column {
            return Ok(());
        }
        self.position = Some(column);

        let load_radius = self.core.load_radius();
        let render_radius = self.core.render_radius();
        self.core
            .enqueue(QueueKind::Unload, footprint(previous, load_radius));
        self.core
            .enqueue(QueueKind::Load, footprint(column, load_radius));

        let leaving = footprint(previous, render_radius)
            .filter(|&c| !in_footprint(column, render_radius, c));
        let entering = footprint(column, render_radius)
            .filter(|&c| !in_footprint(previous, render_radius, c));
        self.core.enqueue(QueueKind::Teardown, leaving);
        self.core.enqueue(QueueKind::Setup, entering);
        self.core.set_render_window(RenderWindow::Around(column));
        Ok(())
    }
}

impl StreamingController for ClientStreamingController {
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
        if let Some(&(id, _)) = positions.iter().find(|&&(id, _)| id != self.player) {
            return Err(VoxelError::UnknownPlayerId(id));
        }
        match positions.last() {
            Some(&(_, column)) => self.move_to(column),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::streaming::test_support::flat_core;

    fn client() -> ClientStreamingController {
        let mut client = ClientStreamingController::from_core(flat_core(3, 1, 1024), 1);
        client.spawn(Point2::new(0, 0)).unwrap();
        client.update();
        client
    }

    fn meshed(client: &ClientStreamingController) -> Vec<Point2<i32>> {
        let mut meshed: Vec<_> = client
            .core()
            .columns()
            .iter()
            .filter(|column| column.is_set_up())
            .map(|column| column.position())
            .collect();
        meshed.sort_by_key(|p| (p.y, p.x));
        meshed
    }

    #[test]
    fn only_the_render_window_is_meshed() {
        let client = client();
        assert_eq!(client.core().columns().len(), 36);
        assert_eq!(
            meshed(&client),
            vec![
                Point2::new(-1, -1),
                Point2::new(0, -1),
                Point2::new(-1, 0),
                Point2::new(0, 0)
            ]
        );
    }

    #[test]
    fn moving_shifts_the_render_window() {
        let mut client = client();
        client.core_mut().take_render_commands();

        client.move_to(Point2::new(1, 0)).unwrap();
        client.update();

        assert_eq!(
            meshed(&client),
            vec![
                Point2::new(0, -1),
                Point2::new(1, -1),
                Point2::new(0, 0),
                Point2::new(1, 0)
            ]
        );
        // Left the window but still inside the load footprint.
        let left_behind = client.core().columns().get(Point2::new(-1, 0)).unwrap();
        assert!(!left_behind.is_set_up());
        assert!(left_behind.is_wanted());

        let commands = client.core_mut().take_render_commands();
        assert_eq!(commands.iter().filter(|c| c.is_present()).count(), 32);
        assert_eq!(commands.iter().filter(|c| !c.is_present()).count(), 32);
    }

    #[test]
    fn nothing_is_meshed_before_spawning() {
        let mut client = ClientStreamingController::from_core(flat_core(2, 1, 64), 3);
        client.core().enqueue(QueueKind::Load, [Point2::new(0, 0)]);
        client.update();
        assert!(meshed(&client).is_empty());
    }

    #[test]
    fn other_players_are_rejected() {
        let mut client = client();
        assert_eq!(
            client.update_player_locations(&[(2, Point2::new(1, 1))]),
            Err(VoxelError::UnknownPlayerId(2))
        );
        assert_eq!(client.spawn(Point2::new(5, 5)), Err(VoxelError::DuplicatePlayerId(1)));

        client.update_player_locations(&[(1, Point2::new(0, 1))]).unwrap();
        assert_eq!(client.position(), Some(Point2::new(0, 1)));

        client.despawn().unwrap();
        assert_eq!(client.despawn(), Err(VoxelError::UnknownPlayerId(1)));
        assert_eq!(client.move_to(Point2::new(0, 0)), Err(VoxelError::UnknownPlayerId(1)));
    }
}
