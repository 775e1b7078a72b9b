//! # Engine State Module
//!
//! The voxel world and everything that keeps it streamed around players.
//!
//! ## Key Components
//!
//! * `EngineState` - Drives a streaming controller once per tick and forwards
//!   mesh hand-offs to the rendering collaborator
//! * `voxels` - Blocks, chunks, columns, regions, generation and persistence
//! * `rendering` - Face-culled mesh generation and render commands
//! * `streaming` - Reference-counted column streaming for servers and clients
//! * `task_management` - Worker threads for off-thread meshing
//! * `error` - Error types shared by the modules above
//!
//! ## Architecture
//!
//! Player movement only enqueues work. Each `tick` drains the streaming queues
//! with a fixed budget, then hands every render command produced during the
//! tick to the collaborator on the calling thread. The collaborator owns GPU
//! and physics resources; this crate never touches them.

use log::{info, warn};
use web_time::{Duration, Instant};

use rendering::RenderCollaborator;
use streaming::{StreamingController, TickSummary};

use crate::config::WorldConfig;

pub mod error;
pub mod rendering;
pub mod streaming;
pub mod task_management;
pub mod voxels;

pub use voxels::{CHUNK_DIMENSION, COLUMN_HEIGHT, REGION_DIMENSION};

/// Couples a streaming controller with the collaborator receiving its meshes.
///
/// # Examples
///
/// ```ignore
/// let registry = Arc::new(config.build_registry()?);
/// let mut server = ServerStreamingController::new(&config, registry);
/// server.add_player(1, Point2::new(0, 0))?;
///
/// let mut engine = EngineState::new(&config, server, LoggingRenderer::default());
/// loop {
///     engine.tick();
/// }
/// ```
pub struct EngineState<C: StreamingController, R: RenderCollaborator> {
    controller: C,
    renderer: R,
    autosave_interval: Duration,
    last_autosave: Instant,
}

impl<C: StreamingController, R: RenderCollaborator> EngineState<C, R> {
    pub fn new(config: &WorldConfig, controller: C, renderer: R) -> Self {
        EngineState {
            controller,
            renderer,
            autosave_interval: Duration::from_secs(config.autosave_interval_secs),
            last_autosave: Instant::now(),
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Runs one streaming tick and flushes the resulting render commands.
    pub fn tick(&mut self) -> TickSummary {
        let summary = self.controller.update();

        if !self.autosave_interval.is_zero() && self.last_autosave.elapsed() >= self.autosave_interval {
            self.controller.core_mut().queue_autosave();
            self.last_autosave = Instant::now();
        }

        self.flush_render_commands();
        summary
    }

    /// Ticks until every queue is empty and no mesh task is outstanding, or
    /// `max_ticks` have run.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.controller.core().has_pending_work() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Saves every modified column. Call before dropping the engine.
    pub fn shutdown(&mut self) {
        info!("Saving world");
        if let Err(err) = self.controller.core_mut().save_all() {
            warn!("Saving world failed: {err}");
        }
        self.flush_render_commands();
    }

    fn flush_render_commands(&mut self) {
        for command in self.controller.core_mut().take_render_commands() {
            self.renderer.apply(command);
        }
    }
}
