//! # Voxel World
//!
//! A chunked voxel world that streams itself around players.
//!
//! The world is a grid of `16x16x16` chunks stacked into columns and grouped
//! into regions. Columns are loaded from region files or generated on demand,
//! meshed with per-face culling, handed to an external renderer, and saved and
//! evicted once no player needs them.
//!
//! ## Key Modules
//!
//! * `config` - JSON world configuration with defaults for every field
//! * `core` - Shared-state primitives used throughout the crate
//! * `engine_state` - Voxel data, meshing, streaming and task management
//!
//! ## Usage
//!
//! ```ignore
//! fn main() {
//!     voxel_world::run();
//! }
//! ```
//!
//! Passing a path as the first argument loads a [`config::WorldConfig`] from
//! that JSON file.

use std::{path::Path, sync::Arc};

use cgmath::Point2;
use log::{error, info};

pub mod config;
pub mod core;
pub mod engine_state;

use config::WorldConfig;
use engine_state::{
    rendering::LoggingRenderer,
    streaming::{ServerStreamingController, StreamingController},
    EngineState,
};

/// Ticks the headless demo runs while players walk around.
const DEMO_TICKS: i32 = 24;

/// Starts logging, loads the configuration and runs a headless two-player
/// streaming session.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => match WorldConfig::from_file(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                error!("Could not read config {path}: {err}");
                return;
            }
        },
        None => WorldConfig::default(),
    };

    if let Err(err) = run_demo(&config) {
        error!("Demo stopped: {err}");
    }
}

fn run_demo(config: &WorldConfig) -> Result<(), engine_state::error::VoxelError> {
    let registry = Arc::new(config.build_registry()?);
    info!("Registered {} block types", registry.len());

    let mut server = ServerStreamingController::new(config, registry);
    server.add_player(1, Point2::new(0, 0))?;
    server.add_player(2, Point2::new(8, -3))?;

    let mut engine = EngineState::new(config, server, LoggingRenderer::default());
    for tick in 0..DEMO_TICKS {
        engine.controller_mut().update_player_locations(&[
            (1, Point2::new(tick / 4, 0)),
            (2, Point2::new(8, -3 + tick / 6)),
        ])?;
        let summary = engine.tick();
        info!("Tick {tick}: {summary:?}");
    }
    engine.run_until_idle(64);

    let renderer = engine.renderer();
    info!(
        "Presented {} chunks ({} faces), released {}",
        renderer.presented, renderer.faces, renderer.released
    );
    info!(
        "{} columns resident",
        engine.controller().core().columns().len()
    );

    engine.shutdown();
    Ok(())
}
