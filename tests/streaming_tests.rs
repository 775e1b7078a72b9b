/// Integration tests for column streaming
/// These drive the server and client controllers through whole ticks, with and
/// without a region store and worker threads
use std::{fs, path::PathBuf, sync::Arc};

use cgmath::Point2;
use voxel_world::{
    config::{GeneratorKind, WorldConfig},
    engine_state::{
        rendering::LoggingRenderer,
        streaming::{
            ClientStreamingController, QueueKind, ServerStreamingController, StreamingController,
        },
        voxels::block::{block_type::STONE, BlockRegistry},
        EngineState, COLUMN_HEIGHT,
    },
};

fn in_memory_config(load_radius: i32) -> WorldConfig {
    WorldConfig {
        load_radius,
        render_radius: load_radius,
        persistence: false,
        generator: GeneratorKind::Flat,
        ground_height: 8,
        drain_budget: 4096,
        ..WorldConfig::default()
    }
}

fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::with_builtin_blocks())
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "voxel-world-it-{name}-{}-{}",
        std::process::id(),
        fastrand::u64(..)
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn one_player_loads_one_hundred_columns() {
    let config = in_memory_config(5);
    let mut server = ServerStreamingController::new(&config, registry());
    server.add_player(1, Point2::new(0, 0)).unwrap();
    assert_eq!(server.core().queue_len(QueueKind::Load), 100);

    let summary = server.update();
    assert_eq!(summary.loaded, 100);
    assert_eq!(summary.set_up, 100);
    assert_eq!(server.core().columns().len(), 100);
    assert!(server.core().columns().iter().all(|c| c.is_set_up()));
}

#[test]
fn moving_one_column_swaps_a_single_row() {
    let config = in_memory_config(5);
    let mut server = ServerStreamingController::new(&config, registry());
    server.add_player(1, Point2::new(0, 0)).unwrap();
    server.update();
    server.core_mut().take_render_commands();

    server
        .update_player_locations(&[(1, Point2::new(1, 0))])
        .unwrap();
    assert_eq!(server.core().queue_len(QueueKind::Load), 100);
    assert_eq!(server.core().queue_len(QueueKind::Unload), 100);

    let summary = server.update();
    assert_eq!(summary.evicted, 10);
    assert_eq!(server.core().columns().len(), 100);
    assert!(server.core().columns().get(Point2::new(-5, 0)).is_none());
    assert!(server.core().columns().get(Point2::new(5, 0)).is_some());

    let commands = server.core_mut().take_render_commands();
    let presented = commands.iter().filter(|c| c.is_present()).count();
    let released = commands.len() - presented;
    assert_eq!(presented, 10 * COLUMN_HEIGHT);
    assert_eq!(released, 10 * COLUMN_HEIGHT);
}

#[test]
fn edits_survive_unloading_through_region_files() {
    let dir = scratch_dir("persist");
    let config = WorldConfig {
        persistence: true,
        region_root: dir.clone(),
        ..in_memory_config(1)
    };
    let edited = Point2::new(0, 0);

    let mut server = ServerStreamingController::new(&config, registry());
    server.add_player(1, edited).unwrap();
    server.update();
    server
        .core_mut()
        .columns_mut()
        .get_mut(edited)
        .unwrap()
        .chunk_mut(COLUMN_HEIGHT as i32 - 1)
        .unwrap()
        .set_block(7, 7, 7, STONE.id);

    server.remove_player(1).unwrap();
    server.update();
    assert!(server.core().columns().is_empty());
    server.core_mut().save_all().unwrap();
    assert!(dir.join("0,0.r").exists());

    // A fresh controller reads the column back instead of generating it.
    let mut server = ServerStreamingController::new(&config, registry());
    server.add_player(2, edited).unwrap();
    server.update();
    let column = server.core().columns().get(edited).unwrap();
    let top = column.chunk(COLUMN_HEIGHT as i32 - 1).unwrap();
    assert_eq!(top.get_block(7, 7, 7), STONE.id);
    assert!(!column.needs_save());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn worker_threads_mesh_columns() {
    let config = WorldConfig {
        mesh_workers: 2,
        ..in_memory_config(1)
    };
    let mut server = ServerStreamingController::new(&config, registry());
    server.add_player(1, Point2::new(0, 0)).unwrap();

    let mut engine = EngineState::new(&config, server, LoggingRenderer::default());
    let mut ticks = 0;
    while engine.renderer().presented < 4 * COLUMN_HEIGHT && ticks < 10_000 {
        engine.tick();
        std::thread::yield_now();
        ticks += 1;
    }

    assert_eq!(engine.renderer().presented, 4 * COLUMN_HEIGHT);
    assert!(engine
        .controller()
        .core()
        .columns()
        .iter()
        .all(|c| c.is_set_up()));
}

#[test]
fn client_meshes_its_render_window_only() {
    let config = WorldConfig {
        render_radius: 2,
        ..in_memory_config(4)
    };
    let mut client = ClientStreamingController::new(&config, registry(), 1);
    client.spawn(Point2::new(10, 10)).unwrap();
    client.update();

    let columns = client.core().columns();
    assert_eq!(columns.len(), 64);
    assert_eq!(columns.iter().filter(|c| c.is_set_up()).count(), 16);

    client.despawn().unwrap();
    client.update();
    assert!(client.core().columns().is_empty());
}
