//! # Streaming Pipeline
//!
//! Streaming decides which columns are in memory and which of them have
//! meshes, based on where players are.
//!
//! ## Pipeline
//!
//! Player movement enqueues column coordinates onto five queues. Each tick the
//! queues are drained in a fixed order, at most `drain_budget` entries each:
//!
//! 1. **Load**: bump the column's reference count, reading it from the region
//!    store or generating it if it is not resident yet
//! 2. **Unload**: drop one reference; a column reaching zero is queued for
//!    teardown and save
//! 3. **Setup**: build meshes for wanted columns (inline or on the worker pool)
//! 4. **Teardown**: release meshes of columns nobody wants anymore
//! 5. **Save**: write modified columns to the region store
//! 6. **Sweep**: drop idle, torn-down, saved columns from memory
//!
//! Loads run before unloads so a column in both the old and the new footprint
//! of a moving player never drops to zero references. Duplicate queue entries
//! are expected and every drain step is idempotent.
//!
//! ## Failures
//!
//! A column whose source fails is retried with exponential backoff
//! (`1 << attempts` ticks) up to `max_load_retries` times. Unload requests that
//! arrive meanwhile cancel the pending load. A coordinate neither the store nor
//! the generator can ever provide is dropped with a single warning.
//!
//! Given-up and unavailable coordinates still hold their request count, so
//! a later successful load admits the column with every reference owed to it
//! and later unloads release those references first. An unload drained before
//! its matching load is remembered and cancels that load when it arrives.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point2;
use log::{debug, error, info, warn};

pub mod client;
pub mod coords;
pub mod queues;
pub mod server;

pub use client::ClientStreamingController;
pub use queues::{ChunkQueues, QueueKind};
pub use server::ServerStreamingController;

use self::coords::in_footprint;
use crate::{
    config::WorldConfig,
    core::MtResource,
    engine_state::{
        error::{ColumnSourceError, PersistenceError, VoxelError},
        rendering::{present_column, release_column, tasks::ChunkMeshGenerationTask, RenderCommand},
        task_management::TaskManager,
        voxels::{
            block::BlockRegistry,
            column::{ChunkColumn, LoadTransition, UnloadTransition},
            generation::WorldGenerator,
            persistence::RegionStore,
            world::ResidentColumns,
        },
    },
};

/// Identifies a player tracked by a streaming controller.
pub type PlayerId = u32;

/// Which resident columns get meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWindow {
    /// Every resident column is meshed.
    Everywhere,
    /// No column is meshed.
    Nowhere,
    /// Columns within `render_radius` of a center column are meshed.
    Around(Point2<i32>),
}

/// Entries processed per stage during one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub loaded: usize,
    pub unloaded: usize,
    pub set_up: usize,
    pub torn_down: usize,
    pub saved: usize,
    pub evicted: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    /// Load requests waiting for this column
    requests: u32,
    /// Failed attempts so far
    attempts: u32,
    due_tick: u64,
}

/// State and drain steps shared by the server and client controllers.
pub struct StreamingCore {
    load_radius: i32,
    render_radius: i32,
    drain_budget: usize,
    max_load_retries: u32,
    registry: Arc<BlockRegistry>,
    columns: ResidentColumns,
    queues: MtResource<ChunkQueues>,
    store: Box<dyn RegionStore>,
    generator: Box<dyn WorldGenerator>,
    task_manager: Option<TaskManager>,
    outbox: Vec<RenderCommand>,
    pending_loads: HashMap<Point2<i32>, PendingLoad>,
    /// Request counts held by coordinates whose loads were given up
    failed_loads: HashMap<Point2<i32>, u32>,
    /// Request counts held by coordinates nothing can provide
    unavailable: HashMap<Point2<i32>, u32>,
    /// Unloads drained before their matching loads
    owed_unloads: HashMap<Point2<i32>, u32>,
    render_window: RenderWindow,
    tick: u64,
}

impl StreamingCore {
    /// Creates a core with the store, generator and worker pool described by
    /// `config`.
    pub fn new(config: &WorldConfig, registry: Arc<BlockRegistry>) -> Self {
        let task_manager = (config.mesh_workers > 0).then(|| TaskManager::new(config.mesh_workers));
        StreamingCore {
            load_radius: config.load_radius,
            render_radius: config.render_radius,
            drain_budget: config.drain_budget.max(1),
            max_load_retries: config.max_load_retries,
            registry,
            columns: ResidentColumns::new(),
            queues: MtResource::default(),
            store: config.build_store(),
            generator: config.build_generator(),
            task_manager,
            outbox: Vec::new(),
            pending_loads: HashMap::new(),
            failed_loads: HashMap::new(),
            unavailable: HashMap::new(),
            owed_unloads: HashMap::new(),
            render_window: RenderWindow::Everywhere,
            tick: 0,
        }
    }

    /// Replaces the region store.
    pub fn with_store(mut self, store: Box<dyn RegionStore>) -> Self {
        self.store = store;
        self
    }

    /// Replaces the world generator.
    pub fn with_generator(mut self, generator: Box<dyn WorldGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn load_radius(&self) -> i32 {
        self.load_radius
    }

    pub fn render_radius(&self) -> i32 {
        self.render_radius
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn columns(&self) -> &ResidentColumns {
        &self.columns
    }

    /// Mutable access to resident columns, e.g. to edit blocks.
    pub fn columns_mut(&mut self) -> &mut ResidentColumns {
        &mut self.columns
    }

    /// A handle to the queues that other threads can enqueue through.
    pub fn queues(&self) -> MtResource<ChunkQueues> {
        self.queues.clone()
    }

    pub fn queue_len(&self, kind: QueueKind) -> usize {
        self.queues.get().len(kind)
    }

    pub fn enqueue(&self, kind: QueueKind, columns: impl IntoIterator<Item = Point2<i32>>) {
        self.queues.get_mut().extend(kind, columns);
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Columns whose loads were given up after exhausting their retries, with
    /// the number of requests still waiting for each.
    pub fn failed_loads(&self) -> &HashMap<Point2<i32>, u32> {
        &self.failed_loads
    }

    /// Unloads waiting for a load of the same column to cancel.
    pub fn owed_unload_count(&self) -> u32 {
        self.owed_unloads.values().sum()
    }

    /// Columns waiting for a retry.
    pub fn pending_load_count(&self) -> usize {
        self.pending_loads.len()
    }

    /// Removes and returns the render commands produced so far.
    pub fn take_render_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn render_window(&self) -> RenderWindow {
        self.render_window
    }

    pub fn set_render_window(&mut self, window: RenderWindow) {
        self.render_window = window;
    }

    /// Whether a column lies inside the render window.
    pub fn in_render_window(&self, position: Point2<i32>) -> bool {
        match self.render_window {
            RenderWindow::Everywhere => true,
            RenderWindow::Nowhere => false,
            RenderWindow::Around(center) => in_footprint(center, self.render_radius, position),
        }
    }

    /// Whether anything is queued, waiting for a retry or being meshed.
    pub fn has_pending_work(&self) -> bool {
        self.queues.get().total_len() > 0
            || !self.pending_loads.is_empty()
            || self
                .task_manager
                .as_ref()
                .is_some_and(|task_manager| !task_manager.is_idle())
    }

    fn take(&self, kind: QueueKind) -> Vec<Point2<i32>> {
        self.queues.get_mut().take(kind, self.drain_budget)
    }

    /// Drains the Load queue after re-attempting loads whose backoff expired.
    pub fn load_chunks(&mut self) -> usize {
        self.retry_due_loads();

        let batch = self.take(QueueKind::Load);
        for &position in &batch {
            self.load_column(position);
        }
        batch.len()
    }

    fn load_column(&mut self, position: Point2<i32>) {
        if take_one(&mut self.owed_unloads, position) {
            debug!("Load of column ({}, {}) cancelled by an earlier unload", position.x, position.y);
            return;
        }

        let in_window = self.in_render_window(position);
        if let Some(column) = self.columns.get_mut(position) {
            if column.load() == LoadTransition::BecameResident && in_window {
                self.queues.get_mut().push(QueueKind::Setup, position);
            }
            return;
        }

        if let Some(pending) = self.pending_loads.get_mut(&position) {
            pending.requests += 1;
            return;
        }

        let held = self.failed_loads.get(&position).copied().unwrap_or(0)
            + self.unavailable.get(&position).copied().unwrap_or(0);
        match self.resolve_column(position) {
            Ok(column) => {
                self.failed_loads.remove(&position);
                self.unavailable.remove(&position);
                self.admit(column, held + 1);
            }
            Err(err) => self.handle_load_failure(position, held + 1, 1, err),
        }
    }

    /// Reads a column from the store, falling back to the generator.
    fn resolve_column(&mut self, position: Point2<i32>) -> Result<ChunkColumn, ColumnSourceError> {
        match self.store.load_column(position) {
            Ok(Some(column)) => return Ok(column),
            Ok(None) | Err(PersistenceError::NotYetAvailable) => {}
            Err(err) => return Err(err.into()),
        }

        let mut column = self.generator.generate_column(position)?;
        column.mark_dirty();
        Ok(column)
    }

    /// Inserts a freshly loaded column holding `requests` references.
    fn admit(&mut self, mut column: ChunkColumn, requests: u32) {
        let position = column.position();
        for _ in 0..requests {
            column.load();
        }
        self.columns.insert(column);
        if self.in_render_window(position) {
            self.queues.get_mut().push(QueueKind::Setup, position);
        }
    }

    fn handle_load_failure(
        &mut self,
        position: Point2<i32>,
        requests: u32,
        attempts: u32,
        err: ColumnSourceError,
    ) {
        self.failed_loads.remove(&position);
        if err.is_not_yet_available() {
            if self.unavailable.insert(position, requests).is_none() {
                warn!(
                    "Nothing can provide column ({}, {}): {err}",
                    position.x, position.y
                );
            }
            return;
        }
        self.unavailable.remove(&position);

        if attempts > self.max_load_retries {
            error!(
                "Giving up on column ({}, {}) after {attempts} attempts: {err}",
                position.x, position.y
            );
            self.failed_loads.insert(position, requests);
            return;
        }

        let delay = 1u64 << attempts.min(16);
        warn!(
            "Loading column ({}, {}) failed: {err}; retrying in {delay} ticks",
            position.x, position.y
        );
        self.pending_loads.insert(
            position,
            PendingLoad {
                requests,
                attempts,
                due_tick: self.tick + delay,
            },
        );
    }

    fn retry_due_loads(&mut self) {
        let tick = self.tick;
        let due: Vec<Point2<i32>> = self
            .pending_loads
            .iter()
            .filter(|(_, pending)| pending.due_tick <= tick)
            .map(|(&position, _)| position)
            .collect();

        for position in due {
            let Some(pending) = self.pending_loads.remove(&position) else {
                continue;
            };
            match self.resolve_column(position) {
                Ok(column) => {
                    info!(
                        "Loaded column ({}, {}) after {} failed attempts",
                        position.x, position.y, pending.attempts
                    );
                    self.admit(column, pending.requests);
                }
                Err(err) => {
                    self.handle_load_failure(position, pending.requests, pending.attempts + 1, err)
                }
            }
        }
    }

    /// Drains the Unload queue.
    pub fn unload_chunks(&mut self) -> usize {
        let batch = self.take(QueueKind::Unload);
        for &position in &batch {
            self.unload_column(position);
        }
        batch.len()
    }

    fn unload_column(&mut self, position: Point2<i32>) {
        if let Some(column) = self.columns.get_mut(position) {
            match column.unload() {
                UnloadTransition::BecameIdle => {
                    let mut queues = self.queues.get_mut();
                    queues.push(QueueKind::Teardown, position);
                    queues.push(QueueKind::Save, position);
                }
                UnloadTransition::StillWanted => {}
                UnloadTransition::AlreadyIdle => {
                    debug!(
                        "Column ({}, {}) is idle; holding the unload for its next load",
                        position.x, position.y
                    );
                    *self.owed_unloads.entry(position).or_insert(0) += 1;
                }
            }
            return;
        }

        if let Some(pending) = self.pending_loads.get_mut(&position) {
            pending.requests -= 1;
            if pending.requests == 0 {
                debug!("Cancelled pending load of column ({}, {})", position.x, position.y);
                self.pending_loads.remove(&position);
            }
            return;
        }

        if take_one(&mut self.failed_loads, position) || take_one(&mut self.unavailable, position) {
            return;
        }

        *self.owed_unloads.entry(position).or_insert(0) += 1;
    }

    /// Drains the Setup queue, meshing wanted columns inside the render window.
    pub fn setup_chunks(&mut self) -> usize {
        let batch = self.take(QueueKind::Setup);
        for &position in &batch {
            let in_window = self.in_render_window(position);
            let Some(column) = self.columns.get_mut(position) else {
                continue;
            };
            if !column.is_wanted() || !in_window || column.is_set_up() || column.is_setup_pending() {
                continue;
            }

            match &mut self.task_manager {
                Some(task_manager) => {
                    let generation = column.begin_async_setup();
                    task_manager.publish_task(Box::new(ChunkMeshGenerationTask::new(
                        Arc::clone(&self.registry),
                        position,
                        generation,
                        column.chunk_snapshots(),
                    )));
                }
                None => match column.setup(&self.registry) {
                    Ok(()) => self.outbox.extend(present_column(column)),
                    Err(err) => error!(
                        "Setting up column ({}, {}) failed: {err}",
                        position.x, position.y
                    ),
                },
            }
        }
        batch.len()
    }

    /// Drains the Teardown queue.
    ///
    /// A column that is wanted again and inside the render window keeps its
    /// meshes.
    pub fn teardown_chunks(&mut self) -> usize {
        let batch = self.take(QueueKind::Teardown);
        for &position in &batch {
            let in_window = self.in_render_window(position);
            let Some(column) = self.columns.get_mut(position) else {
                continue;
            };
            if column.is_wanted() && in_window {
                debug!(
                    "Column ({}, {}) is wanted again, skipping teardown",
                    position.x, position.y
                );
                continue;
            }
            if column.is_set_up() {
                self.outbox.extend(release_column(column));
            }
            if column.is_set_up() || column.is_setup_pending() {
                column.teardown();
            }
        }
        batch.len()
    }

    /// Drains the Save queue.
    pub fn save_chunks(&mut self) -> usize {
        let batch = self.take(QueueKind::Save);
        for &position in &batch {
            let Some(column) = self.columns.get_mut(position) else {
                continue;
            };
            if !column.needs_save() {
                continue;
            }
            match self.store.save_column(column) {
                Ok(()) => column.mark_saved(),
                // Without a store there is nowhere to keep the column.
                Err(PersistenceError::NotYetAvailable) => column.mark_saved(),
                Err(err) => warn!(
                    "Saving column ({}, {}) failed: {err}",
                    position.x, position.y
                ),
            }
        }
        batch.len()
    }

    /// Applies finished mesh tasks and hands queued ones to idle workers.
    pub fn process_tasks(&mut self) -> usize {
        match &mut self.task_manager {
            Some(task_manager) => {
                let completed = task_manager.process_completed_tasks(&mut self.columns, &mut self.outbox);
                task_manager.process_queued_tasks();
                completed
            }
            None => 0,
        }
    }

    /// Drops idle, torn-down, saved columns from memory.
    pub fn sweep(&mut self) -> usize {
        let evicted = self.columns.sweep_evictable();
        if !evicted.is_empty() {
            debug!("Evicted {} idle columns", evicted.len());
        }
        evicted.len()
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Queues every modified resident column for saving.
    pub fn queue_autosave(&mut self) -> usize {
        let modified: Vec<_> = self
            .columns
            .iter()
            .filter(|column| column.needs_save())
            .map(ChunkColumn::position)
            .collect();
        if !modified.is_empty() {
            info!("Autosave queued {} modified columns", modified.len());
        }
        let count = modified.len();
        self.enqueue(QueueKind::Save, modified);
        count
    }

    /// Saves every modified column and flushes the region store.
    pub fn save_all(&mut self) -> Result<(), PersistenceError> {
        self.queue_autosave();
        while !self.queues.get().is_empty(QueueKind::Save) {
            self.save_chunks();
        }
        match self.store.flush() {
            Ok(()) | Err(PersistenceError::NotYetAvailable) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// The drain steps shared by every controller, plus the player-tracking entry
/// point each variant implements its own way.
pub trait StreamingController {
    fn core(&self) -> &StreamingCore;

    fn core_mut(&mut self) -> &mut StreamingCore;

    /// Moves tracked players. For every player that moved, the old footprint is
    /// queued for unload and the new one for load.
    ///
    /// # Errors
    /// Returns [`VoxelError::UnknownPlayerId`] if any id is not tracked; no
    /// player is moved in that case.
    fn update_player_locations(
        &mut self,
        positions: &[(PlayerId, Point2<i32>)],
    ) -> Result<(), VoxelError>;

    fn load_chunks(&mut self) -> usize {
        self.core_mut().load_chunks()
    }

    fn unload_chunks(&mut self) -> usize {
        self.core_mut().unload_chunks()
    }

    fn setup_chunks(&mut self) -> usize {
        self.core_mut().setup_chunks()
    }

    fn teardown_chunks(&mut self) -> usize {
        self.core_mut().teardown_chunks()
    }

    fn save_chunks(&mut self) -> usize {
        self.core_mut().save_chunks()
    }

    /// Runs one tick of the pipeline.
    fn update(&mut self) -> TickSummary {
        self.core_mut().process_tasks();

        let loaded = self.load_chunks();
        let unloaded = self.unload_chunks();
        let set_up = self.setup_chunks();
        let torn_down = self.teardown_chunks();
        let saved = self.save_chunks();

        let core = self.core_mut();
        let evicted = core.sweep();
        core.advance_tick();

        let summary = TickSummary {
            loaded,
            unloaded,
            set_up,
            torn_down,
            saved,
            evicted,
        };
        debug!("Tick {}: {summary:?}", core.tick());
        summary
    }
}

/// Decrements the count held for `position`, dropping it at zero. Returns
/// whether there was anything to take.
fn take_one(counts: &mut HashMap<Point2<i32>, u32>, position: Point2<i32>) -> bool {
    let Some(count) = counts.get_mut(&position) else {
        return false;
    };
    *count -= 1;
    if *count == 0 {
        counts.remove(&position);
    }
    true
}


#[cfg(test)]
mod tests {
    use super::test_support::flat_core;
    use super::*;
    use crate::engine_state::{
        error::GenerationError,
        voxels::{chunk::VoxelChunk, generation::FlatGenerator},
    };
    use cgmath::Point3;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` column requests, then generates flat terrain.
    struct FlakyGenerator {
        failures: Arc<AtomicU32>,
    }

    impl WorldGenerator for FlakyGenerator {
        fn generate_chunk(&self, position: Point3<i32>) -> Result<VoxelChunk, GenerationError> {
            FlatGenerator::default().generate_chunk(position)
        }

        fn generate_column(&self, position: Point2<i32>) -> Result<ChunkColumn, GenerationError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(GenerationError::Failed {
                    position: Point3::new(position.x, position.y, 0),
                    reason: "flaky".to_string(),
                });
            }
            FlatGenerator::default().generate_column(position)
        }
    }

    fn flaky_core(failures: u32, max_load_retries: u32) -> StreamingCore {
        let config = WorldConfig {
            persistence: false,
            max_load_retries,
            ..WorldConfig::default()
        };
        StreamingCore::new(&config, Arc::new(BlockRegistry::with_builtin_blocks())).with_generator(
            Box::new(FlakyGenerator {
                failures: Arc::new(AtomicU32::new(failures)),
            }),
        )
    }

    #[test]
    fn loading_twice_shares_one_column() {
        let mut core = flat_core(1, 1, 64);
        let origin = Point2::new(0, 0);
        core.enqueue(QueueKind::Load, [origin, origin]);
        assert_eq!(core.load_chunks(), 2);

        let column = core.columns().get(origin).unwrap();
        assert_eq!(column.loading_players(), 2);
        assert!(column.needs_save());
        assert_eq!(core.queue_len(QueueKind::Setup), 1);
    }

    #[test]
    fn drains_respect_the_budget() {
        let mut core = flat_core(1, 1, 3);
        core.enqueue(QueueKind::Load, (0..5).map(|x| Point2::new(x, 0)));
        assert_eq!(core.load_chunks(), 3);
        assert_eq!(core.queue_len(QueueKind::Load), 2);
        assert_eq!(core.load_chunks(), 2);
        assert_eq!(core.columns().len(), 5);
    }

    #[test]
    fn last_unload_queues_teardown_and_save() {
        let mut core = flat_core(1, 1, 64);
        let origin = Point2::new(0, 0);
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        core.setup_chunks();
        assert!(core.columns().get(origin).unwrap().is_set_up());
        assert_eq!(core.take_render_commands().len(), 16);

        core.enqueue(QueueKind::Unload, [origin]);
        core.unload_chunks();
        assert_eq!(core.columns().get(origin).unwrap().loading_players(), 0);
        assert_eq!(core.queue_len(QueueKind::Teardown), 1);
        assert_eq!(core.queue_len(QueueKind::Save), 1);

        core.teardown_chunks();
        core.save_chunks();
        let releases = core.take_render_commands();
        assert_eq!(releases.len(), 16);
        assert!(releases.iter().all(|command| !command.is_present()));

        assert_eq!(core.sweep(), 1);
        assert!(core.columns().is_empty());
    }

    #[test]
    fn teardown_is_skipped_when_wanted_again() {
        let mut core = flat_core(1, 1, 64);
        let origin = Point2::new(0, 0);
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        core.setup_chunks();

        core.enqueue(QueueKind::Unload, [origin]);
        core.unload_chunks();
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        core.teardown_chunks();

        assert!(core.columns().get(origin).unwrap().is_set_up());
    }

    #[test]
    fn failed_loads_retry_with_backoff() {
        let mut core = flaky_core(1, 3);
        let origin = Point2::new(0, 0);
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        assert!(core.columns().is_empty());
        assert_eq!(core.pending_load_count(), 1);

        // A second request while waiting just adds a reference.
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();

        // First retry is due two ticks after the failure.
        core.advance_tick();
        core.load_chunks();
        assert!(core.columns().is_empty());
        core.advance_tick();
        core.load_chunks();

        assert_eq!(core.columns().get(origin).unwrap().loading_players(), 2);
        assert_eq!(core.pending_load_count(), 0);
    }

    #[test]
    fn retries_are_bounded() {
        let mut core = flaky_core(10, 2);
        let origin = Point2::new(3, 3);
        core.enqueue(QueueKind::Load, [origin]);
        for _ in 0..64 {
            core.load_chunks();
            core.advance_tick();
        }
        assert_eq!(core.failed_loads().get(&origin), Some(&1));
        assert_eq!(core.pending_load_count(), 0);
        assert!(core.columns().is_empty());
    }

    #[test]
    fn unloads_cancel_pending_loads() {
        let mut core = flaky_core(1, 3);
        let origin = Point2::new(0, 0);
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        core.enqueue(QueueKind::Unload, [origin]);
        core.unload_chunks();
        assert_eq!(core.pending_load_count(), 0);
        assert!(!core.has_pending_work());
    }

    #[test]
    fn unavailable_sources_drop_the_request() {
        let config = WorldConfig {
            persistence: false,
            generator: crate::config::GeneratorKind::Disabled,
            ..WorldConfig::default()
        };
        let mut core = StreamingCore::new(&config, Arc::new(BlockRegistry::with_builtin_blocks()));
        core.enqueue(QueueKind::Load, [Point2::new(0, 0)]);
        core.load_chunks();
        assert!(core.columns().is_empty());
        assert_eq!(core.pending_load_count(), 0);
        assert!(core.failed_loads().is_empty());

        core.enqueue(QueueKind::Unload, [Point2::new(0, 0)]);
        core.unload_chunks();
        assert_eq!(core.owed_unload_count(), 0);
    }

    #[test]
    fn given_up_requests_are_kept_for_the_next_load() {
        let mut core = flaky_core(1, 0);
        let origin = Point2::new(0, 0);

        // Player A's load fails once and is given up at once.
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        assert_eq!(core.failed_loads().get(&origin), Some(&1));

        // Player B's load succeeds and carries A's reference along.
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        assert!(core.failed_loads().is_empty());
        assert_eq!(core.columns().get(origin).unwrap().loading_players(), 2);

        // A leaves; B still wants the column.
        core.enqueue(QueueKind::Unload, [origin]);
        core.unload_chunks();
        core.setup_chunks();
        core.teardown_chunks();
        let column = core.columns().get(origin).unwrap();
        assert!(column.is_wanted());
        assert!(column.is_set_up());
    }

    #[test]
    fn unloads_of_given_up_loads_release_the_held_request() {
        let mut core = flaky_core(1, 0);
        let origin = Point2::new(0, 0);
        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        core.enqueue(QueueKind::Unload, [origin]);
        core.unload_chunks();
        assert!(core.failed_loads().is_empty());
        assert_eq!(core.owed_unload_count(), 0);

        core.enqueue(QueueKind::Load, [origin]);
        core.load_chunks();
        assert_eq!(core.columns().get(origin).unwrap().loading_players(), 1);
    }

    #[test]
    fn early_unloads_cancel_the_matching_load() {
        let mut core = flat_core(1, 1, 64);
        let origin = Point2::new(0, 0);
        core.enqueue(QueueKind::Unload, [origin]);
        core.unload_chunks();
        assert_eq!(core.owed_unload_count(), 1);

        core.enqueue(QueueKind::Load, [origin, origin]);
        core.load_chunks();
        assert_eq!(core.owed_unload_count(), 0);
        assert_eq!(core.columns().get(origin).unwrap().loading_players(), 1);
    }

    #[test]
    fn columns_outside_the_render_window_stay_unmeshed() {
        let mut core = flat_core(4, 1, 64);
        core.set_render_window(RenderWindow::Around(Point2::new(0, 0)));
        core.enqueue(QueueKind::Load, [Point2::new(0, 0), Point2::new(3, 0)]);
        core.load_chunks();
        assert_eq!(core.queue_len(QueueKind::Setup), 1);
        core.setup_chunks();
        assert!(core.columns().get(Point2::new(0, 0)).unwrap().is_set_up());
        assert!(!core.columns().get(Point2::new(3, 0)).unwrap().is_set_up());
    }

    #[test]
    fn autosave_queues_modified_columns() {
        let mut core = flat_core(1, 1, 64);
        core.enqueue(QueueKind::Load, [Point2::new(0, 0), Point2::new(1, 0)]);
        core.load_chunks();
        assert_eq!(core.queue_autosave(), 2);
        core.save_all().unwrap();
        assert!(core.columns().iter().all(|column| !column.needs_save()));
    }
}
