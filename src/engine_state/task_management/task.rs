//! # Task System Core Traits
//!
//! This module defines the two halves of a background job:
//! - `Task`: work that runs on a worker thread and owns all of its input
//! - `TaskResult`: the output, applied on the thread that drives streaming
//!
//! ## Task Lifecycle
//! 1. A `Task` is published via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the driving thread
//! 5. The result may update resident columns, queue render commands and spawn
//!    follow-up tasks

use crate::engine_state::{rendering::RenderCommand, voxels::world::ResidentColumns};

/// A unit of work executed on a worker thread.
///
/// Tasks must not share mutable state with the driving thread: everything they
/// read is moved or cloned into them when they are created.
pub trait Task: Send {
    /// Performs the work and returns a result for the driving thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The output of a [`Task`], applied on the driving thread.
pub trait TaskResult: Send {
    /// Applies the result.
    ///
    /// # Arguments
    /// * `columns` - The resident column arena
    /// * `outbox` - Render commands to hand to the rendering collaborator
    ///
    /// # Returns
    /// Follow-up tasks to publish (usually empty).
    fn handle_result(
        self: Box<Self>,
        columns: &mut ResidentColumns,
        outbox: &mut Vec<RenderCommand>,
    ) -> Vec<Box<dyn Task + Send>>;
}
