//! # Task Management System
//!
//! A small worker pool used to build chunk meshes off the driving thread.
//!
//! ## Architecture Overview
//! - `TaskManager`: owns the workers, distributes tasks and collects results
//! - `Task`: a unit of work executed on a worker thread
//! - `TaskResult`: the output of a task, applied on the driving thread
//! - `TaskChannel`: the pair of channels connecting the manager to one worker
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager hands them to idle workers round-robin, queueing the rest
//! 3. Workers call `Task::process()` and send the result back
//! 4. `process_completed_tasks()` applies results on the driving thread
//! 5. Results may spawn further tasks, which are published in turn
//!
//! Worker threads exit on their own once the manager (and with it every task
//! sender) is dropped.
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(num_workers);
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // Once per tick:
//! task_manager.process_completed_tasks(&mut columns, &mut outbox);
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{info, warn};
use task::{Task, TaskResult};

use super::{rendering::RenderCommand, voxels::world::ResidentColumns};

/// A communication channel between the manager and one worker thread.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Keeping this at 1 lets a busy pool fall back to the FIFO queue instead of
/// piling work onto a single slow worker.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. With zero workers
    ///   every published task stays queued.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Starting {num_workers} mesh workers (available parallelism: {:?})",
            thread::available_parallelism()
        );

        for _ in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let worker = thread::spawn(move || {
                while let Ok(task) = task_rx.recv() {
                    if result_tx.send(task.process()).is_err() {
                        break;
                    }
                }
            });

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                _worker: worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was handed to the worker
    /// - `Err(task)` if the worker has disconnected
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(()) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(err) => {
                warn!("Mesh worker {channel_idx} disconnected");
                Err(err.0)
            }
        }
    }

    /// Finds an available worker channel, round-robin from the last one used.
    ///
    /// # Returns
    /// - `Some(usize)` index of a channel below `MAX_TASKS_IN_FLIGHT`
    /// - `None` if all channels are busy or there are none
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        let Some(channel_idx) = self.find_available_channel() else {
            self.queued_tasks.push_back(task);
            return false;
        };

        match self.try_send_task(task, channel_idx) {
            Ok(()) => {
                self.current_channel = (channel_idx + 1) % self.channels.len();
                true
            }
            Err(task) => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Moves queued tasks onto workers while any of them is available.
    ///
    /// Tasks are scheduled in FIFO order; a task that cannot be sent goes back to
    /// the front of the queue.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(()) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Applies every result the workers have finished so far.
    ///
    /// # Arguments
    /// * `columns` - Resident columns the results install their meshes into
    /// * `outbox` - Receives render commands produced by the results
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_completed_tasks(
        &mut self,
        columns: &mut ResidentColumns,
        outbox: &mut Vec<RenderCommand>,
    ) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut completed = 0;
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                completed += 1;
                tasks_to_queue.extend(result.handle_result(columns, outbox));
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        completed
    }

    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Tasks currently executing on workers.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    pub fn queued_task_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Whether no task is queued or running.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.tasks_in_flight() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::time::Duration;

    struct CountingTask {
        counter: Arc<AtomicUsize>,
        follow_up: bool,
    }

    struct CountingResult {
        counter: Arc<AtomicUsize>,
        follow_up: bool,
    }

    impl Task for CountingTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingResult {
                counter: Arc::clone(&self.counter),
                follow_up: self.follow_up,
            })
        }
    }

    impl TaskResult for CountingResult {
        fn handle_result(
            self: Box<Self>,
            _columns: &mut ResidentColumns,
            _outbox: &mut Vec<RenderCommand>,
        ) -> Vec<Box<dyn Task + Send>> {
            if self.follow_up {
                vec![Box::new(CountingTask {
                    counter: self.counter,
                    follow_up: false,
                })]
            } else {
                Vec::new()
            }
        }
    }

    fn run_until_idle(manager: &mut TaskManager) {
        let mut columns = ResidentColumns::new();
        let mut outbox = Vec::new();
        for _ in 0..1000 {
            manager.process_completed_tasks(&mut columns, &mut outbox);
            manager.process_queued_tasks();
            if manager.is_idle() {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("tasks did not finish");
    }

    #[test]
    fn tasks_and_follow_ups_run_on_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new(2);
        for _ in 0..5 {
            manager.publish_task(Box::new(CountingTask {
                counter: Arc::clone(&counter),
                follow_up: true,
            }));
        }
        assert!(manager.queued_task_count() >= 3);

        run_until_idle(&mut manager);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn without_workers_tasks_stay_queued() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new(0);
        assert!(!manager.publish_task(Box::new(CountingTask {
            counter: Arc::clone(&counter),
            follow_up: false,
        })));
        manager.process_queued_tasks();
        assert_eq!(manager.queued_task_count(), 1);
        assert!(!manager.is_idle());
    }
}
