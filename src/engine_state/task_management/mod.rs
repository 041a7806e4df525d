//! # Task Management System
//!
//! This module provides the worker pool that runs chunk generation and
//! populated-block snapshot builds off the main thread.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, which can spawn additional tasks
//! - `TaskChannel`: Communication channel between the main thread and one worker thread
//!
//! Each worker is a `std::thread` with a dedicated pair of `mpsc` channels.
//! Results are only ever applied on the thread that owns the `TaskManager`, which
//! makes it the single writer of the world.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and return results
//! 4. Results are applied to the world in `process_completed_tasks()`
//! 5. Results can spawn new tasks, which are published in turn
//!
//! There is no cancellation. A published task always runs to completion.
//!
//! ## Example Usage
//! ```rust,ignore
//! let mut task_manager = TaskManager::new(4);
//!
//! task_manager.publish_task(Box::new(ChunkGenerationTask::new(generator, streaming, coord)));
//!
//! // In the main loop:
//! task_manager.process_completed_tasks(&mut world);
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use task::{Task, TaskResult};

use super::voxels::world::World;

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `result_receiver`: Receives task results from worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread (kept alive by this struct)
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Dropping the manager closes every task channel, which lets the workers
/// leave their receive loops.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to spawn
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = match thread::Builder::new()
                .name(format!("world-worker-{index}"))
                .spawn(task_closure)
            {
                Ok(worker) => worker,
                Err(err) => {
                    warn!("Failed to spawn worker {index}: {err}");
                    continue;
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                _worker: worker,
            });
        }

        info!(
            "Started {} task workers (available parallelism: {:?})",
            channels.len(),
            thread::available_parallelism()
        );

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks currently running on workers.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels.iter().map(|channel| channel.num_tasks_in_flight).sum()
    }

    /// Number of tasks waiting for a worker.
    pub fn queued_task_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Whether no task is running or queued.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.tasks_in_flight() == 0
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(task)` if the send failed because the worker is gone
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel, round-robin from the last used one.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Feeds queued tasks to idle workers, oldest first.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            if let Err(task) = self.try_send_task(task, channel_idx) {
                // Channel is disconnected, put task back and stop processing
                self.queued_tasks.push_front(task);
                return;
            }
            self.current_channel = (channel_idx + 1) % self.channels.len();
        }
    }

    /// Applies every result that is already available. Never blocks.
    ///
    /// # Arguments
    /// * `world` - The world results are applied to
    ///
    /// # Returns
    /// The number of results handled
    pub fn process_completed_tasks(&mut self, world: &mut World) -> usize {
        let mut results = Vec::new();
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                results.push(result);
            }
        }
        self.handle_results(results, world)
    }

    /// Blocks until every published task, and every task spawned by their
    /// results, has been processed and applied.
    ///
    /// Used where the caller cannot continue without the results, such as the
    /// initial world load and tests.
    pub fn wait_until_idle(&mut self, world: &mut World) {
        loop {
            self.process_queued_tasks();
            if self.is_idle() {
                return;
            }

            let mut results = Vec::new();
            for channel in &mut self.channels {
                if channel.num_tasks_in_flight == 0 {
                    continue;
                }
                match channel.result_receiver.recv() {
                    Ok(result) => {
                        channel.num_tasks_in_flight -= 1;
                        results.push(result);
                    }
                    Err(_) => {
                        warn!("Worker disconnected with {} tasks in flight", channel.num_tasks_in_flight);
                        channel.num_tasks_in_flight = 0;
                    }
                }
            }

            if results.is_empty() && self.tasks_in_flight() == 0 {
                warn!("No workers left; dropping {} queued tasks", self.queued_tasks.len());
                self.queued_tasks.clear();
                return;
            }
            self.handle_results(results, world);
        }
    }

    fn handle_results(&mut self, results: Vec<Box<dyn TaskResult + Send>>, world: &mut World) -> usize {
        let handled = results.len();
        let mut tasks_to_queue = Vec::new();
        for result in results {
            tasks_to_queue.extend(result.handle_result(world));
        }
        if handled > 0 {
            debug!(
                "Handled {} task results, {} follow-up tasks",
                handled,
                tasks_to_queue.len()
            );
        }
        for task in tasks_to_queue {
            self.publish_task(task);
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cgmath::Point3;

    use super::*;
    use crate::engine_state::{
        config::WorldConfig,
        voxels::{
            block::block_type::BlockType,
            chunk::{chunk_creation::ChunkGenerator, ChunkCoord},
            noise_field::{ConstantNoise, NoiseFields},
        },
    };

    struct MarkTask(i32);

    struct MarkResult(i32);

    impl Task for MarkTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            Box::new(MarkResult(self.0))
        }
    }

    impl TaskResult for MarkResult {
        fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>> {
            world.add_block_at(Point3::new(self.0, 40, 0), BlockType::Glass);
            if self.0 < 3 {
                vec![Box::new(MarkTask(self.0 + 1))]
            } else {
                Vec::new()
            }
        }
    }

    fn flat_world() -> World {
        let config = Arc::new(WorldConfig {
            chunk_size: 8,
            world_height: 48,
            sea_level: 0,
            tree_probability: 0.0,
            streaming_radius: 0,
            max_loaded_chunks: None,
            ..WorldConfig::default()
        });
        let noise = NoiseFields::uniform(Arc::new(ConstantNoise(0.0)));
        let mut world = World::with_generator(ChunkGenerator::with_noise(config, noise));
        world.load_area_blocking(ChunkCoord::new(0, 0));
        world
    }

    #[test]
    fn results_and_follow_ups_reach_the_world() {
        let mut world = flat_world();
        let mut manager = TaskManager::new(2);
        assert_eq!(manager.worker_count(), 2);

        manager.publish_task(Box::new(MarkTask(0)));
        manager.wait_until_idle(&mut world);

        assert!(manager.is_idle());
        for x in 0..=3 {
            let block = world.get_block_at(x, 40, 0).unwrap();
            assert_eq!(block.block_type, BlockType::Glass);
        }
    }

    #[test]
    fn busy_workers_queue_tasks() {
        let mut world = flat_world();
        let mut manager = TaskManager::new(1);
        assert!(manager.publish_task(Box::new(MarkTask(3))));
        assert!(!manager.publish_task(Box::new(MarkTask(3))));
        assert_eq!(manager.queued_task_count(), 1);

        manager.wait_until_idle(&mut world);
        assert_eq!(manager.queued_task_count(), 0);
    }
}
