//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which executes world work on background threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the main thread with the world
//! 5. The result can spawn follow-up tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the main thread
//! - Tasks own their inputs; only the main thread ever writes to the `World`

use crate::engine_state::voxels::world::World;

/// A unit of work that can be executed on a worker thread.
///
/// Tasks should be self-contained and own all the data they need. A chunk
/// generation task carries a generator clone, a snapshot build carries the
/// blocks it sorts.
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// This runs on a background thread and must not touch the world.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be processed on the main thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The result of processing a `Task`.
pub trait TaskResult: Send {
    /// Applies the result to the world on the main thread.
    ///
    /// # Arguments
    /// * `world` - The world, exclusively borrowed for the duration of the call
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty)
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>>;
}
