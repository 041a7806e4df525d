//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which handles asynchronous
//! generation of chunk data. One task is published per chunk coordinate the
//! world marked as in flight when the actor entered a new chunk.
//!
//! The task writes the finished chunk straight into the world's shared
//! [`StreamingState`] from the worker thread. The result that travels back
//! through the task channel only reports what was generated.

use log::trace;

use crate::core::MtResource;
use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{chunk_creation::ChunkGenerator, ChunkCoord},
        world::{StreamingState, World},
    },
};

/// A task that generates chunk data asynchronously.
///
/// This task is responsible for:
/// 1. Generating the chunk at the requested coordinate on a worker thread
/// 2. Recording the chunk as a future chunk of the world it was requested by
pub struct ChunkGenerationTask {
    /// Generator clone; shares the chunk identifier counter with the world
    generator: ChunkGenerator,
    /// The requesting world's streaming state
    streaming: MtResource<StreamingState>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: ChunkCoord,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `generator` - The world's generator, cloned
    /// * `streaming` - Handle from [`World::streaming_handle`]
    /// * `position` - The chunk coordinates where the chunk should be generated
    pub fn new(
        generator: ChunkGenerator,
        streaming: MtResource<StreamingState>,
        position: ChunkCoord,
    ) -> Self {
        ChunkGenerationTask {
            generator,
            streaming,
            position,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let chunk = self.generator.generate(self.position);
        let id = chunk.id;
        self.streaming.get_mut().receive(chunk);
        Box::new(ChunkGenerationTaskResult {
            position: self.position,
            id,
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    position: ChunkCoord,
    id: u64,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// The chunk is already pending; nothing is left to do on the main thread.
    fn handle_result(self: Box<Self>, _world: &mut World) -> Vec<Box<dyn Task + Send>> {
        trace!(
            "Generation of chunk {} at ({}, {}) completed",
            self.id,
            self.position.x,
            self.position.z
        );
        Vec::new()
    }
}
