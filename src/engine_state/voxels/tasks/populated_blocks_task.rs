//! # Populated Blocks Task
//!
//! Builds the render snapshot off the main thread. The world collects the
//! visible blocks, the worker partitions and sorts them, and the result is
//! stored for the next swap.

use cgmath::Point3;

use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{block::Block, populated_blocks::PopulatedBlocks, world::World},
};

/// A task that builds a `PopulatedBlocks` snapshot.
pub struct PopulatedBlocksTask {
    blocks: Vec<Block>,
    viewer: Point3<f32>,
}

impl PopulatedBlocksTask {
    /// Creates a build over the given blocks for a viewer position.
    pub fn new(blocks: Vec<Block>, viewer: Point3<f32>) -> Self {
        Self { blocks, viewer }
    }

    /// Runs the build on the calling thread.
    pub fn build(&self) -> PopulatedBlocks {
        PopulatedBlocks::build(self.blocks.clone(), self.viewer)
    }
}

impl Task for PopulatedBlocksTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(PopulatedBlocksTaskResult {
            populated: self.build(),
        })
    }
}

/// The finished snapshot.
pub struct PopulatedBlocksTaskResult {
    populated: PopulatedBlocks,
}

impl TaskResult for PopulatedBlocksTaskResult {
    /// Stores the snapshot and starts a follow-up build if refreshes were
    /// requested while this one was running.
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>> {
        world.store_next_populated(self.populated);
        world
            .take_populated_build()
            .map(|task| Box::new(task) as Box<dyn Task + Send>)
            .into_iter()
            .collect()
    }
}
