//! # Voxel World Core
//!
//! This module contains the voxel world itself: block data, chunk generation,
//! streaming and the sand and water simulation.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Defines individual voxel types, faces and the per-block occlusion mask
//! * **Chunk**: A full-height column of blocks, the unit of generation and streaming
//! * **NoiseField**: Seeded coherent noise the generator samples
//! * **World**: Coordinates chunks and provides a unified interface for the entire voxel space
//! * **Simulation**: The fixed-tick cellular automaton for falling sand and spreading water
//! * **Tasks**: Background chunk generation and populated-block builds
//!
//! ## Performance Considerations
//!
//! * Chunks are streamed in around the actor and evicted once they fall out of use
//! * Chunk generation runs on worker threads so the frame loop never waits on it
//! * Chunks store blocks densely, so lookups are plain index arithmetic
//! * Hidden faces are culled once per mutation through the neighbor mask
//!
//! ## Data Flow
//!
//! 1. World receives requests for block access or modification
//! 2. World delegates to the owning chunk, which recomputes its neighbor mask
//! 3. Changes request a populated-blocks rebuild
//! 4. The rebuilt snapshot is swapped in on the next frame

use block::Block;

pub mod block;
pub mod chunk;
pub mod noise_field;
pub mod populated_blocks;
pub mod simulation;
pub mod tasks;
pub mod world;

/// Read access to blocks by world coordinate.
///
/// The collision resolver only depends on this trait, so it runs against the
/// streamed world as well as against a single chunk or a test grid.
pub trait BlockLookup {
    /// The block at world coordinates, or `None` for empty and unknown cells.
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&Block>;
}

impl BlockLookup for chunk::Chunk {
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&Block> {
        self.get_block_at_world(x, y, z)
    }
}
