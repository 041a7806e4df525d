//! # Actor State Management
//!
//! This module handles everything the first-person actor does in a frame:
//! - Look rotation and block type selection
//! - Walking, running, jumping and falling through the block grid
//! - Checks used by block placement against the actor's own volume
//!
//! ## Core Components
//! - `Actor`: Position, orientation and jump state
//! - `CollisionResolver`: Substepped movement against the block grid
//! - `ActorInput`: One frame of input, produced by whatever drives the engine

use cgmath::{Point3, Rad};

use actor::Actor;
use collision::{CollisionFlags, CollisionResolver};

use super::{
    config::ActorConfig,
    voxels::{
        block::{block_type::BlockType, BlockTypeSize},
        BlockLookup,
    },
};

pub mod actor;
pub mod collision;

/// One frame of actor input.
///
/// Axis values are expected in `[-1, 1]`. Edge-triggered actions such as
/// breaking a block are applied once per frame they are set in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorInput {
    /// Forward (positive) or backward (negative) movement
    pub forward: f32,
    /// Right (positive) or left (negative) movement
    pub strafe: f32,
    /// Yaw change in radians
    pub yaw_delta: f32,
    /// Pitch change in radians
    pub pitch_delta: f32,
    /// Start a jump if standing on the ground
    pub jump: bool,
    /// Apply the running multiplier
    pub run: bool,
    /// Remove the targeted block
    pub break_block: bool,
    /// Place the selected block next to the targeted one
    pub place_block: bool,
    /// Select the block type with this index
    pub select_block: Option<BlockTypeSize>,
}

/// The actor together with the resolver that moves it.
pub struct ActorState {
    /// The actor itself
    pub actor: Actor,
    /// Moves the actor through the block grid
    pub resolver: CollisionResolver,
}

impl ActorState {
    /// Creates an actor at `position`.
    pub fn new(position: Point3<f32>, config: ActorConfig) -> Self {
        Self {
            actor: Actor::new(position),
            resolver: CollisionResolver::new(config),
        }
    }

    /// Applies look and selection input without moving the actor.
    pub fn intake_input(&mut self, input: &ActorInput) {
        self.actor
            .rotate(Rad(input.yaw_delta), Rad(input.pitch_delta));

        if let Some(index) = input.select_block {
            match BlockType::from_index(index) {
                Some(BlockType::Air) | None => {
                    log::debug!("Ignoring selection of block index {index}");
                }
                Some(block_type) => self.actor.selected_block = block_type,
            }
        }
    }

    /// Moves the actor for one frame and starts a jump if requested.
    ///
    /// # Arguments
    /// * `input` - Movement input for this frame
    /// * `dt` - Frame time in seconds
    /// * `grid` - The block grid to collide with
    ///
    /// # Returns
    /// Every hit recorded while moving
    pub fn update<G: BlockLookup + ?Sized>(
        &mut self,
        input: &ActorInput,
        dt: f32,
        grid: &G,
    ) -> CollisionFlags {
        let flags = self.resolver.move_actor(
            &mut self.actor,
            input.forward,
            input.strafe,
            input.run,
            dt,
            grid,
        );
        if input.jump {
            self.actor.try_jump();
        }
        flags
    }

    /// Whether the block cell at `cell` would intersect the actor.
    pub fn overlaps_cell(&self, cell: Point3<i32>) -> bool {
        self.resolver
            .actor_box(self.actor.position, self.actor.yaw)
            .overlaps_block(Point3::new(cell.x as f32, cell.y as f32, cell.z as f32))
    }
}
