//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel world.
//! It includes block type definitions, block face handling, the per-block
//! neighbor occlusion mask and the block value itself.

use block_side::BlockSide;
use block_type::BlockType;
use cgmath::Point3;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to select block types by index.
pub type BlockTypeSize = u8;

/// Force of a water source block. Spread water loses one level per step.
pub const MAX_WATER_FORCE: u8 = 8;

/// Weakest water force. Blocks at this force no longer spread sideways.
pub const MIN_WATER_FORCE: u8 = 1;

/// Six-bit occlusion record of a block, one bit per [`BlockSide`].
///
/// A set bit means the face is hidden by its neighbor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NeighborMask(u8);

impl NeighborMask {
    /// Mask with every face occluded.
    pub const FULLY_OCCLUDED: NeighborMask = NeighborMask(0b11_1111);

    /// Whether the given face is hidden.
    pub fn is_occluded(self, side: BlockSide) -> bool {
        self.0 & side.bit() != 0
    }

    /// Marks the given face as hidden or visible.
    pub fn set(&mut self, side: BlockSide, occluded: bool) {
        if occluded {
            self.0 |= side.bit();
        } else {
            self.0 &= !side.bit();
        }
    }

    /// Whether all six faces are hidden.
    pub fn is_fully_occluded(self) -> bool {
        self == Self::FULLY_OCCLUDED
    }

    /// Number of hidden faces.
    pub fn occluded_count(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates over the faces that are still visible.
    pub fn visible_sides(self) -> impl Iterator<Item = BlockSide> {
        BlockSide::all()
            .into_iter()
            .filter(move |side| !self.is_occluded(*side))
    }

    /// Raw bit representation.
    pub fn bits(self) -> u8 {
        self.0
    }
}

/// Represents a single voxel block in the world.
///
/// Blocks are small value types. A chunk owns them by value and copies leave
/// the chunk whenever a snapshot is taken for rendering.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Block {
    /// The type of this block.
    pub block_type: BlockType,
    /// World position of the block center. Only falling sand leaves the lattice.
    pub position: Point3<f32>,
    /// Which faces are hidden by neighbors.
    pub neighbors: NeighborMask,
    water_force: u8,
    /// The block and the block above it are both water.
    pub has_water_above: bool,
    /// Water marked to spread on the next simulation tick.
    pub spread_this_tick: bool,
    /// Sand that lost its support and is moving down.
    pub is_falling: bool,
    /// Whether an actor may remove the block.
    pub is_breakable: bool,
    /// Set by actor controllers for highlighting.
    pub colliding: bool,
}

impl Block {
    /// Creates a new block of the specified type at a world position.
    ///
    /// # Arguments
    /// * `block_type` - The type of block to create
    /// * `position` - Center of the block in world space
    ///
    /// # Returns
    /// A breakable block at full water force with an empty neighbor mask.
    pub fn new(block_type: BlockType, position: Point3<f32>) -> Self {
        Block {
            block_type,
            position,
            neighbors: NeighborMask::default(),
            water_force: MAX_WATER_FORCE,
            has_water_above: false,
            spread_this_tick: false,
            is_falling: false,
            is_breakable: true,
            colliding: false,
        }
    }

    /// Creates a water block with the given force, clamped into `[1, 8]`.
    pub fn water(position: Point3<f32>, force: u8) -> Self {
        let mut block = Block::new(BlockType::Water, position);
        block.set_water_force(force);
        block
    }

    /// Current water force.
    pub fn water_force(&self) -> u8 {
        self.water_force
    }

    /// Sets the water force, keeping it inside `[1, 8]`.
    pub fn set_water_force(&mut self, force: u8) {
        debug_assert!(
            (MIN_WATER_FORCE..=MAX_WATER_FORCE).contains(&force),
            "water force {force} out of range"
        );
        self.water_force = force.clamp(MIN_WATER_FORCE, MAX_WATER_FORCE);
    }

    /// Whether the block should be handed to the renderer.
    pub fn is_renderable(&self) -> bool {
        self.block_type != BlockType::Air && !self.neighbors.is_fully_occluded()
    }

    /// Whether the block is water.
    pub fn is_water(&self) -> bool {
        self.block_type.is_liquid()
    }
}
