//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and the
//! material properties the generator, the simulation and the visibility mask
//! query on them.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminants are stable and double as the selection index an actor
/// uses to choose what it places. The `FromPrimitive` derive allows the
/// conversion back from that index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Top soil of every uncovered column.
    Grass,
    /// Soil exposed along cave ceilings.
    Dirt,
    /// Tree trunks.
    Wood,
    /// Tree canopies. Transparent.
    Leaves,
    /// Falls when nothing supports it.
    Sand,
    /// Bulk terrain.
    Stone,
    /// Spreads every simulation tick.
    Water,
    /// Transparent building block.
    Glass,
    /// Explicit empty block. Never rendered.
    Air,
    /// Ore found below the coal ceiling.
    Coal,
    /// Ore found below the iron ceiling.
    Iron,
}

impl BlockType {
    /// Converts a selection index to a `BlockType`.
    ///
    /// # Arguments
    /// * `btype` - The block type as a `BlockTypeSize`
    ///
    /// # Returns
    /// The corresponding `BlockType`, or `None` for indices past the last variant
    pub fn from_index(btype: BlockTypeSize) -> Option<Self> {
        FromPrimitive::from_u8(btype)
    }

    /// Whether neighbors can be seen through this block when computing occlusion.
    pub fn is_transparent(self) -> bool {
        matches!(self, BlockType::Glass | BlockType::Leaves)
    }

    /// Whether this block belongs to the translucent render partition.
    pub fn is_translucent(self) -> bool {
        matches!(self, BlockType::Glass | BlockType::Leaves | BlockType::Water)
    }

    /// Whether the block is a liquid.
    pub fn is_liquid(self) -> bool {
        self == BlockType::Water
    }
}
