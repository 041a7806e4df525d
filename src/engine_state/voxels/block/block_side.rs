//! # Block Side Module
//!
//! This module defines the six faces of a voxel block. The discriminant of each
//! face is its bit in a block's [`NeighborMask`](super::NeighborMask).

/// Represents the six possible faces of a voxel block.
///
/// The order is: [RIGHT (+X), LEFT (-X), FRONT (+Z), BACK (-Z), TOP (+Y), BOTTOM (-Y)]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The right face (facing positive X)
    Right = 0,

    /// The left face (facing negative X)
    Left = 1,

    /// The front face (facing positive Z)
    Front = 2,

    /// The back face (facing negative Z)
    Back = 3,

    /// The top face (facing positive Y)
    Top = 4,

    /// The bottom face (facing negative Y)
    Bottom = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in mask bit order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::Right,
            BlockSide::Left,
            BlockSide::Front,
            BlockSide::Back,
            BlockSide::Top,
            BlockSide::Bottom,
        ]
    }

    /// The faces in the order block placement breaks ties: +X, +Y, +Z, -X, -Y, -Z.
    pub fn placement_order() -> [BlockSide; 6] {
        [
            BlockSide::Right,
            BlockSide::Top,
            BlockSide::Front,
            BlockSide::Left,
            BlockSide::Bottom,
            BlockSide::Back,
        ]
    }

    /// Offset from a cell to its neighbor across this face.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            BlockSide::Right => (1, 0, 0),
            BlockSide::Left => (-1, 0, 0),
            BlockSide::Front => (0, 0, 1),
            BlockSide::Back => (0, 0, -1),
            BlockSide::Top => (0, 1, 0),
            BlockSide::Bottom => (0, -1, 0),
        }
    }

    /// The face pointing the other way.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::Right => BlockSide::Left,
            BlockSide::Left => BlockSide::Right,
            BlockSide::Front => BlockSide::Back,
            BlockSide::Back => BlockSide::Front,
            BlockSide::Top => BlockSide::Bottom,
            BlockSide::Bottom => BlockSide::Top,
        }
    }

    /// The bit of this face inside a neighbor mask.
    pub fn bit(self) -> u8 {
        1 << self as u8
    }

    /// The four horizontal faces water can spread across.
    pub fn horizontal() -> [BlockSide; 4] {
        [
            BlockSide::Right,
            BlockSide::Left,
            BlockSide::Front,
            BlockSide::Back,
        ]
    }
}
