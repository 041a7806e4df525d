//! # Neighbor Mask
//!
//! Face culling for chunk blocks. Every occupied cell records, per face,
//! whether the neighbor across that face hides it. The mask is always rebuilt
//! for the whole chunk, so it never reflects a half-applied mutation.
//!
//! Neighbors outside the chunk count as absent. Faces on chunk borders are
//! therefore always visible.

use crate::engine_state::voxels::block::{
    block_side::BlockSide, block_type::BlockType, Block, NeighborMask, MAX_WATER_FORCE,
};

use super::Chunk;

/// Decides whether `center`'s face toward `neighbor` is hidden.
///
/// # Arguments
/// * `center` - The block whose face is tested
/// * `neighbor` - The block across the face, if any
///
/// # Returns
/// `true` if the face is occluded
pub fn face_occluded(center: &Block, neighbor: Option<&Block>) -> bool {
    let Some(neighbor) = neighbor else {
        return false;
    };

    if neighbor.block_type.is_transparent() && !neighbor.is_water() {
        return false;
    }

    // Lowered water surfaces stay visible through their source.
    if center.is_water() {
        return !(neighbor.is_water() && neighbor.water_force() < MAX_WATER_FORCE);
    }

    !(neighbor.is_water() || neighbor.block_type == BlockType::Air)
}

impl Chunk {
    /// Rebuilds the neighbor mask and the `has_water_above` marker of every block.
    pub fn recompute_neighbors(&mut self) {
        for index in 0..self.blocks.len() {
            let Some(mut block) = self.blocks[index] else {
                continue;
            };
            let (x, y, z) = self.coords_of(index);

            let mut mask = NeighborMask::default();
            for side in BlockSide::all() {
                let (dx, dy, dz) = side.offset();
                mask.set(side, face_occluded(&block, self.get_block(x + dx, y + dy, z + dz)));
            }

            block.neighbors = mask;
            block.has_water_above =
                block.is_water() && self.get_block(x, y + 1, z).is_some_and(Block::is_water);
            self.blocks[index] = Some(block);
        }
    }
}
