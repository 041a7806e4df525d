//! # Chunk Module
//!
//! This module provides the `Chunk` struct, a full-height column of
//! `chunk_size × world_height × chunk_size` voxels, together with the
//! generator that fills it and the neighbor mask that culls its hidden faces.
//!
//! ## Storage
//!
//! Chunks use dense storage: one `Option<Block>` per cell, laid out with `x`
//! varying fastest, then `z`, then `y`. A parallel bit vector records which
//! cells were hollowed out by cave carving.
//!
//! ### Performance Characteristics
//! - **Block Lookup**: O(1) index arithmetic
//! - **Iteration**: bottom-up, which is the order generation and simulation scan in
//! - **Mask Recompute**: O(size² · height), run once per mutation batch

use bitvec::prelude::BitVec;
use cgmath::Point3;

use super::block::block_type::BlockType;
use super::block::Block;

pub mod chunk_creation;
pub mod chunk_iteration;
mod neighbor_mask;

pub use neighbor_mask::face_occluded;

/// Horizontal position of a chunk, in chunk units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk index along X.
    pub x: i32,
    /// Chunk index along Z.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing a world-space block column.
    pub fn containing(world_x: i32, world_z: i32, chunk_size: i32) -> Self {
        Self {
            x: world_x.div_euclid(chunk_size),
            z: world_z.div_euclid(chunk_size),
        }
    }

    /// The chunk containing a continuous world position.
    pub fn containing_point(position: Point3<f32>, chunk_size: i32) -> Self {
        Self::containing(
            position.x.round() as i32,
            position.z.round() as i32,
            chunk_size,
        )
    }

    /// Chebyshev distance between two chunk coordinates.
    pub fn distance(self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Every coordinate inside the square of the given radius around `self`.
    pub fn square(self, radius: i32) -> impl Iterator<Item = ChunkCoord> {
        (-radius..=radius)
            .flat_map(move |dx| (-radius..=radius).map(move |dz| ChunkCoord::new(self.x + dx, self.z + dz)))
    }
}

/// A full-height column of voxels.
///
/// A chunk is created empty, filled by [`chunk_creation::ChunkGenerator`] and
/// mutated in place by the simulation and by block placement afterwards.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// Unique, increasing identifier assigned at construction.
    pub id: u64,
    /// Position of this chunk in chunk units.
    pub offset: ChunkCoord,
    size: i32,
    height: i32,
    blocks: Vec<Option<Block>>,
    cave_flags: BitVec,
}

impl Chunk {
    /// Creates a new, completely empty chunk.
    ///
    /// # Arguments
    /// * `offset` - The chunk coordinates of the new chunk
    /// * `id` - Identifier handed out by the owning generator
    /// * `size` - Horizontal dimension in blocks
    /// * `height` - Vertical dimension in blocks
    ///
    /// # Panics
    /// When [`Chunk::cell_count`] rejects the dimensions. A validated
    /// [`WorldConfig`](crate::engine_state::config::WorldConfig) never does.
    pub fn empty(offset: ChunkCoord, id: u64, size: i32, height: i32) -> Self {
        let Some(volume) = Self::cell_count(size, height) else {
            panic!("a {size}x{size}x{height} chunk cannot be indexed");
        };
        Chunk {
            id,
            offset,
            size,
            height,
            blocks: vec![None; volume],
            cave_flags: BitVec::repeat(false, volume),
        }
    }

    /// Number of cells in a chunk of the given dimensions.
    ///
    /// Local indices are computed in `i32`, so the volume has to fit there.
    ///
    /// # Returns
    /// `None` for non-positive dimensions or a volume above `i32::MAX`
    pub fn cell_count(size: i32, height: i32) -> Option<usize> {
        if size <= 0 || height <= 0 {
            return None;
        }
        let volume = size.checked_mul(size)?.checked_mul(height)?;
        usize::try_from(volume).ok()
    }

    /// Horizontal dimension in blocks.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Vertical dimension in blocks.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// World-space coordinates of local cell `(0, _, 0)`.
    pub fn world_origin(&self) -> (i32, i32) {
        (self.offset.x * self.size, self.offset.z * self.size)
    }

    /// Converts local coordinates to the world position of the cell center.
    pub fn world_position(&self, x: i32, y: i32, z: i32) -> Point3<f32> {
        let (ox, oz) = self.world_origin();
        Point3::new((ox + x) as f32, y as f32, (oz + z) as f32)
    }

    /// Converts world coordinates to local ones. The result may be out of bounds.
    pub fn to_local(&self, world_x: i32, world_z: i32) -> (i32, i32) {
        let (ox, oz) = self.world_origin();
        (world_x - ox, world_z - oz)
    }

    /// Whether the local coordinates address a cell of this chunk.
    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        (0..self.size).contains(&x) && (0..self.height).contains(&y) && (0..self.size).contains(&z)
    }

    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        self.in_bounds(x, y, z)
            .then(|| (x + z * self.size + y * self.size * self.size) as usize)
    }

    fn coords_of(&self, index: usize) -> (i32, i32, i32) {
        let index = index as i32;
        let plane = self.size * self.size;
        (index % self.size, index / plane, (index % plane) / self.size)
    }

    /// Gets the block at local coordinates. Out-of-range lookups return `None`.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<&Block> {
        self.index(x, y, z).and_then(|i| self.blocks[i].as_ref())
    }

    /// Mutable access to the block at local coordinates.
    pub fn get_block_mut(&mut self, x: i32, y: i32, z: i32) -> Option<&mut Block> {
        self.index(x, y, z).and_then(move |i| self.blocks[i].as_mut())
    }

    /// Gets the block at world coordinates if they fall inside this chunk.
    pub fn get_block_at_world(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<&Block> {
        let (x, z) = self.to_local(world_x, world_z);
        self.get_block(x, world_y, z)
    }

    /// Whether the local cell holds a block.
    pub fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool {
        self.get_block(x, y, z).is_some()
    }

    /// Writes a block into a cell without touching the neighbor mask.
    ///
    /// Returns `false` and drops the block when the coordinates are out of range.
    pub fn put_block(&mut self, x: i32, y: i32, z: i32, block: Block) -> bool {
        match self.index(x, y, z) {
            Some(i) => {
                self.blocks[i] = Some(block);
                true
            }
            None => false,
        }
    }

    /// Writes a fresh block of the given type at its lattice position.
    pub fn put_block_type(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) -> bool {
        let position = self.world_position(x, y, z);
        self.put_block(x, y, z, Block::new(block_type, position))
    }

    /// Empties a cell without touching the neighbor mask.
    pub fn take_block(&mut self, x: i32, y: i32, z: i32) -> Option<Block> {
        self.index(x, y, z).and_then(|i| self.blocks[i].take())
    }

    /// Whether cave carving hollowed out the cell.
    pub fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        self.index(x, y, z).is_some_and(|i| self.cave_flags[i])
    }

    /// Marks the cell as carved by a cave.
    pub fn set_cave(&mut self, x: i32, y: i32, z: i32) {
        if let Some(i) = self.index(x, y, z) {
            self.cave_flags.set(i, true);
        }
    }

    /// Places a block into an empty cell and refreshes the neighbor mask.
    ///
    /// # Returns
    /// `true` if the block was placed, `false` if the cell is occupied or out of range
    pub fn place_block(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) -> bool {
        if !self.in_bounds(x, y, z) || self.is_occupied(x, y, z) {
            return false;
        }
        self.put_block_type(x, y, z, block_type);
        self.recompute_neighbors();
        true
    }

    /// Removes a breakable block and refreshes the neighbor mask.
    ///
    /// The block underneath loses its `has_water_above` marker.
    ///
    /// # Returns
    /// The removed block, or `None` if the cell was empty or unbreakable
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> Option<Block> {
        if !self.get_block(x, y, z)?.is_breakable {
            return None;
        }
        let removed = self.take_block(x, y, z);
        if let Some(below) = self.get_block_mut(x, y - 1, z) {
            below.has_water_above = false;
        }
        self.recompute_neighbors();
        removed
    }

    /// Every block the renderer has to draw: non-air and not fully occluded.
    pub fn blocks_to_render(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().flatten().filter(|block| block.is_renderable())
    }

    /// Flags every water block to spread on the next simulation tick.
    pub fn mark_water_for_spread(&mut self) {
        for block in self.blocks.iter_mut().flatten() {
            if block.is_water() {
                block.spread_this_tick = true;
            }
        }
    }

    /// Highest non-water block of a local column.
    pub fn highest_block(&self, x: i32, z: i32) -> Option<&Block> {
        (0..self.height)
            .rev()
            .filter_map(|y| self.get_block(x, y, z))
            .find(|block| !block.is_water())
    }

    /// Number of occupied cells.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().flatten().count()
    }

    /// Whether two chunks hold identical cells, ignoring identifiers.
    pub fn same_contents(&self, other: &Chunk) -> bool {
        self.offset == other.offset
            && self.blocks == other.blocks
            && self.cave_flags == other.cave_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Chunk {
        Chunk::empty(ChunkCoord::new(1, -1), 0, 4, 8)
    }

    #[test]
    fn chunk_coord_uses_floor_division() {
        assert_eq!(ChunkCoord::containing(-1, 0, 16), ChunkCoord::new(-1, 0));
        assert_eq!(ChunkCoord::containing(15, 16, 16), ChunkCoord::new(0, 1));
        assert_eq!(ChunkCoord::new(0, 0).square(2).count(), 25);
    }

    #[test]
    fn cell_count_rejects_unindexable_dimensions() {
        assert_eq!(Chunk::cell_count(4, 8), Some(128));
        assert_eq!(Chunk::cell_count(0, 8), None);
        assert_eq!(Chunk::cell_count(4, -1), None);
        assert_eq!(Chunk::cell_count(50_000, 50_000), None);
        assert_eq!(Chunk::cell_count(46_341, 1), None);
    }

    #[test]
    #[should_panic(expected = "cannot be indexed")]
    fn oversized_chunks_are_refused() {
        Chunk::empty(ChunkCoord::new(0, 0), 0, 50_000, 50_000);
    }

    #[test]
    fn out_of_range_lookups_are_empty() {
        let mut chunk = chunk();
        assert!(chunk.get_block(-1, 0, 0).is_none());
        assert!(chunk.get_block(0, 8, 0).is_none());
        assert!(!chunk.put_block_type(4, 0, 0, BlockType::Stone));
        assert!(!chunk.is_cave(0, -1, 0));
    }

    #[test]
    fn world_and_local_coordinates_agree() {
        let mut chunk = chunk();
        chunk.put_block_type(2, 3, 1, BlockType::Dirt);
        let block = chunk.get_block_at_world(6, 3, -3).unwrap();
        assert_eq!(block.position, Point3::new(6.0, 3.0, -3.0));
    }

    #[test]
    fn place_refuses_occupied_cells() {
        let mut chunk = chunk();
        assert!(chunk.place_block(0, 0, 0, BlockType::Glass));
        assert!(!chunk.place_block(0, 0, 0, BlockType::Stone));
        assert_eq!(chunk.get_block(0, 0, 0).unwrap().block_type, BlockType::Glass);
    }

    #[test]
    fn unbreakable_blocks_survive_removal() {
        let mut chunk = chunk();
        chunk.put_block_type(1, 1, 1, BlockType::Sand);
        chunk.get_block_mut(1, 1, 1).unwrap().is_breakable = false;
        assert!(chunk.remove_block(1, 1, 1).is_none());
        assert!(chunk.is_occupied(1, 1, 1));
    }

    #[test]
    fn removal_clears_water_marker_below() {
        let mut chunk = chunk();
        chunk.put_block(1, 0, 1, Block::water(chunk.world_position(1, 0, 1), 8));
        chunk.put_block(1, 1, 1, Block::water(chunk.world_position(1, 1, 1), 8));
        chunk.recompute_neighbors();
        assert!(chunk.get_block(1, 0, 1).unwrap().has_water_above);

        chunk.remove_block(1, 1, 1);
        assert!(!chunk.get_block(1, 0, 1).unwrap().has_water_above);
    }

    #[test]
    fn highest_block_skips_water() {
        let mut chunk = chunk();
        chunk.put_block_type(0, 2, 0, BlockType::Stone);
        chunk.put_block(0, 3, 0, Block::water(chunk.world_position(0, 3, 0), 8));
        assert_eq!(chunk.highest_block(0, 0).unwrap().position.y, 2.0);
        assert!(chunk.highest_block(1, 1).is_none());
    }
}
