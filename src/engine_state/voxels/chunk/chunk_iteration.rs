//! # Chunk Iteration Module
//!
//! This module provides an iterator over the occupied cells of a chunk.
//!
//! Cells are visited bottom-up: `x` varies fastest, then `z`, then `y`. Empty
//! cells are skipped, so the iterator yields exactly the blocks a chunk owns
//! together with their local coordinates.

use cgmath::Point3;

use crate::engine_state::voxels::block::Block;

use super::Chunk;

/// An iterator over all occupied cells in a chunk.
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next cell index to inspect
    current_offset: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` positioned before the first cell.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            current_offset: 0,
        }
    }
}

impl<'a> Iterator for ChunkBlockIterator<'a> {
    type Item = (Point3<i32>, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        let blocks = &self.chunk_ref.blocks;
        while self.current_offset < blocks.len() {
            let index = self.current_offset;
            self.current_offset += 1;
            if let Some(block) = blocks[index].as_ref() {
                let (x, y, z) = self.chunk_ref.coords_of(index);
                return Some((Point3::new(x, y, z), block));
            }
        }
        None
    }
}

impl Chunk {
    /// Iterates over every occupied cell with its local coordinates.
    pub fn iter_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }
}
