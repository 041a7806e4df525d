//! # Populated Blocks
//!
//! The render-visible snapshot of the world around the viewer. Opaque blocks
//! can be drawn in any order, translucent ones (glass, leaves, water) are kept
//! sorted back to front so blending composes correctly.

use std::cmp::Ordering;

use cgmath::{MetricSpace, Point3};

use super::block::Block;

/// A partitioned copy of every block that needs drawing.
#[derive(Clone, Debug, Default)]
pub struct PopulatedBlocks {
    /// Blocks drawn without blending.
    pub opaque: Vec<Block>,
    /// Blended blocks, farthest from the viewer first.
    pub translucent: Vec<Block>,
}

impl PopulatedBlocks {
    /// Partitions renderable blocks and sorts the translucent ones.
    ///
    /// # Arguments
    /// * `blocks` - Blocks collected from the chunks around the viewer
    /// * `viewer` - Eye position the translucent order is computed for
    pub fn build(blocks: Vec<Block>, viewer: Point3<f32>) -> Self {
        let (mut translucent, opaque): (Vec<Block>, Vec<Block>) = blocks
            .into_iter()
            .partition(|block| block.block_type.is_translucent());

        translucent.sort_by(|a, b| {
            let da = a.position.distance2(viewer);
            let db = b.position.distance2(viewer);
            db.partial_cmp(&da).unwrap_or(Ordering::Equal)
        });

        Self { opaque, translucent }
    }

    /// Total number of blocks in the snapshot.
    pub fn len(&self) -> usize {
        self.opaque.len() + self.translucent.len()
    }

    /// Whether the snapshot holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.translucent.is_empty()
    }
}
