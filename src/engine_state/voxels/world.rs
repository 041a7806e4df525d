//! # World Module
//!
//! This module provides the `World` struct which manages the loaded chunks of the voxel world.
//! It serves as the central coordinator for chunk streaming, eviction, block access and
//! the simulation tick.
//!
//! ## Architecture
//!
//! The world keeps three sets of chunks:
//! - **current**: the loaded chunks every lookup reads from, owned by the main thread
//! - **future**: generated chunks waiting to be swapped in
//! - **in flight**: coordinates a generation task is currently working on
//!
//! The future and in-flight sets live in a [`StreamingState`] behind an `MtResource`.
//! Generation tasks hold a clone of it and record their chunk from the worker thread,
//! so the future set can turn ready before the task results are drained.
//!
//! Generated chunks only ever become visible through `swap_in_future_chunks()`, which
//! moves the whole future set into current in one step. Lookups therefore never see a
//! half-generated chunk.
//!
//! ## Populated Blocks
//!
//! The render snapshot is double buffered the same way. A build runs in a worker, lands
//! in `next` and is swapped in on the following frame. Refresh requests arriving while a
//! build runs are folded into a single follow-up build.
//!
//! ## Performance Considerations
//!
//! - Chunk lookup is O(1) using a hash map
//! - The simulation tick updates chunks in parallel, one exclusive owner per chunk
//! - Memory is bounded by evicting the least recently visited chunks

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use cgmath::{InnerSpace, Point3, Vector3};
use log::{debug, info, warn};
use lru::LruCache;
use rayon::prelude::*;

use crate::core::MtResource;
use crate::engine_state::config::WorldConfig;

use super::{
    block::{block_side::BlockSide, block_type::BlockType, Block},
    chunk::{chunk_creation::ChunkGenerator, Chunk, ChunkCoord},
    populated_blocks::PopulatedBlocks,
    simulation::{apply_spill, SimulationTicker, TickOutcome},
    tasks::populated_blocks_task::PopulatedBlocksTask,
    BlockLookup,
};

/// Chunks produced by the streaming path that are not loaded yet.
#[derive(Default)]
pub struct StreamingState {
    /// Generated chunks waiting for the next swap.
    pending: HashMap<ChunkCoord, Chunk>,
    /// Coordinates a generation task is working on.
    in_flight: HashSet<ChunkCoord>,
    /// Set once every requested chunk has arrived.
    ready: bool,
}

impl StreamingState {
    /// Stores a generated chunk as a future chunk.
    ///
    /// The future set becomes ready once no generation is in flight anymore.
    pub fn receive(&mut self, chunk: Chunk) {
        let was_in_flight = self.in_flight.remove(&chunk.offset);
        debug_assert!(
            was_in_flight,
            "chunk ({}, {}) arrived without being requested",
            chunk.offset.x, chunk.offset.z
        );
        debug!("Received chunk {} at ({}, {})", chunk.id, chunk.offset.x, chunk.offset.z);
        self.pending.insert(chunk.offset, chunk);
        if self.in_flight.is_empty() {
            self.ready = true;
        }
    }
}

/// A ray hit returned by [`World::pick_block`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockHit {
    /// Cell of the block that was hit.
    pub cell: Point3<i32>,
    /// Point on the ray that lies inside the cell.
    pub ray_point: Point3<f32>,
}

/// A streamed voxel world.
///
/// # Examples
///
/// ```rust,ignore
/// let mut world = World::new(Arc::new(WorldConfig::default()));
/// world.load_area_blocking(ChunkCoord::new(0, 0));
///
/// let ground = world.find_highest_block(0, 0);
/// ```
pub struct World {
    generator: ChunkGenerator,
    chunks: HashMap<ChunkCoord, Chunk>,
    streaming: MtResource<StreamingState>,
    recency: LruCache<ChunkCoord, ()>,
    center: ChunkCoord,
    viewer: Point3<f32>,
    populated: PopulatedBlocks,
    next_populated: Option<PopulatedBlocks>,
    build_in_flight: bool,
    refresh_requested: bool,
    ticker: SimulationTicker,
}

impl World {
    /// Creates an empty world generating terrain from the configured seed.
    pub fn new(config: Arc<WorldConfig>) -> Self {
        Self::with_generator(ChunkGenerator::new(config))
    }

    /// Creates an empty world around an existing generator.
    pub fn with_generator(generator: ChunkGenerator) -> Self {
        let ticker = SimulationTicker::new(generator.config());
        World {
            generator,
            chunks: HashMap::new(),
            streaming: MtResource::default(),
            recency: LruCache::unbounded(),
            center: ChunkCoord::new(0, 0),
            viewer: Point3::new(0.0, 0.0, 0.0),
            populated: PopulatedBlocks::default(),
            next_populated: None,
            build_in_flight: false,
            refresh_requested: false,
            ticker,
        }
    }

    /// The configuration the world was generated with.
    pub fn config(&self) -> &WorldConfig {
        self.generator.config()
    }

    /// The generator, cloned into background generation tasks.
    pub fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    /// A handle on the streaming state for generation tasks.
    pub fn streaming_handle(&self) -> MtResource<StreamingState> {
        self.streaming.clone()
    }

    /// The chunk coordinate streaming is currently centered on.
    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    /// The simulation clock.
    pub fn ticker(&self) -> &SimulationTicker {
        &self.ticker
    }

    /// Number of loaded chunks.
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the chunk at `coord` is loaded.
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// The loaded chunk at `coord`.
    pub fn chunk_at(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// The loaded chunk containing a continuous world position.
    pub fn chunk_containing(&self, position: Point3<f32>) -> Option<&Chunk> {
        self.chunk_at(ChunkCoord::containing_point(position, self.config().chunk_size))
    }

    fn chunk_of(&self, x: i32, z: i32) -> ChunkCoord {
        ChunkCoord::containing(x, z, self.config().chunk_size)
    }

    /// Gets the block at world coordinates.
    ///
    /// # Returns
    /// `None` for empty cells, unloaded chunks and heights outside the world
    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> Option<&Block> {
        self.chunks
            .get(&self.chunk_of(x, z))?
            .get_block_at_world(x, y, z)
    }

    /// Highest non-water block of a world column.
    pub fn find_highest_block(&self, x: i32, z: i32) -> Option<&Block> {
        let chunk = self.chunks.get(&self.chunk_of(x, z))?;
        let (lx, lz) = chunk.to_local(x, z);
        chunk.highest_block(lx, lz)
    }

    /// Blocking streaming path.
    ///
    /// Generates every chunk within the streaming radius of `center` that is
    /// neither loaded, pending nor in flight, stores them as future chunks and
    /// marks the future set ready. The chunks become visible on the next
    /// [`World::swap_in_future_chunks`].
    ///
    /// # Returns
    /// The number of chunks generated
    pub fn handle_chunk_change(&mut self, center: ChunkCoord) -> usize {
        self.center = center;
        self.promote_area(center);

        let radius = self.config().streaming_radius;
        let mut streaming = self.streaming.get_mut();
        let mut generated = 0;
        for coord in center.square(radius) {
            if self.chunks.contains_key(&coord)
                || streaming.pending.contains_key(&coord)
                || streaming.in_flight.contains(&coord)
            {
                continue;
            }
            streaming.pending.insert(coord, self.generator.generate(coord));
            generated += 1;
        }
        streaming.ready = streaming.in_flight.is_empty();
        drop(streaming);

        info!(
            "Generated {} chunks around ({}, {})",
            generated, center.x, center.z
        );
        generated
    }

    /// Asynchronous streaming path.
    ///
    /// Marks every missing coordinate within the streaming radius as in flight.
    /// The caller publishes one generation task per returned coordinate. Each task
    /// records its chunk through [`StreamingState::receive`].
    pub fn begin_streaming(&mut self, center: ChunkCoord) -> Vec<ChunkCoord> {
        self.center = center;
        self.promote_area(center);

        let radius = self.config().streaming_radius;
        let mut streaming = self.streaming.get_mut();
        let mut requested = Vec::new();
        for coord in center.square(radius) {
            if self.chunks.contains_key(&coord)
                || streaming.pending.contains_key(&coord)
                || !streaming.in_flight.insert(coord)
            {
                continue;
            }
            requested.push(coord);
        }
        drop(streaming);

        if !requested.is_empty() {
            info!(
                "Streaming {} chunks around ({}, {})",
                requested.len(),
                center.x,
                center.z
            );
        }
        requested
    }

    /// Stores a chunk generated outside a task as a future chunk.
    pub fn receive_generated_chunk(&mut self, chunk: Chunk) {
        self.streaming.get_mut().receive(chunk);
    }

    /// Number of chunks that are requested but not generated yet.
    pub fn chunks_in_flight(&self) -> usize {
        self.streaming.get().in_flight.len()
    }

    /// Moves the future chunks into the loaded set if they are ready, then evicts.
    ///
    /// # Returns
    /// The number of chunks swapped in
    pub fn swap_in_future_chunks(&mut self) -> usize {
        let incoming = {
            let mut streaming = self.streaming.get_mut();
            if !streaming.ready {
                return 0;
            }
            streaming.ready = false;
            std::mem::take(&mut streaming.pending)
        };

        let swapped = incoming.len();
        for (coord, chunk) in incoming {
            self.recency.put(coord, ());
            self.chunks.insert(coord, chunk);
        }
        self.promote_area(self.center);

        if swapped > 0 {
            info!("Swapped in {} chunks, {} loaded", swapped, self.chunks.len());
            self.request_populated_refresh();
        }
        self.evict();
        swapped
    }

    /// Generates the area around `center` and loads it immediately.
    pub fn load_area_blocking(&mut self, center: ChunkCoord) {
        self.handle_chunk_change(center);
        self.swap_in_future_chunks();
        self.refresh_populated_blocks();
    }

    fn promote_area(&mut self, center: ChunkCoord) {
        let radius = self.config().streaming_radius;
        for coord in center.square(radius) {
            if self.chunks.contains_key(&coord) {
                self.recency.promote(&coord);
            }
        }
    }

    /// Drops least recently visited chunks until the configured bound holds.
    ///
    /// Chunks inside the streaming square around the current center are kept.
    ///
    /// # Returns
    /// The coordinates of the evicted chunks
    pub fn evict(&mut self) -> Vec<ChunkCoord> {
        let Some(max) = self.config().max_loaded_chunks.and_then(NonZeroUsize::new) else {
            return Vec::new();
        };
        let radius = self.config().streaming_radius;

        let mut evicted = Vec::new();
        let mut kept = 0;
        while self.chunks.len() > max.get() && kept <= self.recency.len() {
            let Some((coord, ())) = self.recency.pop_lru() else {
                break;
            };
            if coord.distance(self.center) <= radius {
                self.recency.put(coord, ());
                kept += 1;
                continue;
            }
            self.chunks.remove(&coord);
            evicted.push(coord);
        }

        if !evicted.is_empty() {
            info!("Evicted {} chunks, {} loaded", evicted.len(), self.chunks.len());
            self.request_populated_refresh();
        }
        evicted
    }

    /// Marches along a ray and returns the first occupied cell.
    ///
    /// # Arguments
    /// * `origin` - Start of the ray, usually the actor's eye
    /// * `direction` - Direction of the ray, normalized internally
    /// * `max_distance` - Reach of the ray
    /// * `step` - Distance between two samples
    pub fn pick_block(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        step: f32,
    ) -> Option<BlockHit> {
        if direction.magnitude2() == 0.0 || step <= 0.0 {
            return None;
        }
        let direction = direction.normalize();

        let mut distance = 0.0;
        while distance < max_distance {
            let ray_point = origin + direction * distance;
            let cell = Point3::new(
                ray_point.x.round() as i32,
                ray_point.y.round() as i32,
                ray_point.z.round() as i32,
            );
            if self.get_block_at(cell.x, cell.y, cell.z).is_some() {
                return Some(BlockHit { cell, ray_point });
            }
            distance += step;
        }
        None
    }

    /// Chooses the empty cell next to `hit` that the ray entered through.
    ///
    /// The face with the smallest margin between the ray point and the block's
    /// bounds wins. Ties resolve in the order +X, +Y, +Z, -X, -Y, -Z.
    ///
    /// # Returns
    /// The adjacent cell, or `None` if it is occupied, unloaded or outside the world
    pub fn find_placement_position(
        &self,
        hit: Point3<i32>,
        ray_point: Point3<f32>,
    ) -> Option<Point3<i32>> {
        let center = Point3::new(hit.x as f32, hit.y as f32, hit.z as f32);
        let margin = |side: BlockSide| match side {
            BlockSide::Right => center.x + 0.5 - ray_point.x,
            BlockSide::Top => center.y + 0.5 - ray_point.y,
            BlockSide::Front => center.z + 0.5 - ray_point.z,
            BlockSide::Left => ray_point.x - (center.x - 0.5),
            BlockSide::Bottom => ray_point.y - (center.y - 0.5),
            BlockSide::Back => ray_point.z - (center.z - 0.5),
        };

        let mut best = BlockSide::Right;
        let mut best_margin = f32::INFINITY;
        for side in BlockSide::placement_order() {
            let candidate = margin(side);
            if candidate < best_margin {
                best = side;
                best_margin = candidate;
            }
        }

        let (dx, dy, dz) = best.offset();
        let target = Point3::new(hit.x + dx, hit.y + dy, hit.z + dz);
        let chunk = self.chunks.get(&self.chunk_of(target.x, target.z))?;
        let (lx, lz) = chunk.to_local(target.x, target.z);
        (chunk.in_bounds(lx, target.y, lz) && !chunk.is_occupied(lx, target.y, lz)).then_some(target)
    }

    /// Removes a breakable block.
    ///
    /// # Returns
    /// The removed block, or `None` if nothing breakable was there
    pub fn remove_block_from(&mut self, position: Point3<i32>) -> Option<Block> {
        let coord = self.chunk_of(position.x, position.z);
        let chunk = self.chunks.get_mut(&coord)?;
        let (lx, lz) = chunk.to_local(position.x, position.z);
        let removed = chunk.remove_block(lx, position.y, lz)?;

        debug!(
            "Removed {:?} at ({}, {}, {})",
            removed.block_type, position.x, position.y, position.z
        );
        self.request_populated_refresh();
        Some(removed)
    }

    /// Places a block into an empty cell.
    ///
    /// # Returns
    /// `true` if the block was placed
    pub fn add_block_at(&mut self, position: Point3<i32>, block_type: BlockType) -> bool {
        let coord = self.chunk_of(position.x, position.z);
        let placed = match self.chunks.get_mut(&coord) {
            Some(chunk) => {
                let (lx, lz) = chunk.to_local(position.x, position.z);
                chunk.place_block(lx, position.y, lz, block_type)
            }
            None => false,
        };

        if placed {
            debug!(
                "Placed {:?} at ({}, {}, {})",
                block_type, position.x, position.y, position.z
            );
            self.request_populated_refresh();
        } else {
            warn!(
                "Rejected placement of {:?} at ({}, {}, {})",
                block_type, position.x, position.y, position.z
            );
        }
        placed
    }

    /// Advances the simulation clock and runs a tick on every loaded chunk when due.
    ///
    /// Chunks update in parallel. Water crossing a chunk border is applied to
    /// the neighboring chunk afterwards, or dropped if that chunk is not loaded.
    ///
    /// # Returns
    /// `true` if a tick ran
    pub fn advance_simulation(&mut self, dt: f32) -> bool {
        let Some(elapsed) = self.ticker.advance(dt) else {
            return false;
        };

        let ticker = &self.ticker;
        let outcomes: Vec<(ChunkCoord, TickOutcome)> = self
            .chunks
            .par_iter_mut()
            .map(|(coord, chunk)| (*coord, ticker.update_chunk(chunk, elapsed)))
            .collect();

        let mut mutated = outcomes.iter().filter(|(_, outcome)| outcome.mutated).count();
        let mut spilled_into = HashSet::new();
        let mut dropped = 0;
        for spill in outcomes.iter().flat_map(|(_, outcome)| &outcome.spills) {
            let coord = self.chunk_of(spill.x, spill.z);
            match self.chunks.get_mut(&coord) {
                Some(chunk) => {
                    if apply_spill(chunk, spill) {
                        spilled_into.insert(coord);
                    }
                }
                None => dropped += 1,
            }
        }
        for coord in &spilled_into {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.recompute_neighbors();
            }
        }
        mutated += spilled_into.len();

        debug!(
            "Tick {}: {} chunks changed, {} spills applied across {} chunks, {} dropped",
            self.ticker.ticks(),
            mutated,
            outcomes.iter().map(|(_, outcome)| outcome.spills.len()).sum::<usize>() - dropped,
            spilled_into.len(),
            dropped
        );

        if mutated > 0 {
            self.request_populated_refresh();
        }
        true
    }

    /// Tracks the eye position translucent blocks are sorted against.
    pub fn set_viewer(&mut self, viewer: Point3<f32>) {
        self.viewer = viewer;
    }

    /// Renderable blocks of every chunk within the view distance of `center`.
    pub fn collect_visible_blocks(&self, center: ChunkCoord) -> Vec<Block> {
        let view_distance = self.config().view_distance;
        self.chunks
            .iter()
            .filter(|(coord, _)| coord.distance(center) <= view_distance)
            .flat_map(|(_, chunk)| chunk.blocks_to_render().copied())
            .collect()
    }

    /// Asks for the populated blocks to be rebuilt.
    pub fn request_populated_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Whether a rebuild was requested and has not started yet.
    pub fn populated_refresh_requested(&self) -> bool {
        self.refresh_requested
    }

    /// Starts a background build of the populated blocks if one was requested.
    ///
    /// While a build runs, further requests are held back and produce a single
    /// follow-up build once the running one is stored.
    pub fn take_populated_build(&mut self) -> Option<PopulatedBlocksTask> {
        if !self.refresh_requested || self.build_in_flight {
            return None;
        }
        self.refresh_requested = false;
        self.build_in_flight = true;
        Some(PopulatedBlocksTask::new(
            self.collect_visible_blocks(self.center),
            self.viewer,
        ))
    }

    /// Stores a finished build for the next swap.
    pub fn store_next_populated(&mut self, populated: PopulatedBlocks) {
        self.build_in_flight = false;
        self.next_populated = Some(populated);
    }

    /// Installs the stored build, if any.
    ///
    /// # Returns
    /// `true` if a new snapshot was installed
    pub fn swap_populated_blocks(&mut self) -> bool {
        match self.next_populated.take() {
            Some(next) => {
                debug!(
                    "Swapped populated blocks: {} opaque, {} translucent",
                    next.opaque.len(),
                    next.translucent.len()
                );
                self.populated = next;
                true
            }
            None => false,
        }
    }

    /// Rebuilds and installs the populated blocks on the calling thread.
    pub fn refresh_populated_blocks(&mut self) {
        self.refresh_requested = false;
        self.populated = PopulatedBlocks::build(self.collect_visible_blocks(self.center), self.viewer);
    }

    /// The current render snapshot.
    pub fn populated_blocks(&self) -> &PopulatedBlocks {
        &self.populated
    }
}

impl BlockLookup for World {
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&Block> {
        self.get_block_at(x, y, z)
    }
}
