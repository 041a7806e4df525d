//! # Simulation Ticker
//!
//! A cellular automaton advanced on a fixed tick. Each tick every loaded chunk
//! runs one bottom-up pass over its sand and water:
//!
//! * **Sand** without support starts falling. It descends continuously and
//!   relocates into the first free cell above the ground once it reaches it.
//! * **Water** marked for this tick pours into an empty cell below at full
//!   force. Otherwise it spreads sideways at one force level less, which limits
//!   a source to a Manhattan radius of seven cells.
//!
//! After the pass all water is marked for the next tick, so newly created water
//! only spreads once the following tick begins.
//!
//! Chunks never write into each other. Water that would spread across a chunk
//! border is returned as a [`WaterSpill`] and applied by the world once every
//! chunk has finished its pass.

use cgmath::Point3;

use crate::engine_state::config::WorldConfig;

use super::{
    block::{block_side::BlockSide, block_type::BlockType, Block, MAX_WATER_FORCE, MIN_WATER_FORCE},
    chunk::Chunk,
};

/// Water that spread across a chunk border, addressed in world coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaterSpill {
    /// World X of the target cell.
    pub x: i32,
    /// World Y of the target cell.
    pub y: i32,
    /// World Z of the target cell.
    pub z: i32,
    /// Force of the water to create.
    pub force: u8,
}

/// What a single chunk pass changed.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Whether any block moved, appeared or changed state.
    pub mutated: bool,
    /// Water destined for neighboring chunks.
    pub spills: Vec<WaterSpill>,
}

/// Fixed-rate driver of the sand and water automaton.
#[derive(Debug, Clone)]
pub struct SimulationTicker {
    tick_rate: f32,
    falling_speed: f32,
    accumulator: f32,
    ticks: u64,
}

impl SimulationTicker {
    /// Creates a ticker from the world configuration.
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            tick_rate: config.tick_rate,
            falling_speed: config.falling_speed,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Accumulates frame time.
    ///
    /// # Arguments
    /// * `dt` - Seconds since the previous frame
    ///
    /// # Returns
    /// The simulated duration of the tick if a tick boundary was crossed. At
    /// most one tick is reported per call; leftover time carries over, capped
    /// at one tick.
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        self.accumulator += dt;
        if self.accumulator < self.tick_rate {
            return None;
        }
        self.accumulator = (self.accumulator - self.tick_rate).min(self.tick_rate);
        self.ticks += 1;
        Some(self.tick_rate)
    }

    /// Runs one simulation pass over a chunk and marks its water for the next tick.
    ///
    /// # Arguments
    /// * `chunk` - The chunk to update, exclusively owned for the duration of the pass
    /// * `elapsed` - Simulated seconds covered by this tick
    pub fn update_chunk(&self, chunk: &mut Chunk, elapsed: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        let candidates: Vec<Point3<i32>> = chunk
            .iter_blocks()
            .filter(|(_, block)| {
                block.block_type == BlockType::Sand || (block.is_water() && block.spread_this_tick)
            })
            .map(|(position, _)| position)
            .collect();

        for position in candidates {
            let Some(block) = chunk.get_block(position.x, position.y, position.z).copied() else {
                continue;
            };
            match block.block_type {
                BlockType::Sand => {
                    outcome.mutated |= self.update_sand(chunk, position, block, elapsed);
                }
                BlockType::Water if block.spread_this_tick => {
                    spread_water(chunk, position, &block, &mut outcome);
                }
                _ => {}
            }
        }

        if outcome.mutated {
            chunk.recompute_neighbors();
        }
        chunk.mark_water_for_spread();
        outcome
    }

    /// Moves a sand block that may be falling.
    ///
    /// The block stays stored in its origin cell `at` while its position descends.
    /// Landing looks for ground under the cell the block occupied at the start of
    /// the tick, so cells filled above it in the meantime are ignored.
    fn update_sand(&self, chunk: &mut Chunk, at: Point3<i32>, mut block: Block, elapsed: f32) -> bool {
        if !block.is_falling {
            if at.y == 0 || chunk.is_occupied(at.x, at.y - 1, at.z) {
                return false;
            }
            block.is_falling = true;
            block.is_breakable = false;
        }

        let top = (block.position.y.ceil() as i32).min(at.y);
        block.position.y -= self.falling_speed * elapsed;

        let ground = (0..top).rev().find(|&y| chunk.is_occupied(at.x, y, at.z));
        let rest_y = ground.map_or(0, |y| y + 1);

        if block.position.y > rest_y as f32 {
            chunk.put_block(at.x, at.y, at.z, block);
            return true;
        }

        // A block placed into the landing cell pushes the sand up onto it.
        let rest_y = (rest_y..at.y)
            .find(|&y| !chunk.is_occupied(at.x, y, at.z))
            .unwrap_or(at.y);
        chunk.take_block(at.x, at.y, at.z);
        block.position = chunk.world_position(at.x, rest_y, at.z);
        block.is_falling = false;
        block.is_breakable = true;
        chunk.put_block(at.x, rest_y, at.z, block);
        log::debug!(
            "Sand landed at ({}, {}, {})",
            block.position.x,
            block.position.y,
            block.position.z
        );
        true
    }
}

fn spread_water(chunk: &mut Chunk, at: Point3<i32>, block: &Block, outcome: &mut TickOutcome) {
    match chunk.get_block(at.x, at.y - 1, at.z) {
        Some(below) if below.is_water() => return,
        None => {
            // Row 0 is the world floor and never receives flowing water.
            if at.y - 1 >= 1 {
                let position = chunk.world_position(at.x, at.y - 1, at.z);
                chunk.put_block(at.x, at.y - 1, at.z, Block::water(position, MAX_WATER_FORCE));
                outcome.mutated = true;
            }
            return;
        }
        Some(_) => {}
    }

    if block.water_force() <= MIN_WATER_FORCE {
        return;
    }
    let force = block.water_force() - 1;

    for side in BlockSide::horizontal() {
        let (dx, _, dz) = side.offset();
        let (nx, nz) = (at.x + dx, at.z + dz);

        if !chunk.in_bounds(nx, at.y, nz) {
            let (ox, oz) = chunk.world_origin();
            outcome.spills.push(WaterSpill {
                x: ox + nx,
                y: at.y,
                z: oz + nz,
                force,
            });
            continue;
        }

        if chunk.is_occupied(nx, at.y, nz) {
            continue;
        }
        if chunk.get_block(nx, at.y - 1, nz).is_some_and(Block::is_water) {
            continue;
        }
        let position = chunk.world_position(nx, at.y, nz);
        chunk.put_block(nx, at.y, nz, Block::water(position, force));
        outcome.mutated = true;
    }
}

/// Applies a spill to the chunk that owns its target cell.
///
/// Spills are applied after every chunk finished its pass, so the new water is
/// marked to spread on the next tick like the rest.
///
/// # Returns
/// `true` if water was placed
pub fn apply_spill(chunk: &mut Chunk, spill: &WaterSpill) -> bool {
    let (x, z) = chunk.to_local(spill.x, spill.z);
    if !chunk.in_bounds(x, spill.y, z) || chunk.is_occupied(x, spill.y, z) {
        return false;
    }
    if chunk.get_block(x, spill.y - 1, z).is_some_and(Block::is_water) {
        return false;
    }
    let position = chunk.world_position(x, spill.y, z);
    let mut water = Block::water(position, spill.force);
    water.spread_this_tick = true;
    chunk.put_block(x, spill.y, z, water);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::ChunkCoord;

    fn config() -> WorldConfig {
        WorldConfig {
            chunk_size: 16,
            world_height: 16,
            falling_speed: 4.0,
            tick_rate: 0.5,
            ..WorldConfig::default()
        }
    }

    fn floor_chunk() -> Chunk {
        let mut chunk = Chunk::empty(ChunkCoord::new(0, 0), 0, 16, 16);
        for x in 0..16 {
            for z in 0..16 {
                chunk.put_block_type(x, 0, z, BlockType::Stone);
            }
        }
        chunk
    }

    fn tick(ticker: &SimulationTicker, chunk: &mut Chunk) -> TickOutcome {
        ticker.update_chunk(chunk, 0.5)
    }

    #[test]
    fn ticker_fires_once_per_boundary() {
        let mut ticker = SimulationTicker::new(&config());
        assert_eq!(ticker.advance(0.3), None);
        assert_eq!(ticker.advance(0.3), Some(0.5));
        assert_eq!(ticker.advance(0.1), None);
        assert_eq!(ticker.advance(10.0), Some(0.5));
        assert_eq!(ticker.advance(0.0), Some(0.5));
        assert_eq!(ticker.ticks(), 3);
    }

    #[test]
    fn unsupported_sand_falls_and_lands() {
        let ticker = SimulationTicker::new(&config());
        let mut chunk = floor_chunk();
        chunk.put_block_type(3, 6, 3, BlockType::Sand);

        tick(&ticker, &mut chunk);
        let falling = chunk.get_block(3, 6, 3).unwrap();
        assert!(falling.is_falling);
        assert!(!falling.is_breakable);
        assert_eq!(falling.position.y, 4.0);

        for _ in 0..3 {
            tick(&ticker, &mut chunk);
        }
        assert!(!chunk.is_occupied(3, 6, 3));
        let landed = chunk.get_block(3, 1, 3).unwrap();
        assert_eq!(landed.block_type, BlockType::Sand);
        assert!(!landed.is_falling);
        assert!(landed.is_breakable);
        assert_eq!(landed.position.y, 1.0);
    }

    #[test]
    fn sand_ignores_blocks_placed_above_its_fall() {
        let ticker = SimulationTicker::new(&config());
        let mut chunk = floor_chunk();
        chunk.put_block_type(3, 10, 3, BlockType::Sand);

        tick(&ticker, &mut chunk);
        assert_eq!(chunk.get_block(3, 10, 3).unwrap().position.y, 8.0);
        chunk.put_block_type(3, 9, 3, BlockType::Stone);

        tick(&ticker, &mut chunk);
        let falling = chunk.get_block(3, 10, 3).unwrap();
        assert!(falling.is_falling);
        assert_eq!(falling.position.y, 6.0);

        for _ in 0..3 {
            tick(&ticker, &mut chunk);
        }
        assert!(!chunk.is_occupied(3, 10, 3));
        assert_eq!(chunk.get_block(3, 9, 3).unwrap().block_type, BlockType::Stone);
        let landed = chunk.get_block(3, 1, 3).unwrap();
        assert_eq!(landed.block_type, BlockType::Sand);
        assert!(!landed.is_falling);
    }

    #[test]
    fn supported_sand_stays_put() {
        let ticker = SimulationTicker::new(&config());
        let mut chunk = floor_chunk();
        chunk.put_block_type(3, 1, 3, BlockType::Sand);
        let outcome = tick(&ticker, &mut chunk);
        assert!(!outcome.mutated);
        assert!(!chunk.get_block(3, 1, 3).unwrap().is_falling);
    }

    #[test]
    fn water_spreads_only_after_being_marked() {
        let ticker = SimulationTicker::new(&config());
        let mut chunk = floor_chunk();
        chunk.put_block_type(8, 1, 8, BlockType::Water);

        let first = tick(&ticker, &mut chunk);
        assert!(!first.mutated);
        assert!(chunk.get_block(8, 1, 8).unwrap().spread_this_tick);

        tick(&ticker, &mut chunk);
        for (x, z) in [(9, 8), (7, 8), (8, 9), (8, 7)] {
            let spread = chunk.get_block(x, 1, z).unwrap();
            assert_eq!(spread.water_force(), 7);
        }
        assert!(!chunk.is_occupied(9, 1, 9));
    }

    #[test]
    fn spread_decays_to_a_hard_stop() {
        let ticker = SimulationTicker::new(&config());
        let mut chunk = floor_chunk();
        chunk.put_block_type(8, 1, 8, BlockType::Water);

        for _ in 0..20 {
            tick(&ticker, &mut chunk);
        }

        for (position, block) in chunk.iter_blocks() {
            if !block.is_water() {
                continue;
            }
            let manhattan = (position.x - 8).abs() + (position.z - 8).abs();
            assert!(manhattan <= 7, "water escaped to {position:?}");
            assert!(block.water_force() >= 1);
            assert_eq!(i32::from(block.water_force()), 8 - manhattan);
        }
        assert_eq!(chunk.get_block(15, 1, 8).unwrap().water_force(), 1);
    }

    #[test]
    fn border_spread_becomes_spills() {
        let ticker = SimulationTicker::new(&config());
        let mut chunk = floor_chunk();
        chunk.put_block_type(15, 1, 4, BlockType::Water);
        chunk.mark_water_for_spread();

        let outcome = tick(&ticker, &mut chunk);
        assert_eq!(
            outcome.spills,
            vec![WaterSpill {
                x: 16,
                y: 1,
                z: 4,
                force: 7
            }]
        );

        let mut neighbor = Chunk::empty(ChunkCoord::new(1, 0), 1, 16, 16);
        neighbor.put_block_type(0, 0, 4, BlockType::Stone);
        assert!(apply_spill(&mut neighbor, &outcome.spills[0]));
        let spilled = neighbor.get_block(0, 1, 4).unwrap();
        assert_eq!(spilled.water_force(), 7);
        assert!(spilled.spread_this_tick);
        assert!(!apply_spill(&mut neighbor, &outcome.spills[0]));
    }
}
