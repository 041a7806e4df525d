//! # Chunk Creation Module
//!
//! This module turns a chunk coordinate into a fully populated chunk. The
//! `ChunkGenerator` runs a fixed sequence of passes over an empty chunk:
//!
//! 1. **Height fill**: a 2D terrain sample decides the column height, stone fills below it
//! 2. **Cave carving**: 3D terrain noise hollows out cells and flags them as caves
//! 3. **Water fill**: empty cells below sea level are flooded downward
//! 4. **Surface resolution**: uncovered tops become grass, covered blocks may turn to dirt or ore
//! 5. **Vegetation**: grass cells away from the border occasionally grow a tree
//! 6. **Neighbor mask**: the whole chunk's occlusion mask is computed once
//!
//! Every pass is a pure function of the world seed and the chunk position, so
//! generating the same coordinate twice yields identical cells.
//!
//! ## Threading
//!
//! The generator is cheap to clone and `Send + Sync`. Background tasks carry a
//! clone and share the chunk identifier counter with the world.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::engine_state::{
    config::WorldConfig,
    voxels::{block::block_type::BlockType, noise_field::NoiseFields},
};

use super::{Chunk, ChunkCoord};

/// Deterministic terrain generator.
#[derive(Clone)]
pub struct ChunkGenerator {
    config: Arc<WorldConfig>,
    noise: NoiseFields,
    next_id: Arc<AtomicU64>,
}

impl ChunkGenerator {
    /// Creates a generator whose noise fields derive from the configured seed.
    pub fn new(config: Arc<WorldConfig>) -> Self {
        let noise = NoiseFields::from_seed(config.seed);
        Self::with_noise(config, noise)
    }

    /// Creates a generator over explicit noise fields.
    pub fn with_noise(config: Arc<WorldConfig>, noise: NoiseFields) -> Self {
        Self {
            config,
            noise,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Allocates an empty chunk with a fresh identifier.
    pub fn empty_chunk(&self, offset: ChunkCoord) -> Chunk {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Chunk::empty(offset, id, self.config.chunk_size, self.config.world_height)
    }

    /// Generates the chunk at the given chunk coordinate.
    ///
    /// # Arguments
    /// * `offset` - The chunk coordinates of the chunk to create
    ///
    /// # Returns
    /// A fully generated chunk with an up to date neighbor mask
    pub fn generate(&self, offset: ChunkCoord) -> Chunk {
        let mut chunk = self.empty_chunk(offset);

        self.fill_heights(&mut chunk);
        self.carve_caves(&mut chunk);
        self.fill_water(&mut chunk);
        self.resolve_surface(&mut chunk);
        self.grow_trees(&mut chunk);
        chunk.recompute_neighbors();

        log::debug!(
            "Generated chunk {} at ({}, {}) with {} blocks",
            chunk.id,
            offset.x,
            offset.z,
            chunk.block_count()
        );
        chunk
    }

    /// Terrain height of a world column, clamped into the world.
    pub fn column_height(&self, world_x: i32, world_z: i32) -> i32 {
        let config = &self.config;
        let scale = config.chunk_smoothness * f64::from(config.chunk_size);
        let sample = self
            .noise
            .terrain
            .get2d(f64::from(world_x) / scale, f64::from(world_z) / scale);
        let half = f64::from(config.world_height / 2);
        let height = (half + (half * sample).round()).round() as i32;
        height.clamp(0, config.world_height - 1)
    }

    /// Fills every column with stone from its terrain height down to the floor.
    pub fn fill_heights(&self, chunk: &mut Chunk) {
        let (ox, oz) = chunk.world_origin();
        for x in 0..chunk.size() {
            for z in 0..chunk.size() {
                let height = self.column_height(ox + x, oz + z);
                for y in 0..=height {
                    chunk.put_block_type(x, y, z, BlockType::Stone);
                }
            }
        }
    }

    /// Hollows out solid cells where the 3D terrain noise crosses the cave threshold.
    ///
    /// Water is never carved and the floor row `y = 0` always stays intact.
    pub fn carve_caves(&self, chunk: &mut Chunk) {
        let config = &self.config;
        let smoothness = config.chunk_smoothness;
        let top = config.cave_ceiling().min(chunk.height());
        let (ox, oz) = chunk.world_origin();

        for x in 0..chunk.size() {
            for z in 0..chunk.size() {
                for y in 1..top {
                    let carvable = chunk.get_block(x, y, z).is_some_and(|block| !block.is_water());
                    if !carvable {
                        continue;
                    }
                    let sample = self.noise.terrain.get3d(
                        f64::from(ox + x) / smoothness,
                        f64::from(y) / smoothness,
                        f64::from(oz + z) / smoothness,
                    );
                    if sample >= config.cave_threshold {
                        chunk.take_block(x, y, z);
                        chunk.set_cave(x, y, z);
                    }
                }
            }
        }
    }

    /// Floods empty, non-cave cells below sea level, pouring down until solid ground.
    pub fn fill_water(&self, chunk: &mut Chunk) {
        let sea_level = self.config.sea_level.min(chunk.height());
        for x in 0..chunk.size() {
            for z in 0..chunk.size() {
                for y in 0..sea_level {
                    if chunk.is_occupied(x, y, z) || chunk.is_cave(x, y, z) {
                        continue;
                    }
                    let mut depth = y;
                    while depth > 1 && !chunk.is_occupied(x, depth, z) {
                        chunk.put_block_type(x, depth, z, BlockType::Water);
                        depth -= 1;
                    }
                }
            }
        }
    }

    /// Turns uncovered tops into grass and covered blocks into dirt or ore.
    ///
    /// For a covered block the dirt, coal and iron rules are applied in that
    /// order and the last one that matches decides the block type.
    pub fn resolve_surface(&self, chunk: &mut Chunk) {
        let config = &self.config;
        let content_smoothness = config.cave_content_smoothness;
        let (ox, oz) = chunk.world_origin();

        for x in 0..chunk.size() {
            for z in 0..chunk.size() {
                let wx = f64::from(ox + x);
                let wz = f64::from(oz + z);
                for y in 0..chunk.height() {
                    let solid = chunk.get_block(x, y, z).is_some_and(|block| !block.is_water());
                    if !solid {
                        continue;
                    }

                    let cover = ((y + 1)..chunk.height())
                        .find(|&k| chunk.is_occupied(x, k, z) || chunk.is_cave(x, k, z));

                    let resolved = match cover {
                        None => Some(BlockType::Grass),
                        Some(k) => {
                            let mut resolved = None;
                            let fy = f64::from(y);
                            if chunk.is_cave(x, k, z)
                                && self.noise.terrain.get3d(
                                    wx / content_smoothness,
                                    fy / content_smoothness,
                                    wz / content_smoothness,
                                ) >= config.cave_dirt_threshold
                            {
                                resolved = Some(BlockType::Dirt);
                            }
                            if y < config.coal_max_height
                                && config.coal_range.contains(self.noise.coal.get3d(
                                    wx / content_smoothness,
                                    fy,
                                    wz / content_smoothness,
                                ))
                            {
                                resolved = Some(BlockType::Coal);
                            }
                            if y < config.iron_max_height
                                && config.iron_range.contains(self.noise.iron.get3d(
                                    wx / content_smoothness,
                                    fy,
                                    wz / content_smoothness,
                                ))
                            {
                                resolved = Some(BlockType::Iron);
                            }
                            resolved
                        }
                    };

                    if let (Some(block_type), Some(block)) = (resolved, chunk.get_block_mut(x, y, z)) {
                        block.block_type = block_type;
                    }
                }
            }
        }
    }

    /// Grows trees on grass cells away from the chunk border.
    ///
    /// The tree roll uses an RNG seeded from the world seed and the chunk
    /// position, so vegetation is as reproducible as the terrain.
    pub fn grow_trees(&self, chunk: &mut Chunk) {
        let config = &self.config;
        if config.tree_probability <= 0.0 {
            return;
        }
        let mut rng = fastrand::Rng::with_seed(tree_seed(config.seed, chunk.offset));

        for x in 1..chunk.size() - 1 {
            for z in 1..chunk.size() - 1 {
                for y in 1..chunk.height() {
                    let on_grass = chunk
                        .get_block(x, y - 1, z)
                        .is_some_and(|block| block.block_type == BlockType::Grass);
                    if !on_grass || chunk.is_occupied(x, y, z) {
                        continue;
                    }
                    if rng.f64() < config.tree_probability {
                        let trunk = rng.i32(config.min_trunk_height..=config.max_trunk_height);
                        place_tree(chunk, x, y, z, trunk);
                    }
                }
            }
        }
    }
}

/// Writes a tree with its trunk base at `(x, y, z)`. Cells outside the chunk are skipped.
fn place_tree(chunk: &mut Chunk, x: i32, y: i32, z: i32, trunk_height: i32) {
    for i in 0..=trunk_height {
        chunk.put_block_type(x, y + i, z, BlockType::Wood);
    }

    let top = y + trunk_height;
    for leaf_y in top..=top + 1 {
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                chunk.put_block_type(x + dx, leaf_y, z + dz, BlockType::Leaves);
            }
        }
    }
    chunk.put_block_type(x, top + 2, z, BlockType::Leaves);
}

fn tree_seed(seed: u64, offset: ChunkCoord) -> u64 {
    seed ^ (i64::from(offset.x) as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (i64::from(offset.z) as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        block::Block,
        noise_field::{ConstantNoise, NoiseFields},
    };

    fn small_config() -> WorldConfig {
        WorldConfig {
            seed: 1234,
            chunk_size: 8,
            world_height: 64,
            cave_min_height: Some(64),
            ..WorldConfig::default()
        }
    }

    fn constant_generator(config: WorldConfig, value: f64) -> ChunkGenerator {
        ChunkGenerator::with_noise(
            Arc::new(config),
            NoiseFields::uniform(Arc::new(ConstantNoise(value))),
        )
    }

    #[test]
    fn generation_is_deterministic() {
        let config = Arc::new(small_config());
        let first = ChunkGenerator::new(config.clone());
        let second = ChunkGenerator::new(config);
        for offset in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 2)] {
            let a = first.generate(offset);
            let b = second.generate(offset);
            let again = first.generate(offset);
            assert!(a.same_contents(&b));
            assert!(a.same_contents(&again));
        }
    }

    #[test]
    fn chunk_ids_increase() {
        let generator = ChunkGenerator::new(Arc::new(small_config()));
        let a = generator.generate(ChunkCoord::new(0, 0));
        let b = generator.clone().generate(ChunkCoord::new(0, 1));
        assert!(b.id > a.id);
    }

    #[test]
    fn heights_stay_inside_the_world() {
        for value in [-1.0, -0.3, 0.0, 0.7, 1.0] {
            let config = small_config();
            let top = config.world_height - 1;
            let generator = constant_generator(config, value);
            let height = generator.column_height(5, -9);
            assert!((0..=top).contains(&height), "height {height} for noise {value}");
        }

        let generator = ChunkGenerator::new(Arc::new(small_config()));
        for wx in -40..40 {
            let height = generator.column_height(wx * 7, wx * 3);
            assert!((0..64).contains(&height));
        }
    }

    #[test]
    fn caves_never_carve_water_or_the_floor() {
        let config = WorldConfig {
            cave_threshold: 0.0,
            ..small_config()
        };
        let generator = constant_generator(config, 0.5);
        let mut chunk = generator.empty_chunk(ChunkCoord::new(0, 0));
        generator.fill_heights(&mut chunk);
        let water = Block::water(chunk.world_position(3, 10, 3), 8);
        chunk.put_block(3, 10, 3, water);

        generator.carve_caves(&mut chunk);

        assert!(chunk.get_block(3, 10, 3).unwrap().is_water());
        assert!(chunk.is_occupied(0, 0, 0));
        assert!(!chunk.is_occupied(0, 1, 0));
        assert!(chunk.is_cave(0, 1, 0));
    }

    #[test]
    fn water_fill_stops_above_the_floor_rows() {
        let config = WorldConfig {
            tree_probability: 0.0,
            ..small_config()
        };
        // A -1 terrain sample leaves only the floor row standing.
        let generator = constant_generator(config, -1.0);
        let chunk = generator.generate(ChunkCoord::new(0, 0));

        assert_eq!(chunk.get_block(2, 0, 2).unwrap().block_type, BlockType::Stone);
        assert!(!chunk.is_occupied(2, 1, 2));
        assert!(chunk.get_block(2, 2, 2).unwrap().is_water());
        assert!(chunk.get_block(2, 31, 2).unwrap().is_water());
        assert!(!chunk.is_occupied(2, 32, 2));
    }

    #[test]
    fn ores_respect_height_ceilings_and_exclusivity() {
        let config = small_config();
        let coal_ceiling = config.coal_max_height;
        let iron_ceiling = config.iron_max_height;
        let generator = ChunkGenerator::new(Arc::new(config));

        for offset in ChunkCoord::new(0, 0).square(1) {
            let chunk = generator.generate(offset);
            let mut grass_per_column = std::collections::HashMap::new();
            for (position, block) in chunk.iter_blocks() {
                match block.block_type {
                    BlockType::Coal => assert!(position.y < coal_ceiling),
                    BlockType::Iron => assert!(position.y < iron_ceiling),
                    BlockType::Grass => {
                        *grass_per_column.entry((position.x, position.z)).or_insert(0) += 1;
                    }
                    _ => {}
                }
            }
            assert!(grass_per_column.values().all(|count| *count == 1));
        }
    }

    #[test]
    fn constant_ore_noise_fills_covered_stone_below_ceiling() {
        let config = WorldConfig {
            coal_range: crate::engine_state::config::NoiseRange::new(0.0, 0.0),
            iron_range: crate::engine_state::config::NoiseRange::new(0.0, 0.0),
            tree_probability: 0.0,
            ..small_config()
        };
        let generator = constant_generator(config, 0.0);
        let chunk = generator.generate(ChunkCoord::new(0, 0));

        assert_eq!(chunk.get_block(1, 10, 1).unwrap().block_type, BlockType::Iron);
        assert_eq!(chunk.get_block(1, 31, 1).unwrap().block_type, BlockType::Iron);
        assert_eq!(chunk.get_block(1, 32, 1).unwrap().block_type, BlockType::Grass);
    }

    #[test]
    fn trees_grow_on_grass_away_from_the_border() {
        let config = WorldConfig {
            tree_probability: 1.0,
            min_trunk_height: 2,
            max_trunk_height: 2,
            ..small_config()
        };
        let generator = constant_generator(config, 0.0);
        let chunk = generator.generate(ChunkCoord::new(0, 0));

        // Flat ground at y = 32, so the first tree roots at (1, 33, 1). Its
        // trunk top is later covered by the canopy of the neighboring tree.
        for y in 33..=34 {
            assert_eq!(chunk.get_block(1, y, 1).unwrap().block_type, BlockType::Wood);
        }
        assert_eq!(chunk.get_block(1, 37, 1).unwrap().block_type, BlockType::Leaves);
        assert!(!chunk
            .iter_blocks()
            .any(|(p, b)| b.block_type == BlockType::Wood && (p.x == 0 || p.z == 0)));
    }
}
