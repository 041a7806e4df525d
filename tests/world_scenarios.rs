use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use cgmath::{Point3, Rad};
use voxel_world::engine_state::{
    actor_state::{actor::Actor, collision::CollisionResolver, ActorInput},
    config::{ActorConfig, WorldConfig},
    voxels::{
        block::{block_side::BlockSide, block_type::BlockType, Block},
        chunk::{chunk_creation::ChunkGenerator, Chunk, ChunkCoord},
        noise_field::{ConstantNoise, NoiseFields},
        simulation::SimulationTicker,
        world::World,
    },
    EngineState,
};
use web_time::Duration;

fn flat_generator(config: WorldConfig) -> ChunkGenerator {
    let noise = NoiseFields::uniform(Arc::new(ConstantNoise(0.0)));
    ChunkGenerator::with_noise(Arc::new(config), noise)
}

fn small_config() -> WorldConfig {
    WorldConfig {
        chunk_size: 8,
        world_height: 32,
        sea_level: 0,
        tree_probability: 0.0,
        streaming_radius: 1,
        view_distance: 1,
        max_loaded_chunks: None,
        worker_threads: 2,
        ..WorldConfig::default()
    }
}

#[test]
fn flat_chunk_exposes_only_its_surfaces() {
    let config = WorldConfig {
        chunk_size: 16,
        world_height: 64,
        tree_probability: 0.0,
        ..WorldConfig::default()
    };
    let chunk = flat_generator(config).generate(ChunkCoord::new(0, 0));

    assert_eq!(chunk.get_block(5, 32, 5).map(|b| b.block_type), Some(BlockType::Grass));
    assert!(chunk.get_block(5, 33, 5).is_none());

    // Top layer, the four outer walls below it, and the interior of the bottom layer.
    let expected = 16 * 16 + 60 * 32 + 14 * 14;
    assert_eq!(chunk.blocks_to_render().count(), expected);

    let grass = chunk.get_block(5, 32, 5).unwrap();
    assert!(!grass.neighbors.is_occluded(BlockSide::Top));
    assert_eq!(grass.neighbors.occluded_count(), 5);

    let wall = chunk.get_block(0, 10, 5).unwrap();
    assert!(!wall.neighbors.is_occluded(BlockSide::Left));
    assert_eq!(wall.neighbors.occluded_count(), 5);

    assert!(chunk.get_block(5, 10, 5).unwrap().neighbors.is_fully_occluded());

    for (position, block) in chunk.iter_blocks() {
        for side in BlockSide::all() {
            let (dx, dy, dz) = side.offset();
            let buried = chunk.is_occupied(position.x + dx, position.y + dy, position.z + dz);
            assert_eq!(
                block.neighbors.is_occluded(side),
                buried,
                "face {side:?} of {position:?}"
            );
        }
    }
}

#[test]
fn water_source_fills_an_open_pit_down_to_the_floor_row() {
    let config = WorldConfig {
        chunk_size: 16,
        world_height: 16,
        ..WorldConfig::default()
    };
    let ticker = SimulationTicker::new(&config);
    let mut chunk = Chunk::empty(ChunkCoord::new(0, 0), 0, 16, 16);
    for y in 0..=6 {
        for (x, z) in [(3, 4), (5, 4), (4, 3), (4, 5)] {
            chunk.put_block_type(x, y, z, BlockType::Stone);
        }
    }
    chunk.put_block(4, 6, 4, Block::water(chunk.world_position(4, 6, 4), 8));
    chunk.mark_water_for_spread();

    for _ in 0..10 {
        ticker.update_chunk(&mut chunk, 0.5);
    }

    for y in 1..=6 {
        let water = chunk.get_block(4, y, 4).expect("column filled");
        assert!(water.is_water());
        assert_eq!(water.water_force(), 8);
    }
    assert!(chunk.get_block(4, 0, 4).is_none());
    let water_blocks = chunk.iter_blocks().filter(|(_, block)| block.is_water()).count();
    assert_eq!(water_blocks, 6);
}

#[test]
fn fast_actor_stops_at_an_isolated_block() {
    let mut world = World::with_generator(flat_generator(small_config()));
    world.load_area_blocking(ChunkCoord::new(0, 0));
    assert!(world.add_block_at(Point3::new(3, 18, 0), BlockType::Stone));

    let resolver = CollisionResolver::new(ActorConfig::default());
    let mut actor = Actor::new(Point3::new(0.0, 17.6, 0.0));
    actor.yaw = Rad(FRAC_PI_2);

    resolver.move_actor(&mut actor, 1.0, 0.0, true, 1.0, &world);

    assert!(actor.position.x > 2.0, "stopped early at {:?}", actor.position);
    assert!(actor.position.x < 2.5 - 0.2, "tunnelled to {:?}", actor.position);
    assert!(actor.grounded);
}

#[test]
fn generation_is_deterministic_per_seed() {
    let config = Arc::new(WorldConfig {
        seed: 42,
        world_height: 64,
        sea_level: 20,
        ..WorldConfig::default()
    });
    let first = ChunkGenerator::new(config.clone());
    let second = ChunkGenerator::new(config);

    for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 2)] {
        let a = first.generate(coord);
        let b = second.generate(coord);
        assert!(a.same_contents(&b), "chunk {coord:?} differs");
    }

    let other = ChunkGenerator::new(Arc::new(WorldConfig {
        seed: 43,
        world_height: 64,
        sea_level: 20,
        ..WorldConfig::default()
    }));
    assert!(!first
        .generate(ChunkCoord::new(0, 0))
        .same_contents(&other.generate(ChunkCoord::new(0, 0))));
}

#[test]
fn falling_sand_lands_on_the_terrain() {
    let mut world = World::with_generator(flat_generator(small_config()));
    world.load_area_blocking(ChunkCoord::new(0, 0));
    assert!(world.add_block_at(Point3::new(2, 20, 2), BlockType::Sand));

    for _ in 0..4 {
        assert!(world.advance_simulation(0.5));
    }

    assert!(world.get_block_at(2, 20, 2).is_none());
    let landed = world.get_block_at(2, 17, 2).expect("sand rests on the grass");
    assert_eq!(landed.block_type, BlockType::Sand);
    assert!(!landed.is_falling);
}

#[test]
fn entering_a_chunk_streams_its_neighborhood_on_workers() {
    let world = World::with_generator(flat_generator(small_config()));
    let mut engine = EngineState::with_world(world);
    assert_eq!(engine.world.loaded_chunk_count(), 9);

    engine.actor_state.actor.position = Point3::new(9.0, 17.5, 0.0);
    let events = engine.update(&ActorInput::default(), Duration::from_millis(16));
    assert_eq!(events.chunks_requested, 3);

    engine.wait_for_tasks();
    assert_eq!(engine.world.loaded_chunk_count(), 12);
    for z in -1..=1 {
        assert!(engine.world.is_loaded(ChunkCoord::new(2, z)));
    }
    assert_eq!(
        engine.world.get_block_at(20, 16, 3).map(|block| block.block_type),
        Some(BlockType::Grass)
    );
}
