//! # Engine State Module
//!
//! The core engine module that owns the voxel world and drives it frame by frame.
//!
//! ## Key Components
//!
//! * `EngineState` - The per-frame orchestrator
//! * `config` - Every tunable constant of the world and the actor
//! * `actor_state` - The first-person actor and its collision resolution
//! * `task_management` - Manages asynchronous tasks and worker threads
//! * `voxels` - Handles voxel data, chunks, world generation and simulation
//!
//! ## Architecture
//!
//! The engine state module follows a component-based architecture where each subsystem
//! is responsible for a specific aspect of the engine's functionality. The `EngineState`
//! struct serves as the central coordinator. It is the only writer of the world: worker
//! threads produce chunks and snapshots, and their results are applied here.
//!
//! ## Frame Order
//!
//! 1. Apply completed task results
//! 2. Swap in future chunks and the next populated-blocks snapshot
//! 3. Move the actor
//! 4. Break or place the targeted block
//! 5. Publish generation tasks when the actor entered another chunk
//! 6. Advance the sand and water simulation
//! 7. Publish a snapshot build if one was requested
//! 8. Feed queued tasks to idle workers

use std::sync::Arc;

use actor_state::{actor::Actor, ActorInput, ActorState};
use cgmath::Point3;
use config::{ConfigError, WorldConfig};
use log::{debug, info};
use task_management::TaskManager;
use voxels::{
    block::Block,
    chunk::ChunkCoord,
    tasks::chunk_generation_task::ChunkGenerationTask,
    world::{BlockHit, World},
};

pub mod actor_state;
pub mod config;
pub mod task_management;
pub mod voxels;

/// What happened during one call to [`EngineState::update`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameEvents {
    /// Chunks swapped into the loaded set
    pub chunks_swapped: usize,
    /// Whether a new populated-blocks snapshot was installed
    pub snapshot_swapped: bool,
    /// Block removed by the actor
    pub removed: Option<Block>,
    /// Cell the actor placed a block into
    pub placed: Option<Point3<i32>>,
    /// Generation tasks published because the actor changed chunks
    pub chunks_requested: usize,
    /// Whether a simulation tick ran
    pub ticked: bool,
}

/// The main state container for the voxel engine
///
/// # Examples
///
/// ```rust,no_run
/// use voxel_world::engine_state::{actor_state::ActorInput, config::WorldConfig, EngineState};
///
/// let mut engine = EngineState::new(WorldConfig::default()).unwrap();
/// let walk = ActorInput { forward: 1.0, ..ActorInput::default() };
///
/// // Main loop
/// loop {
///     engine.update(&walk, web_time::Duration::from_millis(16));
/// }
/// ```
pub struct EngineState {
    /// The voxel world containing all loaded chunk data
    pub world: World,
    /// The actor and its collision resolver
    pub actor_state: ActorState,
    /// Task manager for asynchronous operations
    pub task_manager: TaskManager,
    /// The block the actor currently looks at
    target: Option<BlockHit>,
    /// Identifier of the chunk the actor was in last frame
    current_chunk_id: Option<u64>,
    frames: u64,
}

impl EngineState {
    /// Validates the configuration, generates the initial area and spawns the actor.
    ///
    /// # Arguments
    /// * `config` - The world configuration
    ///
    /// # Returns
    /// The engine, or the validation error
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_world(World::new(Arc::new(config))))
    }

    /// Builds an engine around an existing, possibly empty world.
    ///
    /// The streaming square around the origin is generated on the calling thread and
    /// the actor is placed on top of the highest block of column `(0, 0)`.
    pub fn with_world(mut world: World) -> Self {
        let origin = ChunkCoord::new(0, 0);
        world.load_area_blocking(origin);

        let actor_config = world.config().actor.clone();
        let spawn_y = match world.find_highest_block(0, 0) {
            Some(block) => block.position.y + 0.5 + actor_config.bounding_box_min_y,
            None => world.config().world_height as f32,
        };
        let spawn = Point3::new(0.0, spawn_y, 0.0);
        info!("Spawning actor at ({}, {}, {})", spawn.x, spawn.y, spawn.z);

        let actor_state = ActorState::new(spawn, actor_config);
        world.set_viewer(actor_state.actor.eye());

        let current_chunk_id = world.chunk_containing(spawn).map(|chunk| chunk.id);
        let task_manager = TaskManager::new(world.config().worker_threads);

        Self {
            world,
            actor_state,
            task_manager,
            target: None,
            current_chunk_id,
            frames: 0,
        }
    }

    /// The actor.
    pub fn actor(&self) -> &Actor {
        &self.actor_state.actor
    }

    /// The block the actor looked at after the last frame.
    pub fn target(&self) -> Option<BlockHit> {
        self.target
    }

    /// Number of frames processed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame.
    ///
    /// # Arguments
    /// * `input` - Actor input for this frame
    /// * `dt` - Time elapsed since the last frame
    ///
    /// # Returns
    /// The events that happened during the frame
    pub fn update(&mut self, input: &ActorInput, dt: web_time::Duration) -> FrameEvents {
        let dt = dt.as_secs_f32();
        let mut events = FrameEvents::default();
        self.frames += 1;

        self.task_manager.process_completed_tasks(&mut self.world);
        events.chunks_swapped = self.world.swap_in_future_chunks();
        events.snapshot_swapped = self.world.swap_populated_blocks();

        self.actor_state.intake_input(input);
        if self.world.chunk_containing(self.actor_state.actor.position).is_some() {
            self.actor_state.update(input, dt, &self.world);
        }

        self.handle_interaction(input, &mut events);

        let position = self.actor_state.actor.position;
        let coord = ChunkCoord::containing_point(position, self.world.config().chunk_size);
        let chunk_id = self.world.chunk_at(coord).map(|chunk| chunk.id);
        if chunk_id != self.current_chunk_id {
            debug!("Actor entered chunk ({}, {})", coord.x, coord.z);
            self.current_chunk_id = chunk_id;
            events.chunks_requested = self.request_chunks(coord);
        }

        events.ticked = self.world.advance_simulation(dt);

        self.world.set_viewer(self.actor_state.actor.eye());
        if let Some(task) = self.world.take_populated_build() {
            self.task_manager.publish_task(Box::new(task));
        }

        self.task_manager.process_queued_tasks();
        events
    }

    /// Blocks until every outstanding task finished, then swaps their results in.
    pub fn wait_for_tasks(&mut self) {
        self.task_manager.wait_until_idle(&mut self.world);
        self.world.swap_in_future_chunks();
        self.world.swap_populated_blocks();
    }

    fn request_chunks(&mut self, center: ChunkCoord) -> usize {
        let requested = self.world.begin_streaming(center);
        for coord in &requested {
            let task = ChunkGenerationTask::new(
                self.world.generator().clone(),
                self.world.streaming_handle(),
                *coord,
            );
            self.task_manager.publish_task(Box::new(task));
        }
        requested.len()
    }

    fn handle_interaction(&mut self, input: &ActorInput, events: &mut FrameEvents) {
        let actor = &self.actor_state.actor;
        let config = &self.world.config().actor;
        self.target = self
            .world
            .pick_block(actor.eye(), actor.view_direction(), config.reach, config.ray_step);

        let Some(hit) = self.target else {
            return;
        };

        if input.break_block {
            events.removed = self.world.remove_block_from(hit.cell);
        } else if input.place_block {
            let Some(cell) = self.world.find_placement_position(hit.cell, hit.ray_point) else {
                debug!("No free face next to ({}, {}, {})", hit.cell.x, hit.cell.y, hit.cell.z);
                return;
            };
            if self.actor_state.overlaps_cell(cell) {
                debug!("Placement at ({}, {}, {}) blocked by the actor", cell.x, cell.y, cell.z);
                return;
            }
            let block_type = self.actor_state.actor.selected_block;
            if self.world.add_block_at(cell, block_type) {
                events.placed = Some(cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        block::block_type::BlockType,
        chunk::chunk_creation::ChunkGenerator,
        noise_field::{ConstantNoise, NoiseFields},
    };
    use web_time::Duration;

    fn flat_engine() -> EngineState {
        let config = WorldConfig {
            chunk_size: 8,
            world_height: 32,
            sea_level: 0,
            tree_probability: 0.0,
            streaming_radius: 1,
            view_distance: 1,
            max_loaded_chunks: None,
            worker_threads: 2,
            ..WorldConfig::default()
        };
        let noise = NoiseFields::uniform(Arc::new(ConstantNoise(0.0)));
        let generator = ChunkGenerator::with_noise(Arc::new(config), noise);
        EngineState::with_world(World::with_generator(generator))
    }

    const FRAME: Duration = Duration::from_millis(50);

    #[test]
    fn actor_spawns_on_the_ground_and_stays_there() {
        let mut engine = flat_engine();
        assert_eq!(engine.actor().position.y, 17.5);

        for _ in 0..5 {
            engine.update(&ActorInput::default(), FRAME);
        }
        assert!(engine.actor().grounded);
        assert!((engine.actor().position.y - 17.5).abs() < 0.1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = WorldConfig {
            chunk_size: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(EngineState::new(config), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn placing_and_breaking_edit_the_targeted_cells() {
        let mut engine = flat_engine();
        engine.update(&ActorInput::default(), FRAME);

        let look_down = ActorInput {
            pitch_delta: -1.2,
            ..ActorInput::default()
        };
        engine.update(&look_down, FRAME);
        let hit = engine.target().expect("the ground is within reach");
        assert_eq!(hit.cell, Point3::new(0, 16, 1));

        let events = engine.update(
            &ActorInput {
                place_block: true,
                select_block: Some(BlockType::Glass as u8),
                ..ActorInput::default()
            },
            FRAME,
        );
        assert_eq!(events.placed, Some(Point3::new(0, 17, 1)));
        assert_eq!(
            engine.world.get_block_at(0, 17, 1).map(|block| block.block_type),
            Some(BlockType::Glass)
        );

        let events = engine.update(
            &ActorInput {
                break_block: true,
                ..ActorInput::default()
            },
            FRAME,
        );
        let removed = events.removed.expect("glass is breakable");
        assert_eq!(removed.block_type, BlockType::Glass);
        assert!(engine.world.get_block_at(0, 17, 1).is_none());
    }

    #[test]
    fn snapshot_builds_run_on_workers() {
        let mut engine = flat_engine();
        engine.world.request_populated_refresh();
        engine.update(&ActorInput::default(), FRAME);
        engine.wait_for_tasks();

        assert!(!engine.world.populated_refresh_requested());
        let expected = engine.world.collect_visible_blocks(ChunkCoord::new(0, 0)).len();
        assert_eq!(engine.world.populated_blocks().len(), expected);
    }
}
