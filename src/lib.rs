#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A chunked voxel world: deterministic terrain generation, streaming around a
//! moving actor, a falling-sand and flowing-water simulation, and discrete
//! collision for a first-person actor.
//!
//! ## Key Modules
//!
//! * `core` - Core utilities and data structures used throughout the crate
//! * `engine_state` - The world, the actor, the worker pool and the frame loop
//!
//! ## Architecture
//!
//! The crate follows a modular architecture with clear separation between:
//! * Terrain generation (noise fields and the multi-pass chunk generator)
//! * World storage, streaming and eviction
//! * The fixed-tick cellular simulation
//! * Actor movement and block interaction
//! * Task scheduling and execution
//!
//! ## Usage
//!
//! ```rust,no_run
//! fn main() {
//!     if let Err(err) = voxel_world::run(None) {
//!         eprintln!("{err}");
//!     }
//! }
//! ```
//!
//! ## Performance Considerations
//!
//! * Dense per-chunk storage for constant-time block lookups
//! * Chunk generation and render snapshots built on worker threads
//! * Simulation ticks run every loaded chunk in parallel
//! * Memory bounded by least-recently-used chunk eviction

use engine_state::{
    actor_state::ActorInput,
    config::{ConfigError, WorldConfig},
    EngineState,
};
use log::info;

pub mod core;
pub mod engine_state;

/// Frames run by the headless walk in [`run`].
const SCRIPTED_FRAMES: u32 = 600;

/// Fixed frame time of the headless walk.
const FRAME_TIME: web_time::Duration = web_time::Duration::from_micros(16_667);

/// Runs a headless session.
///
/// Loads the configuration from `config_path` (or uses the defaults), builds the
/// world and walks the actor through a scripted path: running forward while
/// turning, jumping every two seconds, and breaking then re-placing the block it
/// looks at. A summary is logged at the end.
///
/// # Arguments
/// * `config_path` - Optional path to a JSON configuration file
///
/// # Returns
/// An error if the configuration cannot be loaded or is invalid
pub fn run(config_path: Option<String>) -> Result<(), ConfigError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match config_path {
        Some(path) => WorldConfig::from_json_file(path)?,
        None => WorldConfig::default(),
    };

    let started = web_time::Instant::now();
    let mut engine = EngineState::new(config)?;
    info!(
        "World initialized in {:?} with {} chunks",
        started.elapsed(),
        engine.world.loaded_chunk_count()
    );

    let mut removed = 0;
    let mut placed = 0;
    let mut ticks = 0;
    let mut requested = 0;
    let loop_started = web_time::Instant::now();
    for frame in 0..SCRIPTED_FRAMES {
        let input = scripted_input(frame);
        let events = engine.update(&input, FRAME_TIME);
        removed += usize::from(events.removed.is_some());
        placed += usize::from(events.placed.is_some());
        ticks += usize::from(events.ticked);
        requested += events.chunks_requested;
    }
    engine.wait_for_tasks();

    let actor = engine.actor();
    let populated = engine.world.populated_blocks();
    info!(
        "Ran {} frames in {:?}: {} ticks, {} chunks requested, {} loaded",
        engine.frames(),
        loop_started.elapsed(),
        ticks,
        requested,
        engine.world.loaded_chunk_count()
    );
    info!(
        "Actor ended at ({:.2}, {:.2}, {:.2}); {} blocks removed, {} placed",
        actor.position.x, actor.position.y, actor.position.z, removed, placed
    );
    info!(
        "Populated blocks: {} opaque, {} translucent",
        populated.opaque.len(),
        populated.translucent.len()
    );
    Ok(())
}

fn scripted_input(frame: u32) -> ActorInput {
    let mut input = ActorInput {
        forward: 1.0,
        run: frame % 240 < 120,
        yaw_delta: 0.004,
        jump: frame % 120 == 60,
        ..ActorInput::default()
    };
    match frame % 200 {
        100 => input.pitch_delta = -0.6,
        101 => input.break_block = true,
        102 => {
            input.place_block = true;
            input.select_block = Some((frame / 200) as u8 % 8);
        }
        103 => input.pitch_delta = 0.6,
        _ => {}
    }
    input
}
