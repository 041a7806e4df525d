//! # World Configuration
//!
//! Every tunable constant of the voxel world lives here: terrain shaping,
//! ore distribution, simulation timing, streaming radii and actor physics.
//!
//! Configurations are plain serde structs. Missing fields fall back to
//! their defaults, so a JSON file only has to name what it changes:
//!
//! ```json
//! { "seed": 42, "world_height": 64, "actor": { "walking_speed": 6.0 } }
//! ```
//!
//! Values are checked by [`WorldConfig::validate`] before an engine is built.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine_state::voxels::chunk::Chunk;

/// Errors raised while loading or validating a [`WorldConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid JSON for this schema.
    #[error("Invalid configuration format: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds a value the world cannot run with.
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable explanation.
        reason: String,
    },
}

/// An inclusive `[lo, hi]` interval of noise values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseRange {
    /// Lower bound (inclusive).
    pub lo: f64,
    /// Upper bound (inclusive).
    pub hi: f64,
}

impl NoiseRange {
    /// Creates a new range.
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Whether `sample` lies inside the range.
    pub fn contains(&self, sample: f64) -> bool {
        (self.lo..=self.hi).contains(&sample)
    }
}

/// Movement and collision parameters of the actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Horizontal speed in blocks per second.
    pub walking_speed: f32,
    /// Speed multiplier applied while running.
    pub running_multiplier: f32,
    /// Height a jump rises above its take-off point.
    pub jump_height: f32,
    /// Vertical speed while jumping, in blocks per second.
    pub jump_speed: f32,
    /// Downward speed while falling, in blocks per second.
    pub gravity: f32,
    /// Distance from the actor center to each of its four corners.
    pub corner_radius: f32,
    /// Extent of the box below the actor position.
    pub bounding_box_min_y: f32,
    /// Extent of the box above the actor position.
    pub bounding_box_max_y: f32,
    /// Longest distance covered by a single movement substep.
    pub substep_length: f32,
    /// Reach of the block picking ray.
    pub reach: f32,
    /// Distance between samples along the picking ray.
    pub ray_step: f32,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            walking_speed: 10.0,
            running_multiplier: 2.0,
            jump_height: 4.0,
            jump_speed: 10.0,
            gravity: 9.8,
            corner_radius: 0.3,
            bounding_box_min_y: 1.0,
            bounding_box_max_y: 0.8,
            substep_length: 0.1,
            reach: 5.0,
            ray_step: 0.5,
        }
    }
}

/// Configuration of a voxel world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed every noise field and tree roll is derived from.
    pub seed: u64,
    /// Horizontal size of a chunk in blocks.
    pub chunk_size: i32,
    /// Vertical size of the world in blocks.
    pub world_height: i32,
    /// Divisor applied to coordinates before sampling terrain noise.
    pub chunk_smoothness: f64,
    /// Cave noise at or above this value carves a cell.
    pub cave_threshold: f64,
    /// Caves are only carved strictly below this height, `None` carves the whole column.
    pub cave_min_height: Option<i32>,
    /// Empty cells below this height are flooded during generation.
    pub sea_level: i32,
    /// Cave-adjacent blocks turn to dirt when the dirt sample reaches this value.
    pub cave_dirt_threshold: f64,
    /// Coal noise interval.
    pub coal_range: NoiseRange,
    /// Iron noise interval.
    pub iron_range: NoiseRange,
    /// Coal is only placed strictly below this height.
    pub coal_max_height: i32,
    /// Iron is only placed strictly below this height.
    pub iron_max_height: i32,
    /// Horizontal divisor for ore noise coordinates.
    pub cave_content_smoothness: f64,
    /// Chance that an eligible grass cell grows a tree.
    pub tree_probability: f64,
    /// Shortest generated trunk.
    pub min_trunk_height: i32,
    /// Tallest generated trunk.
    pub max_trunk_height: i32,
    /// Seconds between two simulation ticks.
    pub tick_rate: f32,
    /// Speed of falling sand in blocks per second.
    pub falling_speed: f32,
    /// Chunks within this radius of the actor are streamed in.
    pub streaming_radius: i32,
    /// Chunks within this radius contribute to the populated blocks.
    pub view_distance: i32,
    /// Upper bound of loaded chunks, `None` keeps every chunk forever.
    pub max_loaded_chunks: Option<usize>,
    /// Number of background worker threads.
    pub worker_threads: usize,
    /// Actor parameters.
    pub actor: ActorConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_size: 16,
            world_height: 128,
            chunk_smoothness: 16.0,
            cave_threshold: 0.4,
            cave_min_height: None,
            sea_level: 32,
            cave_dirt_threshold: 0.25,
            coal_range: NoiseRange::new(0.35, 0.45),
            iron_range: NoiseRange::new(0.45, 0.55),
            coal_max_height: 50,
            iron_max_height: 40,
            cave_content_smoothness: 8.0,
            tree_probability: 0.01,
            min_trunk_height: 2,
            max_trunk_height: 4,
            tick_rate: 0.5,
            falling_speed: 4.0,
            streaming_radius: 2,
            view_distance: 1,
            max_loaded_chunks: Some(256),
            worker_threads: 4,
            actor: ActorConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from a JSON string and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Arguments
    /// * `path` - Location of the JSON file
    ///
    /// # Returns
    /// The validated configuration, or the first error encountered
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        log::info!("Loading world configuration from {}", path.as_ref().display());
        Self::from_json_str(&contents)
    }

    /// Number of cells in one chunk, `None` when the dimensions cannot be addressed.
    pub fn chunk_volume(&self) -> Option<usize> {
        Chunk::cell_count(self.chunk_size, self.world_height)
    }

    /// Height below which caves may be carved.
    pub fn cave_ceiling(&self) -> i32 {
        self.cave_min_height.unwrap_or(self.world_height)
    }

    /// Number of chunks inside the streaming square around the actor.
    pub fn streaming_area(&self) -> usize {
        let side = (2 * self.streaming_radius + 1) as usize;
        side * side
    }

    /// Checks that every field holds a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.chunk_size <= 0 {
            return Err(invalid("chunk_size", "must be positive"));
        }
        if self.world_height < 4 {
            return Err(invalid("world_height", "must be at least 4"));
        }
        if self.chunk_volume().is_none() {
            return Err(invalid(
                "chunk_size",
                format!(
                    "a {0}x{0}x{1} chunk has more cells than can be indexed",
                    self.chunk_size, self.world_height
                ),
            ));
        }
        if !(0..=self.world_height).contains(&self.sea_level) {
            return Err(invalid("sea_level", "must lie in [0, world_height]"));
        }
        if !(0..=self.world_height).contains(&self.cave_ceiling()) {
            return Err(invalid("cave_min_height", "must lie in [0, world_height]"));
        }
        if self.chunk_smoothness <= 0.0 || self.cave_content_smoothness <= 0.0 {
            return Err(invalid("chunk_smoothness", "smoothness divisors must be positive"));
        }
        for (field, range) in [("coal_range", self.coal_range), ("iron_range", self.iron_range)] {
            if range.lo > range.hi {
                return Err(invalid(field, format!("lo {} exceeds hi {}", range.lo, range.hi)));
            }
        }
        if !(0.0..=1.0).contains(&self.tree_probability) {
            return Err(invalid("tree_probability", "must lie in [0, 1]"));
        }
        if self.min_trunk_height < 1 || self.min_trunk_height > self.max_trunk_height {
            return Err(invalid("min_trunk_height", "trunk heights must satisfy 1 <= min <= max"));
        }
        if self.tick_rate <= 0.0 {
            return Err(invalid("tick_rate", "must be positive"));
        }
        if !(self.falling_speed > 0.0 && self.falling_speed.is_finite()) {
            return Err(invalid("falling_speed", "must be positive"));
        }
        if self.streaming_radius < 0 || self.view_distance < 0 {
            return Err(invalid("streaming_radius", "radii cannot be negative"));
        }
        if let Some(max) = self.max_loaded_chunks {
            if max < self.streaming_area() {
                return Err(invalid(
                    "max_loaded_chunks",
                    format!("must hold at least the {} streamed chunks", self.streaming_area()),
                ));
            }
        }
        if self.worker_threads == 0 {
            return Err(invalid("worker_threads", "at least one worker is required"));
        }
        if self.actor.substep_length <= 0.0 || self.actor.ray_step <= 0.0 {
            return Err(invalid("actor.substep_length", "step lengths must be positive"));
        }
        let speeds = [
            ("actor.walking_speed", self.actor.walking_speed),
            ("actor.jump_speed", self.actor.jump_speed),
            ("actor.gravity", self.actor.gravity),
        ];
        for (field, speed) in speeds {
            if !speed.is_finite() || speed < 0.0 {
                return Err(invalid(field, format!("{speed} is not a finite, non-negative speed")));
            }
        }
        Ok(())
    }
}
