//! # Noise Fields
//!
//! Seeded coherent noise used by the chunk generator. Terrain height, caves and
//! the two ore distributions each read from their own independently seeded
//! field so that ore veins do not line up with cave shapes.
//!
//! Generation only depends on the [`NoiseSampler`] trait, which lets tests
//! replace the Perlin fields with constant ones and reason about exact output.

use std::sync::Arc;

use noise::{NoiseFn, Perlin};

/// A coherent noise function sampled in two and three dimensions.
///
/// Implementations must be deterministic and return values in `[-1, 1]`.
pub trait NoiseSampler: Send + Sync {
    /// Samples the field on the horizontal plane.
    fn get2d(&self, x: f64, y: f64) -> f64;
    /// Samples the field in space.
    fn get3d(&self, x: f64, y: f64, z: f64) -> f64;
}

/// Perlin noise with a fixed seed.
#[derive(Clone)]
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    /// Creates a field from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl NoiseSampler for NoiseField {
    fn get2d(&self, x: f64, y: f64) -> f64 {
        self.perlin.get([x, y]).clamp(-1.0, 1.0)
    }

    fn get3d(&self, x: f64, y: f64, z: f64) -> f64 {
        self.perlin.get([x, y, z]).clamp(-1.0, 1.0)
    }
}

/// A field returning the same value everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantNoise(pub f64);

impl NoiseSampler for ConstantNoise {
    fn get2d(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }

    fn get3d(&self, _x: f64, _y: f64, _z: f64) -> f64 {
        self.0
    }
}

/// The three fields a chunk generator samples.
#[derive(Clone)]
pub struct NoiseFields {
    /// Height map, caves and cave dirt.
    pub terrain: Arc<dyn NoiseSampler>,
    /// Coal veins.
    pub coal: Arc<dyn NoiseSampler>,
    /// Iron veins.
    pub iron: Arc<dyn NoiseSampler>,
}

impl NoiseFields {
    /// Derives three independent Perlin fields from one world seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        Self {
            terrain: Arc::new(NoiseField::new(rng.u32(..))),
            coal: Arc::new(NoiseField::new(rng.u32(..))),
            iron: Arc::new(NoiseField::new(rng.u32(..))),
        }
    }

    /// Uses the same sampler for every field.
    pub fn uniform(sampler: Arc<dyn NoiseSampler>) -> Self {
        Self {
            terrain: sampler.clone(),
            coal: sampler.clone(),
            iron: sampler,
        }
    }
}
