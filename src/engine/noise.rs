// Seeded 2D Perlin noise with fractal (fBm) summation.
//
// `noise::Perlin` is deterministic per seed, so `noise2d` and
// `fractal_noise2d` are pure functions of (seed, x, y).

use noise::{NoiseFn, Perlin};

/// Frequency of the first octave; each further octave doubles it.
pub const DEFAULT_BASE_FREQUENCY: f32 = 0.01;

#[derive(Clone)]
pub struct NoiseField {
    seed: u64,
    base_frequency: f32,
    perlin: Perlin,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        Self::with_base_frequency(seed, DEFAULT_BASE_FREQUENCY)
    }

    pub fn with_base_frequency(seed: u64, base_frequency: f32) -> Self {
        Self { seed, base_frequency, perlin: Perlin::new(fold_seed(seed)) }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Single-octave gradient noise, roughly in [-1, 1].
    pub fn noise2d(&self, x: f32, y: f32) -> f32 {
        self.perlin.get([x as f64, y as f64]) as f32
    }

    /// Sum of `octaves` noise layers, amplitude halving and frequency
    /// doubling from `base_frequency`.
    pub fn fractal_noise2d(&self, x: f32, y: f32, octaves: u32) -> f32 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.base_frequency;
        for _ in 0..octaves {
            value += self.noise2d(x * frequency, y * frequency) * amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        value
    }
}

// Perlin takes a u32 seed; fold the high half in so 64-bit seeds that differ
// only above bit 32 still give different fields.
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}
