//! Uniform random source used by emitters and emission shapes

use crate::types::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform floats in `[0, 1)` plus the range helpers built on it.
///
/// Implemented for every [`rand::Rng`], so hosts can inject any generator.
pub trait RandomSource {
    /// Returns a float in [0, 1)
    fn next_f32(&mut self) -> f32;

    /// Returns a float in [min, max). `min == max` is allowed and returns `min`.
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns a float in [-spread, spread)
    fn spread(&mut self, spread: f32) -> f32 {
        self.range(-spread, spread)
    }

    /// Returns a vector with each component in its own [min, max) range
    fn vec2_in(&mut self, x: (f32, f32), y: (f32, f32)) -> Vec2 {
        Vec2::new(self.range(x.0, x.1), self.range(y.0, y.1))
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_f32(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

/// Deterministic generator for a given seed
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generator seeded from the operating system
pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}
