//! Simulation configuration

use ember_core::Result;
use serde::Deserialize;

/// Order of the two steps that drive a live component from its
/// over-lifetime table within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationOrder {
    /// Sample at this frame's age, then write the sample into the live
    /// component. Live values always match the current age.
    #[default]
    RecomputeThenApply,
    /// Write last frame's sample, then resample. Live values trail the
    /// current age by exactly one frame.
    ApplyThenRecompute,
}

/// Settings for a [`crate::ParticleContext`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Worker threads for the concurrent stages; 0 lets rayon decide
    pub worker_threads: usize,
    pub interpolation_order: InterpolationOrder,
    /// Fixed seed for the emission random source; entropy when unset
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
