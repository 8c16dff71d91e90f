//! TOML scene descriptions
//!
//! ```toml
//! [simulation]
//! worker_threads = 4
//!
//! [[emitters]]
//! name = "sparks"
//! position = [400, 300]
//! spawn_count = 20
//! spawn_rate = 0.05
//!
//! [emitters.template]
//! lifetime = { range = [0.5, 1.0] }
//! draw = { kind = "batched_point" }
//! ```

use crate::config::SimulationConfig;
use crate::template::{ParticleTemplate, TemplateSource};
use ember_core::{EmberError, Result, Vec2};
use serde::Deserialize;
use std::path::Path;

/// A complete particle scene: simulation settings plus its emitters
#[derive(Debug, Clone, Default)]
pub struct SceneDescriptor {
    pub simulation: SimulationConfig,
    pub emitters: Vec<EmitterDescriptor>,
}

/// One emitter of a scene
#[derive(Debug, Clone)]
pub struct EmitterDescriptor {
    pub name: String,
    pub template: ParticleTemplate,
    pub position: Vec2,
    /// Degrees
    pub rotation: f32,
    pub spawn_count: u32,
    pub spawn_rate: f32,
    /// Start spawning as soon as the scene is built
    pub autostart: bool,
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SceneFile {
    simulation: SimulationConfig,
    emitters: Vec<EmitterEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EmitterEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    template: TemplateSource,
    #[serde(default)]
    position: Vec2,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "one")]
    spawn_count: u32,
    #[serde(default)]
    spawn_rate: f32,
    #[serde(default = "yes")]
    autostart: bool,
}

fn one() -> u32 {
    1
}

fn yes() -> bool {
    true
}

impl TryFrom<EmitterEntry> for EmitterDescriptor {
    type Error = EmberError;

    fn try_from(entry: EmitterEntry) -> Result<Self> {
        Ok(Self {
            name: entry.name,
            template: ParticleTemplate::try_from(entry.template)?,
            position: entry.position,
            rotation: entry.rotation,
            spawn_count: entry.spawn_count,
            spawn_rate: entry.spawn_rate,
            autostart: entry.autostart,
        })
    }
}

impl SceneDescriptor {
    /// Parse a scene and validate every template in it
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: SceneFile = toml::from_str(source)?;
        let emitters = file
            .emitters
            .into_iter()
            .map(EmitterDescriptor::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            simulation: file.simulation,
            emitters,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
