//! Ember Particles - Data-oriented particle simulation
//!
//! Particles and emitters are entities in one component registry. Each frame
//! runs a fixed pipeline:
//! - Destruction sweep of particles tagged last frame
//! - Spawn stage emitting batches from due emitters
//! - Group A (parallel): lifetimes, linear and angular kinematics
//! - Group B (parallel): over-lifetime interpolation per property
//!
//! Drawing is delegated to a host [`Canvas`].

pub mod components;
mod config;
mod context;
pub mod emitter;
pub mod keyframes;
pub mod present;
mod scene;
mod scheduler;
pub mod shape;
pub mod systems;
pub mod template;

use ember_core::Result;
use ember_runtime::{GameClock, RuntimeSystem};
use log::info;

pub use config::{InterpolationOrder, SimulationConfig};
pub use context::ParticleContext;
pub use emitter::{EmitterHandle, EmitterState};
pub use keyframes::{Blend, Keyframe, Keyframes, MAX_KEYFRAMES};
pub use present::{Canvas, DrawCommand, PointInstance, PresentStats};
pub use scene::{EmitterDescriptor, SceneDescriptor};
pub use scheduler::{FrameStats, FrameTotals, Scheduler};
pub use shape::EmissionShape;
pub use template::{ParticleTemplate, Property, PropertySource, TemplateSource};

/// The particle system, driven by the host loop through `RuntimeSystem`
pub struct ParticleSystem {
    context: ParticleContext,
}

impl ParticleSystem {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self::from_context(ParticleContext::new(config)?))
    }

    pub fn from_context(context: ParticleContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ParticleContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ParticleContext {
        &mut self.context
    }
}

impl RuntimeSystem for ParticleSystem {
    fn initialize(&mut self) -> Result<()> {
        let count = self.context.emitter_count();
        if count > 0 {
            info!("[particles] {count} emitter(s) ready");
        }
        Ok(())
    }

    fn update(&mut self, clock: &GameClock) -> Result<()> {
        let (now, dt) = clock.now_and_delta();
        self.context.advance(now, dt)?;
        self.context.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn shutdown(&mut self) -> Result<()> {
        self.context.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "particles"
    }
}
