//! Emitter state and the spawn stage

use crate::components::{
    Acceleration, AngularAcceleration, AngularVelocity, AngularVelocityOverLifetime,
    ColorOverLifetime, Lifetime, Position, Rotation, RotationOverLifetime, Size, SizeOverLifetime,
    Tint, Velocity, VelocityOverLifetime,
};
use crate::template::ParticleTemplate;
use ember_core::{RandomSource, Result, Vec2};
use ember_ecs::{Entity, EntityBuilder, Registry};
use log::debug;
use std::sync::Arc;

/// Runtime state attached to emitter entities.
///
/// An emitter is idle until started. While spawning it emits a batch of
/// `spawn_count` particles whenever more than `spawn_rate` seconds have
/// passed since its previous batch; a rate of zero emits every frame.
#[derive(Debug, Clone)]
pub struct EmitterState {
    pub spawning: bool,
    /// Time of the previous batch, `None` until the first one
    pub last_spawn_time: Option<f32>,
    pub template: Arc<ParticleTemplate>,
    /// Particles per batch
    pub spawn_count: u32,
    /// Seconds between batches
    pub spawn_rate: f32,
}

impl EmitterState {
    pub fn new(template: Arc<ParticleTemplate>, spawn_count: u32, spawn_rate: f32) -> Self {
        Self {
            spawning: false,
            last_spawn_time: None,
            template,
            spawn_count,
            spawn_rate,
        }
    }

    pub fn start(&mut self) {
        self.spawning = true;
    }

    pub fn stop(&mut self) {
        self.spawning = false;
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Whether a batch should be emitted at `now`
    pub fn is_due(&self, now: f32) -> bool {
        self.spawning
            && match self.last_spawn_time {
                None => true,
                Some(last) => now - last > self.spawn_rate,
            }
    }
}

/// Refers to an emitter entity owned by a [`crate::ParticleContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterHandle(pub(crate) Entity);

impl EmitterHandle {
    pub fn entity(&self) -> Entity {
        self.0
    }
}

/// One due emitter's batch, captured before any entity is created
struct Batch {
    template: Arc<ParticleTemplate>,
    count: u32,
    origin: Vec2,
    rotation: f32,
}

/// Emit one batch from every due emitter; returns the number of particles
/// created.
///
/// Fails with `InvalidTemplate` if a due emitter's template has no lifetime.
pub fn spawn_due(registry: &mut Registry, rng: &mut dyn RandomSource, now: f32) -> Result<usize> {
    let batches: Vec<Batch> = registry
        .view_mut::<(&mut EmitterState, &Position, Option<&Rotation>)>()
        .into_iter()
        .filter_map(|(_, (state, position, rotation))| {
            if !state.is_due(now) {
                return None;
            }
            state.last_spawn_time = Some(now);
            Some(Batch {
                template: Arc::clone(&state.template),
                count: state.spawn_count,
                origin: position.0,
                rotation: rotation.map_or(0.0, |r| r.0),
            })
        })
        .collect();

    let mut builder = EntityBuilder::new();
    let mut spawned = 0;
    for batch in &batches {
        spawned += spawn_batch(registry, &mut builder, batch, rng, now)?;
    }
    if spawned > 0 {
        debug!(
            "spawned {spawned} particles from {} emitter(s) at t={now:.3}",
            batches.len()
        );
    }
    Ok(spawned)
}

/// Create `batch.count` fully-formed particles. Each entity is assembled in
/// the builder and inserted in one step, so no stage ever observes a
/// half-built particle.
fn spawn_batch(
    registry: &mut Registry,
    builder: &mut EntityBuilder,
    batch: &Batch,
    rng: &mut dyn RandomSource,
    now: f32,
) -> Result<usize> {
    let template = &*batch.template;
    let needs_velocity = template.velocity.is_present()
        || template.shape.emits_velocity()
        || template.velocity_over_lifetime.is_some();

    for _ in 0..batch.count {
        let seed = rng.next_f32();
        let sample = template.sample(seed)?;
        let (local_pos, local_vel) = template.shape.sample(rng);

        builder.add(Lifetime::new(sample.lifetime, now));
        builder.add(Position(batch.origin + local_pos.rotated_deg(batch.rotation)));

        if needs_velocity {
            let velocity = sample.velocity.unwrap_or(Vec2::ZERO) + local_vel;
            builder.add(Velocity(velocity.rotated_deg(batch.rotation)));
        }
        if let Some(table) = template.velocity_over_lifetime {
            builder.add(VelocityOverLifetime::new(table));
        }
        if let Some(acceleration) = sample.acceleration {
            builder.add(Acceleration(acceleration));
        }

        if let Some(rotation) = sample.rotation {
            builder.add(Rotation(rotation));
        }
        if let Some(table) = template.rotation_over_lifetime {
            builder.add(RotationOverLifetime::new(table));
        }
        if let Some(angular_velocity) = sample.angular_velocity {
            builder.add(AngularVelocity(angular_velocity));
        }
        if let Some(table) = template.angular_velocity_over_lifetime {
            builder.add(AngularVelocityOverLifetime::new(table));
        }
        if let Some(angular_acceleration) = sample.angular_acceleration {
            builder.add(AngularAcceleration(angular_acceleration));
        }

        if let Some(size) = sample.size {
            builder.add(Size(size));
        }
        if let Some(table) = template.size_over_lifetime {
            builder.add(SizeOverLifetime::new(table));
        }
        if let Some(color) = sample.color {
            builder.add(Tint(color));
        }
        if let Some(table) = template.color_over_lifetime {
            builder.add(ColorOverLifetime::new(table));
        }

        builder.add(template.draw);
        registry.spawn(builder);
    }
    Ok(batch.count as usize)
}
