//! Fork-join frame pipeline
//!
//! ```text
//! destroy sweep -> spawn -> [group A] -> tag expired -> [group B]
//! ```
//!
//! The sweep, spawn and tagging steps are sequential and own the registry
//! mutably. Each group is one `rayon` scope: its units run on the pool and
//! the scope returning is the barrier before the next step.

use crate::components::{AngularVelocity, DestroyTag, Rotation, Size, Tint, Velocity};
use crate::config::{InterpolationOrder, SimulationConfig};
use crate::emitter::spawn_due;
use crate::systems;
use ember_core::{EmberError, RandomSource, Result};
use ember_ecs::Registry;
use log::{debug, info, trace};
use std::time::Instant;

/// What one frame did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Particles created by the spawn stage
    pub spawned: usize,
    /// Entities removed by the destruction sweep
    pub destroyed: usize,
    /// Particles tagged for removal at the next sweep
    pub expired: usize,
    /// Live entities at the end of the frame, emitters included
    pub alive: usize,
}

/// Running totals over every frame of a context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTotals {
    pub frames: u64,
    pub spawned: u64,
    pub destroyed: u64,
}

impl FrameTotals {
    pub fn record(&mut self, frame: &FrameStats) {
        self.frames += 1;
        self.spawned += frame.spawned as u64;
        self.destroyed += frame.destroyed as u64;
    }
}

/// Runs the per-frame pipeline on its own worker pool
pub struct Scheduler {
    pool: rayon::ThreadPool,
    order: InterpolationOrder,
}

impl Scheduler {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("ember-worker-{i}"));
        if config.worker_threads > 0 {
            builder = builder.num_threads(config.worker_threads);
        }
        let pool = builder
            .build()
            .map_err(|e| EmberError::SchedulerError(e.to_string()))?;

        info!(
            "particle scheduler: {} worker thread(s), {:?}",
            pool.current_num_threads(),
            config.interpolation_order
        );
        Ok(Self {
            pool,
            order: config.interpolation_order,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn interpolation_order(&self) -> InterpolationOrder {
        self.order
    }

    /// Run every stage once for simulation time `now`
    pub fn run_frame(
        &self,
        registry: &mut Registry,
        rng: &mut dyn RandomSource,
        now: f32,
        dt: f32,
    ) -> Result<FrameStats> {
        let mut stats = FrameStats::default();

        let started = Instant::now();
        stats.destroyed = systems::destroy_marked(registry);
        if stats.destroyed > 0 {
            debug!("destroyed {} entities", stats.destroyed);
        }
        let swept = Instant::now();

        stats.spawned = spawn_due(registry, rng, now)?;
        let spawned = Instant::now();

        let expired = self.run_group_a(registry, now, dt);
        let group_a = Instant::now();

        stats.expired = expired.len();
        for entity in expired {
            registry.emplace(entity, DestroyTag)?;
        }

        self.run_group_b(registry);
        let group_b = Instant::now();

        stats.alive = registry.len();
        trace!(
            "frame t={now:.3}: sweep {:?}, spawn {:?}, group A {:?}, group B {:?}",
            swept - started,
            spawned - swept,
            group_a - spawned,
            group_b - group_a
        );
        Ok(stats)
    }

    /// Lifetimes and kinematics. The five units mutate disjoint columns:
    /// `Lifetime`; `Position`+`Velocity` with `Acceleration`; `Position`
    /// without `Acceleration`; and the two angular counterparts on `Rotation`.
    fn run_group_a(&self, registry: &Registry, now: f32, dt: f32) -> Vec<ember_ecs::Entity> {
        let mut expired = Vec::new();
        self.pool.scope(|s| {
            s.spawn(|_| expired = systems::update_lifetimes(registry, now));
            s.spawn(|_| systems::integrate_kinematics(registry, dt));
            s.spawn(|_| systems::integrate_positions(registry, dt));
            s.spawn(|_| systems::integrate_angular_kinematics(registry, dt));
            s.spawn(|_| systems::integrate_rotations(registry, dt));
        });
        expired
    }

    /// Over-lifetime interpolation, one task per property. Each task runs
    /// its resample and apply steps back to back in the configured order.
    fn run_group_b(&self, registry: &Registry) {
        let order = self.order;
        self.pool.scope(|s| {
            s.spawn(|_| systems::animate::<Velocity>(registry, order));
            s.spawn(|_| systems::animate::<Size>(registry, order));
            s.spawn(|_| systems::animate::<Tint>(registry, order));
            s.spawn(|_| systems::animate::<Rotation>(registry, order));
            s.spawn(|_| systems::animate::<AngularVelocity>(registry, order));
        });
    }
}
