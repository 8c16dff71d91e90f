//! The simulation context: one registry, one scheduler, explicit ownership

use crate::components::{
    Acceleration, AngularAcceleration, AngularVelocity, AngularVelocityOverLifetime,
    ColorOverLifetime, DestroyTag, DrawTag, Lifetime, Position, Rotation, RotationOverLifetime,
    Size, SizeOverLifetime, Tint, Velocity, VelocityOverLifetime,
};
use crate::config::SimulationConfig;
use crate::emitter::{EmitterHandle, EmitterState};
use crate::present::{Canvas, PresentStats, Presenter};
use crate::scene::SceneDescriptor;
use crate::scheduler::{FrameStats, FrameTotals, Scheduler};
use crate::template::ParticleTemplate;
use ember_core::{random, EmberError, RandomSource, Result, Vec2};
use ember_ecs::{EntityBuilder, Registry, RegistryStats};
use log::info;
use std::sync::Arc;

/// Owns everything a particle scene needs. Created at scene start and
/// dropped at scene end; stages and collaborators receive it (or parts of
/// it) by reference.
pub struct ParticleContext {
    registry: Registry,
    scheduler: Scheduler,
    rng: Box<dyn RandomSource + Send>,
    presenter: Presenter,
    canvas: Option<Box<dyn Canvas + Send>>,
    viewport: Option<(u32, u32)>,
    totals: FrameTotals,
    last_frame: FrameStats,
}

impl ParticleContext {
    /// Context with a random source seeded from `config.seed`, or from the
    /// operating system when unset
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let rng: Box<dyn RandomSource + Send> = match config.seed {
            Some(seed) => Box::new(random::seeded(seed)),
            None => Box::new(random::from_entropy()),
        };
        Self::with_boxed_rng(config, rng)
    }

    /// Context drawing emission randomness from `rng`
    pub fn with_rng(config: SimulationConfig, rng: impl RandomSource + Send + 'static) -> Result<Self> {
        Self::with_boxed_rng(config, Box::new(rng))
    }

    fn with_boxed_rng(config: SimulationConfig, rng: Box<dyn RandomSource + Send>) -> Result<Self> {
        let scheduler = Scheduler::new(&config)?;
        info!("particle context created");
        Ok(Self {
            registry: Registry::new(),
            scheduler,
            rng,
            presenter: Presenter::new(),
            canvas: None,
            viewport: None,
            totals: FrameTotals::default(),
            last_frame: FrameStats::default(),
        })
    }

    /// Build a context and every emitter a scene describes. Handles are
    /// returned in scene order, paired with the emitter names.
    pub fn from_scene(
        scene: &SceneDescriptor,
        now: f32,
    ) -> Result<(Self, Vec<(String, EmitterHandle)>)> {
        let mut context = Self::new(scene.simulation.clone())?;
        let mut handles = Vec::with_capacity(scene.emitters.len());
        for desc in &scene.emitters {
            let handle = context.spawn_emitter(
                desc.template.clone(),
                desc.spawn_count,
                desc.position,
                desc.rotation,
                desc.spawn_rate,
                now,
            )?;
            if desc.autostart {
                context.start(handle)?;
            }
            handles.push((desc.name.clone(), handle));
        }
        info!("scene loaded: {} emitter(s)", handles.len());
        Ok((context, handles))
    }

    /// Create an idle emitter. `spawn_count` particles are emitted per batch
    /// once started.
    pub fn spawn_emitter(
        &mut self,
        template: impl Into<Arc<ParticleTemplate>>,
        spawn_count: u32,
        position: Vec2,
        rotation: f32,
        spawn_rate: f32,
        now: f32,
    ) -> Result<EmitterHandle> {
        let template = template.into();
        template.validate()?;
        check_rate(spawn_rate)?;

        let entity = self.registry.spawn(
            EntityBuilder::new()
                .add(EmitterState::new(template, spawn_count, spawn_rate))
                .add(Position(position))
                .add(Rotation(rotation)),
        );
        info!(
            "emitter {entity:?} spawned at ({:.1}, {:.1}) t={now:.3}, {spawn_count} every {spawn_rate}s",
            position.x, position.y
        );
        Ok(EmitterHandle(entity))
    }

    /// Destroy an emitter. Particles it already emitted live on.
    pub fn despawn_emitter(&mut self, handle: EmitterHandle) -> Result<()> {
        self.emitter(handle)?;
        self.registry.destroy(handle.0)?;
        info!("emitter {:?} despawned", handle.0);
        Ok(())
    }

    /// Run one full pipeline pass for simulation time `now`
    pub fn advance(&mut self, now: f32, dt: f32) -> Result<FrameStats> {
        let frame = self
            .scheduler
            .run_frame(&mut self.registry, &mut *self.rng, now, dt)?;
        self.totals.record(&frame);
        self.last_frame = frame;
        Ok(frame)
    }

    /// Draw the current state on the registered canvas, if any
    pub fn present(&mut self) -> PresentStats {
        match self.canvas.as_deref_mut() {
            Some(canvas) => self.presenter.present(&self.registry, canvas),
            None => PresentStats::default(),
        }
    }

    /// Draw the current state on `canvas`
    pub fn present_to(&mut self, canvas: &mut dyn Canvas) -> PresentStats {
        self.presenter.present(&self.registry, canvas)
    }

    /// Register the canvas `present` draws on; it receives the last known
    /// viewport immediately.
    pub fn set_canvas(&mut self, mut canvas: Box<dyn Canvas + Send>) {
        if let Some((width, height)) = self.viewport {
            canvas.resize(width, height);
        }
        self.canvas = Some(canvas);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
        if let Some(canvas) = self.canvas.as_deref_mut() {
            canvas.resize(width, height);
        }
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    pub fn start(&mut self, handle: EmitterHandle) -> Result<()> {
        self.emitter_mut(handle)?.start();
        Ok(())
    }

    pub fn stop(&mut self, handle: EmitterHandle) -> Result<()> {
        self.emitter_mut(handle)?.stop();
        Ok(())
    }

    pub fn is_spawning(&self, handle: EmitterHandle) -> Result<bool> {
        Ok(self.emitter(handle)?.is_spawning())
    }

    pub fn position(&self, handle: EmitterHandle) -> Result<Vec2> {
        self.emitter(handle)?;
        Ok(self.registry.get::<Position>(handle.0)?.0)
    }

    pub fn set_position(&mut self, handle: EmitterHandle, position: Vec2) -> Result<()> {
        self.emitter(handle)?;
        self.registry.get_mut::<Position>(handle.0)?.0 = position;
        Ok(())
    }

    /// Degrees
    pub fn rotation(&self, handle: EmitterHandle) -> Result<f32> {
        self.emitter(handle)?;
        Ok(self.registry.get::<Rotation>(handle.0)?.0)
    }

    pub fn set_rotation(&mut self, handle: EmitterHandle, degrees: f32) -> Result<()> {
        self.emitter(handle)?;
        self.registry.get_mut::<Rotation>(handle.0)?.0 = degrees;
        Ok(())
    }

    pub fn set_spawn_count(&mut self, handle: EmitterHandle, count: u32) -> Result<()> {
        self.emitter_mut(handle)?.spawn_count = count;
        Ok(())
    }

    pub fn set_spawn_rate(&mut self, handle: EmitterHandle, seconds: f32) -> Result<()> {
        check_rate(seconds)?;
        self.emitter_mut(handle)?.spawn_rate = seconds;
        Ok(())
    }

    /// Shared view of an emitter's state
    pub fn emitter(&self, handle: EmitterHandle) -> Result<hecs::Ref<'_, EmitterState>> {
        self.registry.get::<EmitterState>(handle.0)
    }

    /// Exclusive view of an emitter's state
    pub fn emitter_mut(&mut self, handle: EmitterHandle) -> Result<hecs::RefMut<'_, EmitterState>> {
        self.registry.get_mut::<EmitterState>(handle.0)
    }

    /// Entity and per-component memory counts
    pub fn stats(&self) -> RegistryStats {
        let r = &self.registry;
        RegistryStats {
            alive_entities: r.len(),
            components: vec![
                r.census::<Position>(),
                r.census::<Velocity>(),
                r.census::<Acceleration>(),
                r.census::<Rotation>(),
                r.census::<AngularVelocity>(),
                r.census::<AngularAcceleration>(),
                r.census::<Size>(),
                r.census::<Tint>(),
                r.census::<Lifetime>(),
                r.census::<DrawTag>(),
                r.census::<DestroyTag>(),
                r.census::<VelocityOverLifetime>(),
                r.census::<SizeOverLifetime>(),
                r.census::<ColorOverLifetime>(),
                r.census::<RotationOverLifetime>(),
                r.census::<AngularVelocityOverLifetime>(),
                r.census::<EmitterState>(),
            ],
        }
    }

    /// Particles currently in the registry, dying ones included
    pub fn particle_count(&self) -> usize {
        self.registry.census::<Lifetime>().count
    }

    pub fn emitter_count(&self) -> usize {
        self.registry.census::<EmitterState>().count
    }

    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    pub fn totals(&self) -> FrameTotals {
        self.totals
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct registry access for hosts attaching their own components
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Drop every emitter and particle
    pub fn clear(&mut self) {
        self.registry.clear();
        info!("particle context cleared");
    }
}

fn check_rate(seconds: f32) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(EmberError::InvalidTemplate(format!(
            "spawn rate must be a non-negative number of seconds, got {seconds}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframes::Keyframes;
    use crate::present::{DrawCommand, PointInstance};
    use crate::template::Property;
    use ember_core::Color;
    use std::sync::Mutex;

    fn context() -> ParticleContext {
        ParticleContext::new(SimulationConfig {
            worker_threads: 2,
            seed: Some(7),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn end_to_end_turnover() {
        let mut ctx = context();
        let template = ParticleTemplate {
            lifetime: Property::Fixed(1.0),
            ..Default::default()
        };
        let emitter = ctx
            .spawn_emitter(template, 5, Vec2::new(400.0, 300.0), 0.0, 0.1, 0.0)
            .unwrap();
        ctx.start(emitter).unwrap();

        let mut created = 0;
        let mut now = 0.0;
        for i in 0..=105 {
            now = i as f32 * 0.01;
            created += ctx.advance(now, 0.01).unwrap().spawned;
        }
        assert!(created >= 50, "only {created} particles spawned");
        assert_eq!(ctx.totals().spawned as usize, created);
        assert_eq!(ctx.totals().frames, 106);

        // The first batches are gone; nothing untagged has outlived its lifetime
        let reg = ctx.registry();
        assert!(ctx.totals().destroyed > 0);
        for (_, life) in reg.view_excluding::<&Lifetime, &DestroyTag>().iter() {
            assert!(life.normalized_age <= 1.0);
            assert!(now - life.spawn_time <= 1.0 + 1e-4);
        }
        for (_, life) in reg.view::<&Lifetime>().iter() {
            assert!(life.spawn_time > 0.0, "first batch still present");
        }
        assert_eq!(ctx.emitter_count(), 1);
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut ctx = context();
        let template = ParticleTemplate {
            lifetime: Property::Fixed(10.0),
            velocity: Property::range(Vec2::new(-5.0, -5.0), Vec2::new(5.0, 5.0)),
            acceleration: Property::Fixed(Vec2::new(0.0, 9.8)),
            size_over_lifetime: Some(Keyframes::span(Vec2::splat(8.0), Vec2::splat(2.0))),
            color_over_lifetime: Some(Keyframes::span(Color::RED, Color::BLUE)),
            ..Default::default()
        };
        let emitter = ctx
            .spawn_emitter(template, 10, Vec2::ZERO, 0.0, 100.0, 0.0)
            .unwrap();
        ctx.start(emitter).unwrap();
        ctx.advance(0.0, 0.0).unwrap();
        ctx.advance(0.5, 0.5).unwrap();

        let snapshot = |ctx: &ParticleContext| {
            let mut rows: Vec<_> = ctx
                .registry()
                .view::<(&Position, &Velocity, &Size, &Tint)>()
                .iter()
                .map(|(e, (p, v, s, t))| (e, *p, *v, *s, *t))
                .collect();
            rows.sort_by_key(|row| row.0.to_bits());
            rows
        };
        let before = snapshot(&ctx);
        let frame = ctx.advance(0.5, 0.0).unwrap();
        assert_eq!(frame.spawned, 0);
        assert_eq!(frame.destroyed, 0);
        assert_eq!(frame.expired, 0);
        assert_eq!(before, snapshot(&ctx));
        assert_eq!(before.len(), 10);
    }

    #[test]
    fn emitter_controls() {
        let mut ctx = context();
        let e = ctx
            .spawn_emitter(ParticleTemplate::default(), 2, Vec2::ZERO, 0.0, 0.0, 0.0)
            .unwrap();
        assert!(!ctx.is_spawning(e).unwrap());
        assert_eq!(ctx.advance(0.0, 0.0).unwrap().spawned, 0);

        ctx.start(e).unwrap();
        ctx.set_position(e, Vec2::new(10.0, 20.0)).unwrap();
        ctx.set_rotation(e, 30.0).unwrap();
        ctx.set_spawn_count(e, 3).unwrap();
        assert_eq!(ctx.position(e).unwrap(), Vec2::new(10.0, 20.0));
        assert_eq!(ctx.rotation(e).unwrap(), 30.0);
        assert_eq!(ctx.advance(0.1, 0.1).unwrap().spawned, 3);

        ctx.stop(e).unwrap();
        assert_eq!(ctx.advance(0.2, 0.1).unwrap().spawned, 0);

        assert!(ctx.set_spawn_rate(e, -1.0).is_err());
        ctx.despawn_emitter(e).unwrap();
        assert!(matches!(ctx.start(e), Err(EmberError::StaleEntity(_))));
        assert_eq!(ctx.particle_count(), 3);
    }

    #[test]
    fn particles_are_not_emitter_handles() {
        let mut ctx = context();
        let e = ctx
            .spawn_emitter(ParticleTemplate::default(), 1, Vec2::ZERO, 0.0, 0.0, 0.0)
            .unwrap();
        ctx.start(e).unwrap();
        ctx.advance(0.0, 0.0).unwrap();

        let particle = ctx
            .registry()
            .view::<&Lifetime>()
            .iter()
            .map(|(entity, _)| entity)
            .next()
            .unwrap();
        let fake = EmitterHandle(particle);
        assert!(matches!(
            ctx.set_position(fake, Vec2::ONE),
            Err(EmberError::MissingComponent { .. })
        ));
        assert!(ctx.despawn_emitter(fake).is_err());
    }

    #[test]
    fn rejects_invalid_templates_up_front() {
        let mut ctx = context();
        let template = ParticleTemplate {
            lifetime: Property::Absent,
            ..Default::default()
        };
        let err = ctx
            .spawn_emitter(template, 1, Vec2::ZERO, 0.0, 0.1, 0.0)
            .unwrap_err();
        assert!(matches!(err, EmberError::InvalidTemplate(_)));
        assert_eq!(ctx.emitter_count(), 0);
    }

    #[test]
    fn stats_count_components() {
        let mut ctx = context();
        let e = ctx
            .spawn_emitter(ParticleTemplate::default(), 4, Vec2::ZERO, 0.0, 1.0, 0.0)
            .unwrap();
        ctx.start(e).unwrap();
        ctx.advance(0.0, 0.0).unwrap();

        let stats = ctx.stats();
        assert_eq!(stats.alive_entities, 5);
        assert_eq!(stats.component("Position").unwrap().count, 5);
        assert_eq!(stats.component("Lifetime").unwrap().count, 4);
        assert_eq!(stats.component("EmitterState").unwrap().count, 1);
        assert_eq!(stats.component("OverLifetime<Size>").unwrap().count, 0);
        assert!(stats.total_bytes() > 0);
    }

    struct Shared(Arc<Mutex<(usize, Option<(u32, u32)>)>>);

    impl Canvas for Shared {
        fn resize(&mut self, width: u32, height: u32) {
            self.0.lock().unwrap().1 = Some((width, height));
        }
        fn draw(&mut self, _: &DrawCommand) {
            self.0.lock().unwrap().0 += 1;
        }
        fn draw_point_batch(&mut self, points: &[PointInstance]) {
            self.0.lock().unwrap().0 += points.len();
        }
    }

    #[test]
    fn canvas_receives_viewport_and_draws() {
        let mut ctx = context();
        let seen = Arc::new(Mutex::new((0, None)));
        ctx.resize(800, 600);
        ctx.set_canvas(Box::new(Shared(Arc::clone(&seen))));
        assert_eq!(seen.lock().unwrap().1, Some((800, 600)));

        ctx.resize(1024, 768);
        assert_eq!(seen.lock().unwrap().1, Some((1024, 768)));

        let e = ctx
            .spawn_emitter(ParticleTemplate::default(), 6, Vec2::ZERO, 0.0, 1.0, 0.0)
            .unwrap();
        ctx.start(e).unwrap();
        ctx.advance(0.0, 0.0).unwrap();
        let drawn = ctx.present();
        assert_eq!(drawn.immediate, 6);
        assert_eq!(seen.lock().unwrap().0, 6);
    }
}
