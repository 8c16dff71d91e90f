//! Particle and emitter components
//!
//! Every component is plain data. An entity's behaviour is decided purely by
//! which of these it carries: a particle without `Acceleration` skips the
//! kinematic unit, one without `Rotation` is never rotated, and so on.

use crate::keyframes::{Blend, Keyframes};
use ember_core::{Color, Vec2};
use hecs::Component;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec2);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec2);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Acceleration(pub Vec2);

/// Angle in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation(pub f32);

/// Degrees per second
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngularVelocity(pub f32);

/// Degrees per second squared
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngularAcceleration(pub f32);

/// Width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size(pub Vec2);

/// Render color of a particle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tint(pub Color);

/// Age bookkeeping for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    /// Seconds the particle lives
    pub total: f32,
    /// Simulation time of the spawn
    pub spawn_time: f32,
    /// `(now - spawn_time) / total`, refreshed every frame
    pub normalized_age: f32,
}

impl Lifetime {
    pub fn new(total: f32, spawn_time: f32) -> Self {
        Self {
            total,
            spawn_time,
            normalized_age: 0.0,
        }
    }

    /// Recompute the normalized age at `now`; true once the particle has
    /// outlived its lifetime.
    pub fn refresh(&mut self, now: f32) -> bool {
        self.normalized_age = (now - self.spawn_time) / self.total;
        self.normalized_age > 1.0
    }
}

/// Marks an entity for removal at the next destruction sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestroyTag;

/// Which drawing routine renders a particle.
///
/// Exactly one is attached to every particle. The payload of the
/// parameterized kinds is copied from the template at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawTag {
    /// Single pixel, drawn immediately
    #[default]
    Point,
    Circle,
    Ellipse,
    Rect,
    Ring {
        #[serde(default)]
        start_angle: f32,
        #[serde(default = "full_turn")]
        end_angle: f32,
        #[serde(default = "three")]
        segments: u32,
    },
    RectGradient {
        /// Second gradient endpoint; the first is the particle's tint
        other: Color,
        #[serde(default = "yes")]
        horizontal: bool,
        /// When false the gradient runs from `other` to the tint
        #[serde(default = "yes")]
        tint_first: bool,
    },
    RoundedRect {
        roundness: f32,
        #[serde(default = "three")]
        segments: u32,
    },
    /// Pixel-sized point collected into one instance buffer per frame
    BatchedPoint,
}

fn full_turn() -> f32 {
    360.0
}

fn three() -> u32 {
    3
}

fn yes() -> bool {
    true
}

impl DrawTag {
    /// Position of this kind in the presentation order
    pub fn order(&self) -> u8 {
        match self {
            DrawTag::Point => 0,
            DrawTag::Circle => 1,
            DrawTag::Ellipse => 2,
            DrawTag::Rect => 3,
            DrawTag::Ring { .. } => 4,
            DrawTag::RectGradient { .. } => 5,
            DrawTag::RoundedRect { .. } => 6,
            DrawTag::BatchedPoint => 7,
        }
    }

    /// Whether the presenter feeds this kind into the point batch
    pub fn is_batched(&self) -> bool {
        matches!(self, DrawTag::BatchedPoint)
    }

    /// Whether drawing this kind needs a `Size`
    pub fn needs_size(&self) -> bool {
        !matches!(self, DrawTag::Point | DrawTag::BatchedPoint)
    }
}

/// A live component that an over-lifetime table can drive
pub trait Animated: Component {
    type Value: Blend;

    fn set(&mut self, value: Self::Value);
}

impl Animated for Velocity {
    type Value = Vec2;
    fn set(&mut self, value: Vec2) {
        self.0 = value;
    }
}

impl Animated for Size {
    type Value = Vec2;
    fn set(&mut self, value: Vec2) {
        self.0 = value;
    }
}

impl Animated for Tint {
    type Value = Color;
    fn set(&mut self, value: Color) {
        self.0 = value;
    }
}

impl Animated for Rotation {
    type Value = f32;
    fn set(&mut self, value: f32) {
        self.0 = value;
    }
}

impl Animated for AngularVelocity {
    type Value = f32;
    fn set(&mut self, value: f32) {
        self.0 = value;
    }
}

/// Keyframe table driving component `C` over a particle's normalized age,
/// plus the most recently sampled value.
pub struct OverLifetime<C: Animated> {
    pub table: Keyframes<C::Value>,
    pub value: C::Value,
    _target: PhantomData<fn() -> C>,
}

impl<C: Animated> OverLifetime<C> {
    /// Start with the cache holding the table's value at age zero
    pub fn new(table: Keyframes<C::Value>) -> Self {
        Self {
            value: table.evaluate(0.0),
            table,
            _target: PhantomData,
        }
    }

    /// Sample the table at `age` into the cache
    pub fn resample(&mut self, age: f32) {
        self.value = self.table.evaluate(age);
    }
}

impl<C: Animated> Clone for OverLifetime<C> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            value: self.value,
            _target: PhantomData,
        }
    }
}

impl<C: Animated> fmt::Debug for OverLifetime<C>
where
    C::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverLifetime")
            .field("table", &self.table)
            .field("value", &self.value)
            .finish()
    }
}

pub type VelocityOverLifetime = OverLifetime<Velocity>;
pub type SizeOverLifetime = OverLifetime<Size>;
pub type ColorOverLifetime = OverLifetime<Tint>;
pub type RotationOverLifetime = OverLifetime<Rotation>;
pub type AngularVelocityOverLifetime = OverLifetime<AngularVelocity>;
