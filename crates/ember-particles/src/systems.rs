//! Per-frame update units
//!
//! Every unit except `destroy_marked` takes the registry by shared reference
//! so the scheduler can run several of them at once. Each unit's mutable
//! footprint is spelled out in its query; units that run side by side must
//! never mutate the same column of the same archetype.

use crate::components::{
    Acceleration, AngularAcceleration, AngularVelocity, Animated, DestroyTag, Lifetime,
    OverLifetime, Position, Rotation, Velocity,
};
use crate::config::InterpolationOrder;
use ember_ecs::{Entity, Registry};

/// Remove every entity tagged for destruction
pub fn destroy_marked(registry: &mut Registry) -> usize {
    registry.destroy_tagged::<DestroyTag>()
}

/// Refresh normalized ages. Returns the entities that just expired; the
/// caller tags them once no other unit is iterating.
///
/// Mutates: `Lifetime`
pub fn update_lifetimes(registry: &Registry, now: f32) -> Vec<Entity> {
    registry
        .view::<&mut Lifetime>()
        .iter()
        .filter_map(|(entity, lifetime)| lifetime.refresh(now).then_some(entity))
        .collect()
}

/// `v += a·dt`, then `p += v·dt + ½·a·dt²` with the updated velocity
///
/// Mutates: `Position`, `Velocity` on entities with `Acceleration`
pub fn integrate_kinematics(registry: &Registry, dt: f32) {
    for (_, (position, velocity, acceleration)) in registry
        .view::<(&mut Position, &mut Velocity, &Acceleration)>()
        .iter()
    {
        velocity.0 += acceleration.0 * dt;
        position.0 += velocity.0 * dt + acceleration.0 * (0.5 * dt * dt);
    }
}

/// `p += v·dt`
///
/// Mutates: `Position` on entities without `Acceleration`
pub fn integrate_positions(registry: &Registry, dt: f32) {
    for (_, (position, velocity)) in registry
        .view_excluding::<(&mut Position, &Velocity), &Acceleration>()
        .iter()
    {
        position.0 += velocity.0 * dt;
    }
}

/// Angular counterpart of [`integrate_kinematics`]
///
/// Mutates: `Rotation`, `AngularVelocity` on entities with `AngularAcceleration`
pub fn integrate_angular_kinematics(registry: &Registry, dt: f32) {
    for (_, (rotation, angular_velocity, angular_acceleration)) in registry
        .view::<(&mut Rotation, &mut AngularVelocity, &AngularAcceleration)>()
        .iter()
    {
        angular_velocity.0 += angular_acceleration.0 * dt;
        rotation.0 += angular_velocity.0 * dt + angular_acceleration.0 * (0.5 * dt * dt);
    }
}

/// Angular counterpart of [`integrate_positions`]
///
/// Mutates: `Rotation` on entities without `AngularAcceleration`
pub fn integrate_rotations(registry: &Registry, dt: f32) {
    for (_, (rotation, angular_velocity)) in registry
        .view_excluding::<(&mut Rotation, &AngularVelocity), &AngularAcceleration>()
        .iter()
    {
        rotation.0 += angular_velocity.0 * dt;
    }
}

/// Sample each `OverLifetime<C>` table at its entity's normalized age
///
/// Mutates: `OverLifetime<C>`
pub fn resample<C: Animated>(registry: &Registry) {
    for (_, (curve, lifetime)) in registry
        .view_excluding::<(&mut OverLifetime<C>, &Lifetime), &DestroyTag>()
        .iter()
    {
        curve.resample(lifetime.normalized_age);
    }
}

/// Copy each cached sample into the live `C`
///
/// Mutates: `C`
pub fn apply<C: Animated>(registry: &Registry) {
    for (_, (curve, live)) in registry
        .view_excluding::<(&OverLifetime<C>, &mut C), &DestroyTag>()
        .iter()
    {
        live.set(curve.value);
    }
}

/// Both over-lifetime steps for property `C`, in the configured order
///
/// Mutates: `OverLifetime<C>`, `C`
pub fn animate<C: Animated>(registry: &Registry, order: InterpolationOrder) {
    match order {
        InterpolationOrder::RecomputeThenApply => {
            resample::<C>(registry);
            apply::<C>(registry);
        }
        InterpolationOrder::ApplyThenRecompute => {
            apply::<C>(registry);
            resample::<C>(registry);
        }
    }
}
