//! Registry - sparse component storage keyed by entity

use crate::stats::ComponentStat;
use ember_core::{EmberError, Result};
use hecs::{Component, Entity, EntityBuilder, Query, QueryBorrow, QueryMut, Without};

/// The component registry shared by emitters and particles
///
/// Wraps hecs::World with:
/// - Contract-checked attach (no silent overwrite)
/// - Errors for stale entities and missing components
/// - Include/exclude views evaluated lazily at iteration time
///
/// Views borrow the registry immutably and may run on several threads at
/// once as long as their mutable component sets don't overlap. Structural
/// changes (create, destroy, emplace, remove) need `&mut self`, so they can
/// never race a live view.
pub struct Registry {
    world: hecs::World,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
        }
    }

    /// Create an entity with no components
    pub fn create(&mut self) -> Entity {
        self.world.spawn(())
    }

    /// Create an entity with every component staged in `builder` attached at once.
    ///
    /// The builder is drained and can be reused for the next entity.
    pub fn spawn(&mut self, builder: &mut EntityBuilder) -> Entity {
        self.world.spawn(builder.build())
    }

    /// Destroy an entity and all of its components
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        self.world
            .despawn(entity)
            .map_err(|_| EmberError::StaleEntity(format!("{entity:?}")))
    }

    /// Destroy every entity carrying `T`, returning how many were removed
    pub fn destroy_tagged<T: Component>(&mut self) -> usize {
        let doomed: Vec<Entity> = self
            .world
            .query::<()>()
            .with::<&T>()
            .iter()
            .map(|(entity, ())| entity)
            .collect();

        for entity in &doomed {
            // Collected from a live query an instant ago
            let _ = self.world.despawn(*entity);
        }
        doomed.len()
    }

    /// Attach `component` to `entity`. Fails if the entity already has one.
    pub fn emplace<C: Component>(&mut self, entity: Entity, component: C) -> Result<()> {
        if self.has::<C>(entity)? {
            return Err(EmberError::DuplicateComponent {
                entity: format!("{entity:?}"),
                component: short_type_name::<C>(),
            });
        }
        self.world
            .insert_one(entity, component)
            .map_err(|_| EmberError::StaleEntity(format!("{entity:?}")))
    }

    /// Detach and return a component
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Result<C> {
        self.world
            .remove_one::<C>(entity)
            .map_err(|e| component_error::<C>(entity, e))
    }

    /// Shared access to a component the caller knows is present
    pub fn get<C: Component>(&self, entity: Entity) -> Result<hecs::Ref<'_, C>> {
        self.world
            .get::<&C>(entity)
            .map_err(|e| component_error::<C>(entity, e))
    }

    /// Exclusive access to a component the caller knows is present
    pub fn get_mut<C: Component>(&self, entity: Entity) -> Result<hecs::RefMut<'_, C>> {
        self.world
            .get::<&mut C>(entity)
            .map_err(|e| component_error::<C>(entity, e))
    }

    /// Shared access to a component that may be absent
    pub fn try_get<C: Component>(&self, entity: Entity) -> Option<hecs::Ref<'_, C>> {
        self.world.get::<&C>(entity).ok()
    }

    /// Whether a live entity has `C`
    pub fn has<C: Component>(&self, entity: Entity) -> Result<bool> {
        self.world
            .entity(entity)
            .map(|e| e.has::<C>())
            .map_err(|_| EmberError::StaleEntity(format!("{entity:?}")))
    }

    /// Entities having every component in `Q`
    pub fn view<Q: Query>(&self) -> QueryBorrow<'_, Q> {
        self.world.query::<Q>()
    }

    /// Entities having every component in `Q` and none matched by `X`
    pub fn view_excluding<Q: Query, X: Query>(&self) -> QueryBorrow<'_, Without<Q, X>> {
        self.world.query::<Q>().without::<X>()
    }

    /// Exclusive view; skips runtime borrow tracking
    pub fn view_mut<Q: Query>(&mut self) -> QueryMut<'_, Q> {
        self.world.query_mut::<Q>()
    }

    /// Check if an entity is alive
    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.len() == 0
    }

    /// Count and memory footprint of one component type, in O(archetypes)
    pub fn census<C: Component>(&self) -> ComponentStat {
        let count = self
            .world
            .archetypes()
            .filter(|a| a.has::<C>())
            .map(|a| a.len() as usize)
            .sum();
        ComponentStat {
            name: short_type_name::<C>(),
            count,
            bytes: count * std::mem::size_of::<C>(),
        }
    }

    /// Destroy everything
    pub fn clear(&mut self) {
        self.world.clear();
    }

    /// Underlying world, for callers that need raw hecs access
    pub fn world(&self) -> &hecs::World {
        &self.world
    }
}

fn component_error<C: Component>(entity: Entity, err: hecs::ComponentError) -> EmberError {
    match err {
        hecs::ComponentError::NoSuchEntity => EmberError::StaleEntity(format!("{entity:?}")),
        hecs::ComponentError::MissingComponent(_) => EmberError::MissingComponent {
            entity: format!("{entity:?}"),
            component: short_type_name::<C>(),
        },
    }
}

/// `ember_particles::components::OverLifetime<ember_core::Color>` -> `OverLifetime<Color>`
pub(crate) fn short_type_name<C>() -> String {
    let full = std::any::type_name::<C>();
    let mut out = String::with_capacity(full.len());
    let mut path = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            path.push(ch);
        } else {
            out.push_str(path.rsplit("::").next().unwrap_or(""));
            path.clear();
            out.push(ch);
        }
    }
    out.push_str(path.rsplit("::").next().unwrap_or(""));
    out
}
