//! Ember ECS - Component registry
//!
//! This crate wraps hecs with the registry contract the particle
//! simulation relies on: checked attach/detach, include/exclude views,
//! bulk tag-driven destruction and memory statistics.

mod registry;
mod stats;

pub use hecs::{Entity, EntityBuilder};
pub use registry::Registry;
pub use stats::{format_bytes, ComponentStat, RegistryStats};
