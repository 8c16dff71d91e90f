//! Ember Core - Foundational types for the Ember particle engine
//!
//! This crate provides the core types that all other Ember crates depend on:
//! - `Vec2`, `Color`, `Hsv` - Planar and color types
//! - `RandomSource` - Injected uniform random capability
//! - Error types and Result alias

mod error;
pub mod random;
mod types;

pub use error::{EmberError, Result};
pub use random::RandomSource;
pub use types::{Color, Hsv, Vec2};
