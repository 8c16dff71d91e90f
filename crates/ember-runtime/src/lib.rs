//! Ember Runtime - Frame loop building blocks
//!
//! - `GameClock`: wall-clock or manually stepped simulation time
//! - `RuntimeSystem`: trait for systems ticked by the host loop

mod clock;
mod system;

pub use clock::GameClock;
pub use system::RuntimeSystem;
