//! Runtime system trait

use crate::clock::GameClock;
use ember_core::Result;

/// A system that can be ticked by a host loop
///
/// Systems are updated in registration order, once per frame.
pub trait RuntimeSystem {
    /// Called once before the first update
    fn initialize(&mut self) -> Result<()>;

    /// Called once per frame with the clock already advanced
    fn update(&mut self, clock: &GameClock) -> Result<()>;

    /// Viewport changed
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Called when the system is being shut down
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
