//! Simulation clock: wall-clock ticking or fixed manual stepping

use std::time::Instant;

/// Tracks simulated time for the frame pipeline.
///
/// `tick` follows the wall clock (interactive hosts); `step` advances by an
/// exact amount (headless runs, tests, offline rendering).
pub struct GameClock {
    /// Total elapsed simulated time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Largest delta a single wall-clock tick may report
    pub max_delta: f64,
    /// Frames advanced so far
    frame: u64,
    /// Last tick instant
    last_instant: Instant,
    /// Whether this is the first tick
    first_tick: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            max_delta: 0.25,
            frame: 0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl GameClock {
    /// Create a new clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock that starts at `time` seconds
    pub fn starting_at(time: f64) -> Self {
        Self {
            total_time: time,
            ..Self::default()
        }
    }

    /// Advance from the wall clock. Call once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.frame += 1;

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;

        // Clamp to avoid spiral of death after a stall
        self.delta_time = elapsed.min(self.max_delta);
        self.total_time += self.delta_time;
    }

    /// Advance by exactly `dt` seconds, ignoring the wall clock
    pub fn step(&mut self, dt: f64) {
        self.frame += 1;
        self.first_tick = false;
        self.delta_time = dt.max(0.0);
        self.total_time += self.delta_time;
    }

    /// Number of frames advanced
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current time and delta as the `f32` pair the simulation consumes
    pub fn now_and_delta(&self) -> (f32, f32) {
        (self.total_time as f32, self.delta_time as f32)
    }
}
