//! Time management for the game loop.

use std::time::{Duration, Instant};

/// Measures the wall-clock time between frames.
#[derive(Debug)]
pub struct Time {
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta: Duration::ZERO,
        }
    }

    /// Update timing at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last_frame;
        self.last_frame = now;
    }

    /// Get the delta time as a Duration.
    pub fn delta(&self) -> Duration {
        self.delta
    }
}

/// A countdown that only moves towards zero and never past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: Duration,
}

impl Countdown {
    pub fn new(remaining: Duration) -> Self {
        Self { remaining }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// True while some time is left.
    pub fn is_running(&self) -> bool {
        !self.remaining.is_zero()
    }

    /// Subtract `elapsed`, clamping at zero.
    ///
    /// Returns true when a clock display should be refreshed: the whole-second
    /// value changed, or more than a second passed in one step.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let before = self.remaining.as_secs();
        self.remaining = self.remaining.saturating_sub(elapsed);
        elapsed > Duration::from_secs(1) || self.remaining.as_secs() != before
    }

    /// Remaining time split into whole minutes and seconds.
    pub fn minutes_seconds(&self) -> (u64, u64) {
        let secs = self.remaining.as_secs();
        (secs / 60, secs % 60)
    }
}
