//! Countdown clock and lifecycle phase

use serde::Serialize;

use super::state::GamePhase;

/// Result of one elapsed second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Game already over, nothing changed
    Ignored,
    /// Countdown moved, still running
    Counted { remaining: u32 },
    /// Countdown hit zero; the phase just became GameOver
    Expired,
}

/// Countdown timer driving Running → GameOver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameClock {
    duration: u32,
    remaining: u32,
    phase: GamePhase,
}

impl GameClock {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            phase: GamePhase::Running,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// One real second elapsed
    pub fn tick_second(&mut self) -> ClockTick {
        if self.phase == GamePhase::GameOver {
            return ClockTick::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = GamePhase::GameOver;
            return ClockTick::Expired;
        }
        ClockTick::Counted {
            remaining: self.remaining,
        }
    }

    /// End the game early. Returns true only if this call performed the transition.
    pub fn end(&mut self) -> bool {
        if self.phase == GamePhase::GameOver {
            return false;
        }
        self.phase = GamePhase::GameOver;
        true
    }

    /// Back to Running with a full countdown
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.phase = GamePhase::Running;
    }
}

/// Converts variable frame time into whole elapsed seconds, for hosts without a
/// separate interval timer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SecondTicker {
    accumulator: f32,
}

impl SecondTicker {
    /// Add frame time; returns how many whole seconds elapsed
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt;
        let seconds = self.accumulator.floor();
        self.accumulator -= seconds;
        seconds as u32
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
