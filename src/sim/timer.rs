//! Single-shot countdown timers owned by simulation components
//!
//! Timers advance only when their owner advances them, so cancelling one (or replacing the
//! owner on reset) guarantees it can never fire afterwards.

use serde::Serialize;

/// A cancellable one-shot timer measured in simulation seconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Timer {
    remaining: Option<f32>,
}

impl Timer {
    /// A timer that is not running
    pub fn idle() -> Self {
        Self { remaining: None }
    }

    /// Start (or restart) the timer
    pub fn arm(&mut self, duration: f32) {
        self.remaining = Some(duration.max(0.0));
    }

    /// Stop the timer without firing
    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Seconds left (0 when idle)
    pub fn remaining(&self) -> f32 {
        self.remaining.unwrap_or(0.0)
    }

    /// Advance by `dt`. Returns true exactly once, on the tick the timer expires.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.remaining.as_mut() else {
            return false;
        };
        if dt.is_finite() && dt > 0.0 {
            *remaining -= dt;
        }
        if *remaining <= 0.0 {
            self.remaining = None;
            return true;
        }
        false
    }
}
