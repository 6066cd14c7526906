//! Lane Dash - a three-lane arcade driving game
//!
//! Core modules:
//! - `sim`: Simulation (kinematics, pickups, collisions, clock, scoring)
//! - `game`: Simulation bound to storage and player settings
//! - `highscores`: Persisted top-5 leaderboard
//! - `persistence`: Key-value storage backends (memory, file, LocalStorage)
//! - `settings`: Player preferences (vehicle, difficulty)
//! - `garage`: Selectable vehicle catalog
//! - `tuning`: Data-driven game balance

pub mod game;
pub mod garage;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::{FrameView, Game};
pub use garage::{VehicleKind, VehicleProfile};
pub use highscores::HighScores;
pub use settings::{Difficulty, Settings};
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Number of lanes on the road
    pub const LANE_COUNT: usize = 3;
    /// Lane the car starts in (center)
    pub const START_LANE: usize = 1;
    /// Frame rate that per-frame lerp factors are quoted at
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Render frame timestep used by native hosts
    pub const FRAME_DT: f32 = 1.0 / REFERENCE_FPS;
}

/// Fraction of the remaining distance to cover this tick for an exponential
/// approach with the given response `rate` (1/s).
///
/// Frame-rate independent: two ticks of `dt` cover the same ground as one of `2 * dt`.
#[inline]
pub fn ease_factor(rate: f32, dt: f32) -> f32 {
    if dt <= 0.0 || rate <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Convert a per-frame lerp factor tuned at [`consts::REFERENCE_FPS`] into a response rate (1/s)
#[inline]
pub fn rate_from_frame_factor(factor: f32) -> f32 {
    -(1.0 - factor.clamp(0.0, 0.999_999)).ln() * consts::REFERENCE_FPS
}

/// Distance on the ground plane (x, z), ignoring height
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_factor_is_frame_rate_independent() {
        let rate = 6.0;
        let one = ease_factor(rate, 0.1);
        let half = ease_factor(rate, 0.05);
        // Two half steps leave (1 - half)^2 of the distance; one full step leaves (1 - one)
        let remaining_two_steps = (1.0 - half) * (1.0 - half);
        assert!((remaining_two_steps - (1.0 - one)).abs() < 1e-5);
    }

    #[test]
    fn test_ease_factor_degenerate_inputs() {
        assert_eq!(ease_factor(6.0, 0.0), 0.0);
        assert_eq!(ease_factor(6.0, -1.0), 0.0);
        assert_eq!(ease_factor(0.0, 0.016), 0.0);
    }

    #[test]
    fn test_rate_from_frame_factor_matches_60hz_lerp() {
        let rate = rate_from_frame_factor(0.1);
        let f = ease_factor(rate, consts::FRAME_DT);
        assert!((f - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.5, 0.0);
        let b = Vec3::new(3.0, 10.0, 4.0);
        assert!((planar_distance(a, b) - 5.0).abs() < 1e-6);
    }
}
