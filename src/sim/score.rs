//! Score accumulation and floating popups

use glam::Vec3;

use super::state::ScorePopup;

/// Applies score deltas and owns the popups they spawn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreFeed {
    popups: Vec<ScorePopup>,
    next_id: u64,
}

impl ScoreFeed {
    /// Add `value` to `score` and spawn a popup at `anchor`. Returns the popup id.
    pub fn apply(&mut self, score: &mut i64, value: i32, anchor: Vec3, now: f32) -> u64 {
        *score += i64::from(value);

        self.next_id += 1;
        let id = self.next_id;
        self.popups.push(ScorePopup {
            id,
            position: anchor,
            value,
            created_at: now,
            age: 0.0,
        });
        id
    }

    /// Age popups and drop the fully faded ones
    pub fn advance(&mut self, dt: f32, lifetime: f32) {
        if dt.is_finite() && dt > 0.0 {
            for popup in &mut self.popups {
                popup.age += dt;
            }
        }
        self.popups.retain(|p| !p.is_expired(lifetime));
    }

    pub fn popups(&self) -> &[ScorePopup] {
        &self.popups
    }

    /// Drop all popups; ids keep increasing so they stay unique across sessions
    pub fn clear(&mut self) {
        self.popups.clear();
    }
}
