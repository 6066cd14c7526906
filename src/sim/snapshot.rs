//! Read-only view of a tick's result for renderers and HUDs

use glam::Vec3;
use serde::Serialize;

use super::kinematics::{BoostState, CameraRig, Controls};
use super::state::{Coin, Decoration, GamePhase, GameState, Obstacle, SessionStats, Vehicle};
use crate::consts::LANE_COUNT;

/// A popup resolved for drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopupView {
    pub id: u64,
    /// Spawn position plus upward drift
    pub position: Vec3,
    pub value: i32,
    /// 1 at spawn, 0 when gone
    pub opacity: f32,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub score: i64,
    pub time_remaining: u32,
    pub vehicle: &'a Vehicle,
    pub controls: Controls,
    pub boost: BoostState,
    pub camera: CameraRig,
    pub lane_offsets: [f32; LANE_COUNT],
    pub cooldown_active: bool,
    pub decorations: &'a [Decoration],
    pub obstacles: &'a [Obstacle],
    /// Tombstoned coins included; draw only `!collected`
    pub coins: &'a [Coin],
    pub popups: Vec<PopupView>,
    pub stats: SessionStats,
    pub high_scores: &'a [i64],
    /// Leaderboard rank the current score would take if the run ended now
    pub projected_rank: Option<usize>,
}

impl<'a> Snapshot<'a> {
    pub fn of(state: &'a GameState) -> Self {
        let tuning = &state.tuning;
        let popups = state
            .feed
            .popups()
            .iter()
            .map(|p| PopupView {
                id: p.id,
                position: p.display_position(tuning.popup_rise_speed),
                value: p.value,
                opacity: p.opacity(tuning.popup_lifetime),
            })
            .collect();

        Self {
            phase: state.phase(),
            score: state.score,
            time_remaining: state.clock.remaining(),
            vehicle: &state.vehicle,
            controls: state.controls,
            boost: state.boost.state(),
            camera: state.camera,
            lane_offsets: *state.lanes.offsets(),
            cooldown_active: state.gate.is_cooling_down(),
            decorations: &state.track.decorations,
            obstacles: &state.track.obstacles,
            coins: &state.track.coins,
            popups,
            stats: state.stats,
            high_scores: state.high_scores.scores(),
            projected_rank: match state.phase() {
                GamePhase::Running => state.high_scores.potential_rank(state.score),
                GamePhase::GameOver => None,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::settings::Difficulty;
    use crate::tuning::Tuning;

    #[test]
    fn test_snapshot_mirrors_state() {
        let mut state = GameState::new(Tuning::default(), Difficulty::Normal, 9, HighScores::from_scores([40, 10]));
        let mut score = 0;
        state.feed.apply(&mut score, 5, Vec3::new(0.0, 3.0, 4.0), 0.0);
        state.feed.advance(0.5, 1.0);
        state.score = score;

        let snap = Snapshot::of(&state);
        assert_eq!(snap.phase, GamePhase::Running);
        assert_eq!(snap.score, 5);
        assert_eq!(snap.time_remaining, 60);
        assert_eq!(snap.boost, BoostState::Ready);
        assert_eq!(snap.coins.len(), 100);
        assert_eq!(snap.high_scores, &[40, 10]);
        // 5 sits between 40 and 10 on a board with room to spare
        assert_eq!(snap.projected_rank, Some(2));
        assert_eq!(snap.popups.len(), 1);
        assert!((snap.popups[0].opacity - 0.5).abs() < 1e-6);
        assert!((snap.popups[0].position.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_projected_rank_only_while_running() {
        let board = HighScores::from_scores([50, 40, 30, 20, 10]);
        let mut state = GameState::new(Tuning::default(), Difficulty::Normal, 9, board);
        assert_eq!(Snapshot::of(&state).projected_rank, None);

        state.score = 35;
        assert_eq!(Snapshot::of(&state).projected_rank, Some(3));

        state.clock.end();
        assert_eq!(Snapshot::of(&state).projected_rank, None);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameState::new(Tuning::default(), Difficulty::Normal, 9, HighScores::new());
        let json = Snapshot::of(&state).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["phase"], "Running");
        assert_eq!(value["time_remaining"], 60);
        assert_eq!(value["boost"], "Ready");
        assert_eq!(value["lane_offsets"].as_array().unwrap().len(), 3);
    }
}
