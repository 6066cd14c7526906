//! Collision response and cooldown gate
//!
//! The physics layer can report the same overlap many times per second. The gate turns that
//! stream into at most one penalty per cooldown window:
//!
//! ```text
//!   Armed --obstacle--> Cooldown --timer--> Armed
//!                          |
//!                          +--obstacle--> (ignored)
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, TrackLayout, Vehicle};
use super::timer::Timer;
use crate::tuning::Tuning;

/// What the physics layer says the car touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle,
    Coin,
    Other,
}

/// A collision/trigger report from the physics layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub entity_id: EntityId,
    pub kind: EntityKind,
}

impl CollisionEvent {
    pub fn obstacle(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            kind: EntityKind::Obstacle,
        }
    }

    pub fn coin(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            kind: EntityKind::Coin,
        }
    }
}

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateState {
    Armed,
    Cooldown,
}

/// Debounces obstacle hits
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionGate {
    cooldown: Timer,
}

impl CollisionGate {
    pub fn state(&self) -> GateState {
        if self.cooldown.is_armed() {
            GateState::Cooldown
        } else {
            GateState::Armed
        }
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown.is_armed()
    }

    /// Enter cooldown if armed. Returns false (and changes nothing) during cooldown.
    pub fn try_trigger(&mut self, duration: f32) -> bool {
        if self.cooldown.is_armed() {
            return false;
        }
        self.cooldown.arm(duration);
        true
    }

    /// Advance the cooldown. Returns true on the tick the gate re-arms.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.cooldown.advance(dt)
    }

    /// Cancel any pending cooldown
    pub fn reset(&mut self) {
        self.cooldown.cancel();
    }
}

/// What a collision report amounted to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// Unknown entity, not an obstacle, or suppressed by cooldown
    Ignored,
    /// Points deducted, car stopped
    Penalized {
        obstacle_id: EntityId,
        position: Vec3,
        penalty: i32,
    },
    /// Hard mode: the run is over
    Fatal { obstacle_id: EntityId },
}

/// Apply an obstacle report to the gate, the obstacle and the car.
///
/// Coin and other kinds are not handled here and come back as `Ignored`.
pub fn resolve(
    gate: &mut CollisionGate,
    event: CollisionEvent,
    track: &mut TrackLayout,
    vehicle: &mut Vehicle,
    tuning: &Tuning,
    fatal: bool,
) -> CollisionOutcome {
    if event.kind != EntityKind::Obstacle {
        return CollisionOutcome::Ignored;
    }
    let Some(obstacle) = track.obstacle_mut(event.entity_id) else {
        log::debug!("Ignoring collision with unknown obstacle {}", event.entity_id);
        return CollisionOutcome::Ignored;
    };
    if !gate.try_trigger(tuning.collision_cooldown) {
        return CollisionOutcome::Ignored;
    }

    obstacle.hit = true;
    vehicle.speed = 0.0;

    if fatal {
        return CollisionOutcome::Fatal {
            obstacle_id: event.entity_id,
        };
    }

    CollisionOutcome::Penalized {
        obstacle_id: event.entity_id,
        position: vehicle.position,
        penalty: tuning.collision_penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{LaneTable, Obstacle};
    use proptest::prelude::*;

    fn setup() -> (Tuning, TrackLayout, Vehicle) {
        let tuning = Tuning::default();
        let lanes = LaneTable::new(tuning.road_width);
        let track = TrackLayout {
            decorations: Vec::new(),
            obstacles: vec![
                Obstacle {
                    id: 1,
                    position: Vec3::new(0.0, 1.0, 10.0),
                    hit: false,
                },
                Obstacle {
                    id: 2,
                    position: Vec3::new(0.0, 1.0, 40.0),
                    hit: false,
                },
            ],
            coins: Vec::new(),
        };
        let mut vehicle = Vehicle::new(&lanes, &tuning);
        vehicle.speed = 50.0;
        (tuning, track, vehicle)
    }

    #[test]
    fn test_first_hit_penalizes_and_stops() {
        let (tuning, mut track, mut vehicle) = setup();
        let mut gate = CollisionGate::default();

        let outcome = resolve(&mut gate, CollisionEvent::obstacle(1), &mut track, &mut vehicle, &tuning, false);
        assert_eq!(
            outcome,
            CollisionOutcome::Penalized {
                obstacle_id: 1,
                position: vehicle.position,
                penalty: -20,
            }
        );
        assert_eq!(vehicle.speed, 0.0);
        assert!(track.obstacles[0].hit);
        assert_eq!(gate.state(), GateState::Cooldown);
    }

    #[test]
    fn test_cooldown_suppresses_repeats_then_rearms() {
        let (tuning, mut track, mut vehicle) = setup();
        let mut gate = CollisionGate::default();

        resolve(&mut gate, CollisionEvent::obstacle(1), &mut track, &mut vehicle, &tuning, false);
        vehicle.speed = 30.0;
        // Another obstacle during cooldown is ignored too
        let outcome = resolve(&mut gate, CollisionEvent::obstacle(2), &mut track, &mut vehicle, &tuning, false);
        assert_eq!(outcome, CollisionOutcome::Ignored);
        assert_eq!(vehicle.speed, 30.0);
        assert!(!track.obstacles[1].hit);

        assert!(!gate.advance(0.5));
        assert!(gate.advance(0.6));
        assert_eq!(gate.state(), GateState::Armed);

        let outcome = resolve(&mut gate, CollisionEvent::obstacle(2), &mut track, &mut vehicle, &tuning, false);
        assert!(matches!(outcome, CollisionOutcome::Penalized { obstacle_id: 2, .. }));
    }

    #[test]
    fn test_unknown_and_non_obstacle_ignored() {
        let (tuning, mut track, mut vehicle) = setup();
        let mut gate = CollisionGate::default();

        let unknown = resolve(&mut gate, CollisionEvent::obstacle(77), &mut track, &mut vehicle, &tuning, false);
        assert_eq!(unknown, CollisionOutcome::Ignored);

        let other = CollisionEvent {
            entity_id: 1,
            kind: EntityKind::Other,
        };
        assert_eq!(
            resolve(&mut gate, other, &mut track, &mut vehicle, &tuning, false),
            CollisionOutcome::Ignored
        );
        // Neither consumed the gate
        assert_eq!(gate.state(), GateState::Armed);
        assert_eq!(vehicle.speed, 50.0);
    }

    #[test]
    fn test_hard_mode_is_fatal() {
        let (tuning, mut track, mut vehicle) = setup();
        let mut gate = CollisionGate::default();
        let outcome = resolve(&mut gate, CollisionEvent::obstacle(2), &mut track, &mut vehicle, &tuning, true);
        assert_eq!(outcome, CollisionOutcome::Fatal { obstacle_id: 2 });
        assert_eq!(vehicle.speed, 0.0);
    }

    #[test]
    fn test_reset_cancels_cooldown() {
        let mut gate = CollisionGate::default();
        assert!(gate.try_trigger(1.0));
        gate.reset();
        assert_eq!(gate.state(), GateState::Armed);
        // A cancelled cooldown never reports re-arming
        assert!(!gate.advance(5.0));
    }

    proptest! {
        /// Hits spaced closer than the cooldown never yield more than one penalty per window
        #[test]
        fn prop_at_most_one_penalty_per_window(gaps in proptest::collection::vec(0.0f32..0.3, 1..60)) {
            let (tuning, mut track, mut vehicle) = setup();
            let mut gate = CollisionGate::default();
            let mut penalty_times = Vec::new();
            let mut now = 0.0f32;

            for gap in gaps {
                gate.advance(gap);
                now += gap;
                let outcome = resolve(&mut gate, CollisionEvent::obstacle(1), &mut track, &mut vehicle, &tuning, false);
                if let CollisionOutcome::Penalized { penalty, .. } = outcome {
                    prop_assert_eq!(penalty, tuning.collision_penalty);
                    penalty_times.push(now);
                }
            }

            prop_assert!(!penalty_times.is_empty());
            for pair in penalty_times.windows(2) {
                prop_assert!(pair[1] - pair[0] >= tuning.collision_cooldown - 1e-3);
            }
        }
    }
}
