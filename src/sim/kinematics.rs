//! Vehicle kinematics, boost and the follow camera
//!
//! All easing is exponential and Δt-scaled through [`crate::ease_factor`], so the car
//! behaves the same at 30, 60 or 144 Hz.

use glam::Vec3;
use serde::Serialize;

use super::state::{LaneTable, Vehicle};
use super::timer::Timer;
use crate::consts::LANE_COUNT;
use crate::ease_factor;
use crate::tuning::Tuning;

/// Held (level-triggered) driving controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub forward: bool,
    pub backward: bool,
}

/// Lateral lane-change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneShift {
    Left,
    Right,
}

/// Move the target lane one step; no-op at the edge lanes. Returns true if the lane changed.
pub fn change_lane(vehicle: &mut Vehicle, shift: LaneShift) -> bool {
    let lane = match shift {
        LaneShift::Left => vehicle.lane.checked_sub(1),
        LaneShift::Right => Some(vehicle.lane + 1).filter(|&l| l < LANE_COUNT),
    };
    match lane {
        Some(lane) => {
            vehicle.lane = lane;
            true
        }
        None => false,
    }
}

/// Boost readiness as shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BoostState {
    Ready,
    Active { remaining: f32 },
    Charging { remaining: f32 },
}

/// Single-shot boost with an optional recharge delay
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Boost {
    active: Timer,
    recharge: Timer,
}

impl Boost {
    /// Start (or restart) a boost. Returns false while recharging.
    pub fn trigger(&mut self, tuning: &Tuning) -> bool {
        if self.recharge.is_armed() {
            return false;
        }
        self.active.arm(tuning.boost_duration);
        true
    }

    /// Advance timers. Returns true on the tick the boost runs out.
    pub fn advance(&mut self, dt: f32, tuning: &Tuning) -> bool {
        self.recharge.advance(dt);
        if self.active.advance(dt) {
            if tuning.boost_recharge > 0.0 {
                self.recharge.arm(tuning.boost_recharge);
            }
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.active.is_armed()
    }

    pub fn state(&self) -> BoostState {
        if self.active.is_armed() {
            BoostState::Active {
                remaining: self.active.remaining(),
            }
        } else if self.recharge.is_armed() {
            BoostState::Charging {
                remaining: self.recharge.remaining(),
            }
        } else {
            BoostState::Ready
        }
    }

    /// Drop any running boost or recharge
    pub fn cancel(&mut self) {
        self.active.cancel();
        self.recharge.cancel();
    }
}

/// Speed the car is easing toward for the held controls
pub fn target_speed(controls: Controls, boosting: bool, tuning: &Tuning) -> f32 {
    if controls.forward {
        let boost = if boosting { tuning.boost_multiplier } else { 1.0 };
        tuning.max_speed * boost
    } else if controls.backward {
        -tuning.reverse_speed()
    } else {
        0.0
    }
}

/// Integrate one tick of vehicle motion. `dt` must be positive and finite.
pub fn step(
    vehicle: &mut Vehicle,
    controls: Controls,
    boost: &Boost,
    lanes: &LaneTable,
    tuning: &Tuning,
    dt: f32,
) {
    let boosting = boost.is_active();

    let target = target_speed(controls, boosting, tuning);
    vehicle.speed += (target - vehicle.speed) * ease_factor(tuning.speed_response, dt);

    let lane_rate = if boosting {
        tuning.lane_response * tuning.boost_multiplier
    } else {
        tuning.lane_response
    };
    let target_x = lanes.offset(vehicle.lane);
    vehicle.position.x += (target_x - vehicle.position.x) * ease_factor(lane_rate, dt);

    vehicle.position.z += vehicle.speed * dt;
}

/// Camera pose that trails the car
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraRig {
    pub position: Vec3,
    /// Look-at point
    pub target: Vec3,
}

impl CameraRig {
    /// Camera snapped to its desired pose behind the car
    pub fn behind(vehicle: &Vehicle, tuning: &Tuning) -> Self {
        Self {
            position: Self::desired_position(vehicle, tuning),
            target: Self::desired_target(vehicle),
        }
    }

    pub fn desired_position(vehicle: &Vehicle, tuning: &Tuning) -> Vec3 {
        Vec3::new(
            vehicle.position.x,
            tuning.camera_height,
            vehicle.position.z - tuning.camera_distance,
        )
    }

    pub fn desired_target(vehicle: &Vehicle) -> Vec3 {
        Vec3::new(vehicle.position.x, 0.0, vehicle.position.z)
    }

    /// Ease position and look-at target toward the desired pose independently
    pub fn follow(&mut self, vehicle: &Vehicle, tuning: &Tuning, dt: f32) {
        let desired = Self::desired_position(vehicle, tuning);
        self.position = self
            .position
            .lerp(desired, ease_factor(tuning.camera_position_response, dt));

        let desired_target = Self::desired_target(vehicle);
        self.target = self
            .target
            .lerp(desired_target, ease_factor(tuning.camera_target_response, dt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT;
    use proptest::prelude::*;

    fn setup() -> (Tuning, LaneTable, Vehicle) {
        let tuning = Tuning::default();
        let lanes = LaneTable::new(tuning.road_width);
        let vehicle = Vehicle::new(&lanes, &tuning);
        (tuning, lanes, vehicle)
    }

    #[test]
    fn test_speed_eases_toward_max() {
        let (tuning, lanes, mut vehicle) = setup();
        let controls = Controls {
            forward: true,
            backward: false,
        };
        let boost = Boost::default();

        step(&mut vehicle, controls, &boost, &lanes, &tuning, FRAME_DT);
        // First frame covers ~10% of the gap, never the whole thing
        assert!(vehicle.speed > 0.0 && vehicle.speed < tuning.max_speed * 0.2);

        for _ in 0..600 {
            step(&mut vehicle, controls, &boost, &lanes, &tuning, FRAME_DT);
        }
        assert!((vehicle.speed - tuning.max_speed).abs() < 0.01);
        assert!(vehicle.position.z > 0.0);
    }

    #[test]
    fn test_reverse_capped_at_half() {
        let (tuning, lanes, mut vehicle) = setup();
        let controls = Controls {
            forward: false,
            backward: true,
        };
        for _ in 0..600 {
            step(&mut vehicle, controls, &Boost::default(), &lanes, &tuning, FRAME_DT);
        }
        assert!((vehicle.speed + tuning.max_speed / 2.0).abs() < 0.01);
        assert!(vehicle.position.z < 0.0);
    }

    #[test]
    fn test_coasting_decays_to_zero() {
        let (tuning, lanes, mut vehicle) = setup();
        vehicle.speed = 40.0;
        for _ in 0..600 {
            step(&mut vehicle, Controls::default(), &Boost::default(), &lanes, &tuning, FRAME_DT);
        }
        assert!(vehicle.speed.abs() < 0.01);
    }

    #[test]
    fn test_frame_rate_independence() {
        let (tuning, lanes, mut a) = setup();
        let mut b = a.clone();
        let controls = Controls {
            forward: true,
            backward: false,
        };
        a.lane = 2;
        b.lane = 2;
        let boost = Boost::default();

        for _ in 0..60 {
            step(&mut a, controls, &boost, &lanes, &tuning, 1.0 / 60.0);
        }
        for _ in 0..240 {
            step(&mut b, controls, &boost, &lanes, &tuning, 1.0 / 240.0);
        }
        assert!((a.speed - b.speed).abs() < 0.01);
        assert!((a.position.x - b.position.x).abs() < 0.01);
        // Explicit Euler on z differs slightly between step sizes
        assert!((a.position.z - b.position.z).abs() < 1.0);
    }

    #[test]
    fn test_lane_change_slides_smoothly() {
        let (tuning, lanes, mut vehicle) = setup();
        assert!(change_lane(&mut vehicle, LaneShift::Right));
        assert_eq!(vehicle.lane, 2);

        step(&mut vehicle, Controls::default(), &Boost::default(), &lanes, &tuning, FRAME_DT);
        let target = lanes.offset(2);
        assert!(vehicle.position.x > 0.0 && vehicle.position.x < target);

        for _ in 0..300 {
            step(&mut vehicle, Controls::default(), &Boost::default(), &lanes, &tuning, FRAME_DT);
        }
        assert!((vehicle.position.x - target).abs() < 0.01);
    }

    #[test]
    fn test_boost_doubles_target_and_expires() {
        let tuning = Tuning::default();
        let mut boost = Boost::default();
        let controls = Controls {
            forward: true,
            backward: false,
        };
        assert_eq!(target_speed(controls, false, &tuning), 60.0);

        assert!(boost.trigger(&tuning));
        assert!(boost.is_active());
        assert_eq!(target_speed(controls, boost.is_active(), &tuning), 120.0);

        assert!(!boost.advance(2.9, &tuning));
        assert!(boost.advance(0.2, &tuning));
        assert!(!boost.is_active());
        assert_eq!(boost.state(), BoostState::Ready);
    }

    #[test]
    fn test_boost_does_not_boost_reverse() {
        let tuning = Tuning::default();
        let controls = Controls {
            forward: false,
            backward: true,
        };
        assert_eq!(target_speed(controls, true, &tuning), -30.0);
    }

    #[test]
    fn test_boost_recharge() {
        let tuning = Tuning {
            boost_recharge: 2.0,
            ..Tuning::default()
        };
        let mut boost = Boost::default();
        assert!(boost.trigger(&tuning));
        assert!(boost.advance(3.0, &tuning));
        assert!(matches!(boost.state(), BoostState::Charging { .. }));
        assert!(!boost.trigger(&tuning));

        boost.advance(2.0, &tuning);
        assert_eq!(boost.state(), BoostState::Ready);
        assert!(boost.trigger(&tuning));
    }

    #[test]
    fn test_camera_lags_behind() {
        let (tuning, lanes, mut vehicle) = setup();
        let mut camera = CameraRig::behind(&vehicle, &tuning);
        assert_eq!(camera.position, Vec3::new(0.0, 8.0, -15.0));

        change_lane(&mut vehicle, LaneShift::Left);
        for _ in 0..5 {
            step(&mut vehicle, Controls::default(), &Boost::default(), &lanes, &tuning, FRAME_DT);
            camera.follow(&vehicle, &tuning, FRAME_DT);
        }
        // Car moved left; camera follows but trails it (slower response)
        assert!(vehicle.position.x < 0.0);
        assert!(camera.position.x < 0.0);
        assert!(camera.position.x > vehicle.position.x);
        assert_eq!(camera.position.y, 8.0);
    }

    proptest! {
        #[test]
        fn prop_lane_always_in_range(shifts in proptest::collection::vec(any::<bool>(), 0..50)) {
            let (_, _, mut vehicle) = setup();
            for right in shifts {
                let before = vehicle.lane;
                let shift = if right { LaneShift::Right } else { LaneShift::Left };
                let changed = change_lane(&mut vehicle, shift);
                prop_assert!(vehicle.lane < LANE_COUNT);
                if before == 0 && !right {
                    prop_assert!(!changed);
                    prop_assert_eq!(vehicle.lane, 0);
                }
                if before == LANE_COUNT - 1 && right {
                    prop_assert!(!changed);
                    prop_assert_eq!(vehicle.lane, LANE_COUNT - 1);
                }
            }
        }
    }
}
