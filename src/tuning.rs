//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`], which is built once and handed to the
//! simulation at construction. Values can be overridden from JSON; missing fields keep
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::rate_from_frame_factor;

/// Immutable gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Vehicle ===
    /// Forward top speed (units/s)
    pub max_speed: f32,
    /// Reverse top speed as a fraction of `max_speed`
    pub reverse_speed_factor: f32,
    /// Exponential response of speed toward its target (1/s)
    pub speed_response: f32,
    /// Exponential response of lateral position toward the lane offset (1/s)
    pub lane_response: f32,
    /// Resting height of the car above the road
    pub car_height: f32,

    // === Boost ===
    /// Multiplier on target speed and lane response while boosting
    pub boost_multiplier: f32,
    /// How long a boost lasts (s)
    pub boost_duration: f32,
    /// Delay after a boost ends before another can start (s, 0 = immediately ready)
    pub boost_recharge: f32,

    // === Camera ===
    /// Distance the camera trails behind the car
    pub camera_distance: f32,
    /// Camera height above the road
    pub camera_height: f32,
    /// Response of the camera position toward its desired pose (1/s)
    pub camera_position_response: f32,
    /// Response of the camera look-at target toward the car (1/s)
    pub camera_target_response: f32,

    // === Scoring ===
    /// Points for a coin
    pub coin_value: i32,
    /// Points for hitting an obstacle (negative)
    pub collision_penalty: i32,
    /// Window after a hit during which further hits are ignored (s)
    pub collision_cooldown: f32,
    /// Planar distance under which a coin is collected
    pub pickup_radius: f32,

    // === Session ===
    /// Countdown length (s)
    pub game_duration: u32,
    /// Regenerate obstacles and coins when retrying
    pub regenerate_track_on_retry: bool,

    // === Track ===
    /// Road length; entities are placed in [-L/2, L/2)
    pub road_length: f32,
    /// Road width; lanes split it in thirds
    pub road_width: f32,
    /// Spacing between roadside decorations
    pub decoration_spacing: f32,
    /// Distance of decorations beyond the road edge
    pub decoration_margin: f32,
    pub obstacle_count: usize,
    pub coin_count: usize,
    /// Height of obstacle centers
    pub obstacle_height: f32,
    /// Height of coin centers
    pub coin_height: f32,

    // === Popups ===
    /// Time for a popup to fade out completely (s)
    pub popup_lifetime: f32,
    /// Upward drift of popups (units/s)
    pub popup_rise_speed: f32,
    /// Height above a coin where its popup spawns
    pub coin_popup_offset: f32,

    /// Largest frame delta integrated in one tick (s)
    pub max_frame_dt: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_speed: 60.0,
            reverse_speed_factor: 0.5,
            // 10% per 60 Hz frame
            speed_response: rate_from_frame_factor(0.1),
            // 20% per 60 Hz frame
            lane_response: rate_from_frame_factor(0.2),
            car_height: 0.5,

            boost_multiplier: 2.0,
            boost_duration: 3.0,
            boost_recharge: 0.0,

            camera_distance: 15.0,
            camera_height: 8.0,
            camera_position_response: rate_from_frame_factor(0.1),
            camera_target_response: rate_from_frame_factor(0.1),

            coin_value: 5,
            collision_penalty: -20,
            collision_cooldown: 1.0,
            pickup_radius: 2.0,

            game_duration: 60,
            regenerate_track_on_retry: false,

            road_length: 10_000.0,
            road_width: 20.0,
            decoration_spacing: 30.0,
            decoration_margin: 5.0,
            obstacle_count: 50,
            coin_count: 100,
            obstacle_height: 1.0,
            coin_height: 1.0,

            // opacity -0.05 every 50 ms, rising 0.1 per step
            popup_lifetime: 1.0,
            popup_rise_speed: 2.0,
            coin_popup_offset: 2.0,

            max_frame_dt: 0.1,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse tuning overrides, falling back to defaults on bad input
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Invalid tuning JSON ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Reverse top speed (units/s, positive)
    pub fn reverse_speed(&self) -> f32 {
        self.max_speed * self.reverse_speed_factor
    }
}
