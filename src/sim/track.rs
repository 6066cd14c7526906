//! Track layout generation
//!
//! Decorations line both road edges at fixed spacing. Obstacles and coins get a uniformly
//! random lane and a uniformly random z in [-L/2, L/2). There is no spacing or overlap
//! avoidance: clusters and coins sitting on obstacles can happen.

use glam::Vec3;
use rand::Rng;

use super::state::{Coin, Decoration, EntityId, LaneTable, Obstacle, TrackLayout};
use crate::consts::LANE_COUNT;
use crate::tuning::Tuning;

/// Build a full layout. Ids are unique across obstacles and coins, starting at 1.
pub fn generate_layout<R: Rng>(tuning: &Tuning, lanes: &LaneTable, rng: &mut R) -> TrackLayout {
    let decorations = generate_decorations(tuning);

    let mut next_id: EntityId = 1;
    let mut obstacles = Vec::with_capacity(tuning.obstacle_count);
    for _ in 0..tuning.obstacle_count {
        let (x, z) = random_lane_spot(tuning.road_length, lanes, rng);
        obstacles.push(Obstacle {
            id: next_id,
            position: Vec3::new(x, tuning.obstacle_height, z),
            hit: false,
        });
        next_id += 1;
    }

    let mut coins = Vec::with_capacity(tuning.coin_count);
    for _ in 0..tuning.coin_count {
        let (x, z) = random_lane_spot(tuning.road_length, lanes, rng);
        coins.push(Coin {
            id: next_id,
            position: Vec3::new(x, tuning.coin_height, z),
            collected: false,
        });
        next_id += 1;
    }

    log::info!(
        "Track generated: {} decorations, {} obstacles, {} coins",
        decorations.len(),
        obstacles.len(),
        coins.len()
    );

    TrackLayout {
        decorations,
        obstacles,
        coins,
    }
}

/// Decorations on both edges every `decoration_spacing` units
fn generate_decorations(tuning: &Tuning) -> Vec<Decoration> {
    if tuning.decoration_spacing <= 0.0 || tuning.road_length <= 0.0 {
        return Vec::new();
    }

    let half = tuning.road_length / 2.0;
    let edge = tuning.road_width / 2.0 + tuning.decoration_margin;
    let rows = (tuning.road_length / tuning.decoration_spacing).ceil() as usize;

    let mut decorations = Vec::with_capacity(rows * 2);
    for i in 0..rows {
        let z = -half + i as f32 * tuning.decoration_spacing;
        if z >= half {
            break;
        }
        decorations.push(Decoration {
            position: Vec3::new(-edge, 0.0, z),
        });
        decorations.push(Decoration {
            position: Vec3::new(edge, 0.0, z),
        });
    }
    decorations
}

fn random_lane_spot<R: Rng>(road_length: f32, lanes: &LaneTable, rng: &mut R) -> (f32, f32) {
    let lane = rng.random_range(0..LANE_COUNT);
    let half = road_length / 2.0;
    let z = if half > 0.0 {
        rng.random_range(-half..half)
    } else {
        0.0
    };
    (lanes.offset(lane), z)
}
