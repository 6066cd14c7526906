//! Coin pickup resolution
//!
//! The proximity scan only reads the coin list; tombstones are applied in a second pass.
//! Collection goes through [`collect_coin`], which emits at most once per coin, so overlapping
//! proximity hits and physics trigger reports cannot double count.

use glam::Vec3;

use super::state::{Coin, EntityId, TrackLayout};
use crate::planar_distance;

/// A coin was picked up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupEvent {
    pub coin_id: EntityId,
    pub position: Vec3,
    pub value: i32,
}

/// Ids of live coins within `radius` of `position` on the ground plane
pub fn coins_in_reach(coins: &[Coin], position: Vec3, radius: f32) -> Vec<EntityId> {
    coins
        .iter()
        .filter(|c| c.is_live() && planar_distance(c.position, position) < radius)
        .map(|c| c.id)
        .collect()
}

/// Tombstone a coin. Returns the event only the first time; unknown ids yield nothing.
pub fn collect_coin(track: &mut TrackLayout, coin_id: EntityId, value: i32) -> Option<PickupEvent> {
    let Some(coin) = track.coin_mut(coin_id) else {
        log::debug!("Ignoring pickup for unknown coin {coin_id}");
        return None;
    };
    if coin.collected {
        return None;
    }
    coin.collected = true;
    Some(PickupEvent {
        coin_id,
        position: coin.position,
        value,
    })
}

/// Collect every coin in reach of the car this tick
pub fn resolve(track: &mut TrackLayout, position: Vec3, radius: f32, value: i32) -> Vec<PickupEvent> {
    let in_reach = coins_in_reach(&track.coins, position, radius);
    in_reach
        .into_iter()
        .filter_map(|id| collect_coin(track, id, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with_coins(positions: &[Vec3]) -> TrackLayout {
        TrackLayout {
            decorations: Vec::new(),
            obstacles: Vec::new(),
            coins: positions
                .iter()
                .enumerate()
                .map(|(i, &position)| Coin {
                    id: i as EntityId + 1,
                    position,
                    collected: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_collects_within_radius_only() {
        let mut track = track_with_coins(&[
            Vec3::new(0.0, 1.0, 1.5),
            Vec3::new(0.0, 1.0, 2.5),
            Vec3::new(6.6, 1.0, 0.0),
        ]);
        let events = resolve(&mut track, Vec3::new(0.0, 0.5, 0.0), 2.0, 5);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].coin_id, 1);
        assert_eq!(events[0].value, 5);
        assert!(!track.coins[0].is_live());
        assert!(track.coins[1].is_live());
        assert!(track.coins[2].is_live());
    }

    #[test]
    fn test_height_is_ignored() {
        let mut track = track_with_coins(&[Vec3::new(0.0, 50.0, 0.0)]);
        assert_eq!(resolve(&mut track, Vec3::ZERO, 2.0, 5).len(), 1);
    }

    #[test]
    fn test_same_coin_never_twice() {
        let mut track = track_with_coins(&[Vec3::new(0.0, 1.0, 0.5)]);
        let car = Vec3::new(0.0, 0.5, 0.0);

        assert_eq!(resolve(&mut track, car, 2.0, 5).len(), 1);
        assert!(resolve(&mut track, car, 2.0, 5).is_empty());
        assert!(collect_coin(&mut track, 1, 5).is_none());
    }

    #[test]
    fn test_trigger_then_proximity_counts_once() {
        let mut track = track_with_coins(&[Vec3::new(0.0, 1.0, 0.5)]);
        assert!(collect_coin(&mut track, 1, 5).is_some());
        assert!(resolve(&mut track, Vec3::ZERO, 2.0, 5).is_empty());
    }

    #[test]
    fn test_unknown_coin_ignored() {
        let mut track = track_with_coins(&[Vec3::ZERO]);
        assert!(collect_coin(&mut track, 999, 5).is_none());
        assert!(track.coins[0].is_live());
    }

    #[test]
    fn test_multiple_coins_same_tick() {
        let mut track = track_with_coins(&[Vec3::new(0.0, 1.0, 0.5), Vec3::new(0.5, 1.0, -0.5)]);
        let events = resolve(&mut track, Vec3::ZERO, 2.0, 5);
        let ids: Vec<_> = events.iter().map(|e| e.coin_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(track.live_coins().count(), 0);
    }
}
