//! Game state and core simulation types

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::clock::GameClock;
use super::collision::CollisionGate;
use super::kinematics::{Boost, CameraRig, Controls};
use super::score::ScoreFeed;
use super::track;
use crate::consts::*;
use crate::highscores::HighScores;
use crate::settings::Difficulty;
use crate::tuning::Tuning;

/// Identifier shared by obstacles and coins (unique within a layout)
pub type EntityId = u32;

/// Coarse lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// Countdown running, gameplay live
    Running,
    /// Run ended; only retry is accepted
    GameOver,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameOverReason {
    /// Countdown reached zero
    TimeUp,
    /// Obstacle hit in hard mode
    Crashed,
}

/// Lateral offsets of the lanes, left to right
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneTable {
    offsets: [f32; LANE_COUNT],
}

impl LaneTable {
    /// Split the road into equal lanes centered on x = 0
    pub fn new(road_width: f32) -> Self {
        let lane_width = road_width / LANE_COUNT as f32;
        let center = (LANE_COUNT as f32 - 1.0) / 2.0;
        let mut offsets = [0.0; LANE_COUNT];
        for (i, offset) in offsets.iter_mut().enumerate() {
            *offset = (i as f32 - center) * lane_width;
        }
        Self { offsets }
    }

    /// Lateral offset of a lane (out-of-range lanes clamp to the nearest edge lane)
    #[inline]
    pub fn offset(&self, lane: usize) -> f32 {
        self.offsets[lane.min(LANE_COUNT - 1)]
    }

    pub fn offsets(&self) -> &[f32; LANE_COUNT] {
        &self.offsets
    }
}

/// The player's car
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub position: Vec3,
    /// Target lane index in [0, LANE_COUNT)
    pub lane: usize,
    /// Longitudinal speed (units/s, +z is forward)
    pub speed: f32,
}

impl Vehicle {
    /// Car parked in the start lane at z = 0
    pub fn new(lanes: &LaneTable, tuning: &Tuning) -> Self {
        Self {
            position: Vec3::new(lanes.offset(START_LANE), tuning.car_height, 0.0),
            lane: START_LANE,
            speed: 0.0,
        }
    }
}

/// Roadside scenery, no gameplay effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decoration {
    pub position: Vec3,
}

/// A static obstacle; reported hits are penalized, the obstacle stays on the road
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub position: Vec3,
    /// Has this obstacle cost the player points this session
    pub hit: bool,
}

/// A collectible coin (tombstoned when collected)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coin {
    pub id: EntityId,
    pub position: Vec3,
    pub collected: bool,
}

impl Coin {
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.collected
    }
}

/// Everything placed along the road for a session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackLayout {
    pub decorations: Vec<Decoration>,
    /// Sorted by id
    pub obstacles: Vec<Obstacle>,
    /// Sorted by id
    pub coins: Vec<Coin>,
}

impl TrackLayout {
    pub fn obstacle(&self, id: EntityId) -> Option<&Obstacle> {
        self.obstacles
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|i| &self.obstacles[i])
    }

    pub fn obstacle_mut(&mut self, id: EntityId) -> Option<&mut Obstacle> {
        self.obstacles
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|i| &mut self.obstacles[i])
    }

    pub fn coin_mut(&mut self, id: EntityId) -> Option<&mut Coin> {
        self.coins
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &mut self.coins[i])
    }

    /// Coins still on the road
    pub fn live_coins(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter().filter(|c| c.is_live())
    }

    /// Restore every coin and clear obstacle hits, keeping positions
    pub fn restore(&mut self) {
        for coin in &mut self.coins {
            coin.collected = false;
        }
        for obstacle in &mut self.obstacles {
            obstacle.hit = false;
        }
    }
}

/// A floating score marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePopup {
    /// Unique for the lifetime of the simulation
    pub id: u64,
    /// Spawn position
    pub position: Vec3,
    pub value: i32,
    /// Session time at creation (s)
    pub created_at: f32,
    /// Seconds since creation
    pub age: f32,
}

impl ScorePopup {
    /// Linear fade from 1 to 0 over `lifetime`
    pub fn opacity(&self, lifetime: f32) -> f32 {
        if lifetime <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age / lifetime).clamp(0.0, 1.0)
    }

    pub fn is_expired(&self, lifetime: f32) -> bool {
        self.age >= lifetime
    }

    /// Where to draw the popup after drifting upward
    pub fn display_position(&self, rise_speed: f32) -> Vec3 {
        self.position + Vec3::Y * (self.age * rise_speed)
    }
}

/// Per-session counters for the game-over panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub coins_collected: u32,
    pub obstacles_hit: u32,
}

/// Something the host may want to react to (sounds, HUD flashes, saving)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    CoinCollected {
        coin_id: EntityId,
        position: Vec3,
        value: i32,
    },
    ObstacleHit {
        obstacle_id: EntityId,
        position: Vec3,
        penalty: i32,
    },
    CooldownEnded,
    BoostStarted,
    BoostEnded,
    /// One countdown second elapsed
    TimeTick { remaining: u32 },
    /// Session finished; the ledger has already been updated
    GameOver {
        final_score: i64,
        reason: GameOverReason,
        /// Rank on the leaderboard (1-indexed) if the score made it
        rank: Option<usize>,
    },
    /// A new session began after a retry
    SessionStarted { epoch: u32 },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for the track layout
    pub seed: u64,
    /// RNG used for track generation
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub difficulty: Difficulty,
    pub lanes: LaneTable,
    pub track: TrackLayout,
    pub vehicle: Vehicle,
    pub controls: Controls,
    pub boost: Boost,
    pub camera: CameraRig,
    pub clock: GameClock,
    pub gate: CollisionGate,
    /// Score (no floor)
    pub score: i64,
    pub feed: ScoreFeed,
    pub stats: SessionStats,
    /// Simulation seconds since the session started
    pub elapsed: f32,
    /// Leaderboard, updated on every Running → GameOver transition
    pub high_scores: HighScores,
}

impl GameState {
    /// Create a new session with a freshly generated track
    pub fn new(tuning: Tuning, difficulty: Difficulty, seed: u64, high_scores: HighScores) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let lanes = LaneTable::new(tuning.road_width);
        let track = track::generate_layout(&tuning, &lanes, &mut rng);
        let vehicle = Vehicle::new(&lanes, &tuning);
        let camera = CameraRig::behind(&vehicle, &tuning);
        let clock = GameClock::new(tuning.game_duration);

        Self {
            seed,
            rng,
            tuning,
            difficulty,
            lanes,
            track,
            vehicle,
            controls: Controls::default(),
            boost: Boost::default(),
            camera,
            clock,
            gate: CollisionGate::default(),
            score: 0,
            feed: ScoreFeed::default(),
            stats: SessionStats::default(),
            elapsed: 0.0,
            high_scores,
        }
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.clock.phase()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase() == GamePhase::Running
    }

    /// Reinitialize everything session-scoped. Held controls and the leaderboard survive;
    /// the layout is kept (coins restored) unless the tuning asks for a fresh one.
    pub fn reset_session(&mut self) {
        if self.tuning.regenerate_track_on_retry {
            self.track = track::generate_layout(&self.tuning, &self.lanes, &mut self.rng);
        } else {
            self.track.restore();
        }
        self.vehicle = Vehicle::new(&self.lanes, &self.tuning);
        self.camera = CameraRig::behind(&self.vehicle, &self.tuning);
        self.boost.cancel();
        self.gate.reset();
        self.clock.reset();
        self.score = 0;
        self.feed.clear();
        self.stats = SessionStats::default();
        self.elapsed = 0.0;
    }
}
