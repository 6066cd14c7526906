//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (track layout)
//! - All mutation on the tick boundary, driven by queued commands
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod command;
pub mod kinematics;
pub mod pickup;
pub mod score;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod timer;
pub mod track;

pub use clock::{ClockTick, GameClock, SecondTicker};
pub use collision::{CollisionEvent, CollisionGate, CollisionOutcome, EntityKind, GateState};
pub use command::{Command, CommandQueue, CommandSender, IntentEvent, Stamped};
pub use kinematics::{Boost, BoostState, CameraRig, Controls, LaneShift};
pub use snapshot::{PopupView, Snapshot};
pub use state::{
    Coin, Decoration, EntityId, GameEvent, GameOverReason, GamePhase, GameState, LaneTable,
    Obstacle, ScorePopup, SessionStats, TrackLayout, Vehicle,
};
pub use tick::Simulation;
pub use timer::Timer;
