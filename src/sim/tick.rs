//! Per-frame simulation tick
//!
//! Order within a tick:
//! 1. Drain queued commands (intent edges, collisions, clock seconds, retry)
//! 2. Advance boost and cooldown timers (full frame time)
//! 3. Integrate vehicle and camera (frame time clamped)
//! 4. Re-apply any collision stop, then resolve coin pickups
//! 5. Age popups

use super::clock::ClockTick;
use super::collision::{self, CollisionEvent, CollisionOutcome, EntityKind};
use super::command::{Command, CommandQueue, CommandSender, IntentEvent, Stamped};
use super::kinematics::{self, LaneShift};
use super::pickup::{self, PickupEvent};
use super::snapshot::Snapshot;
use super::state::{GameEvent, GameOverReason, GamePhase, GameState};
use crate::highscores::HighScores;
use crate::settings::Difficulty;
use crate::tuning::Tuning;

/// The game simulation: state plus its command inbox
#[derive(Debug)]
pub struct Simulation {
    state: GameState,
    queue: CommandQueue,
    events: Vec<GameEvent>,
    /// A collision stopped the car during the current tick
    stalled: bool,
}

impl Simulation {
    pub fn new(tuning: Tuning, difficulty: Difficulty, seed: u64, high_scores: HighScores) -> Self {
        log::info!("New session (seed {seed}, {})", difficulty.as_str());
        Self {
            state: GameState::new(tuning, difficulty, seed, high_scores),
            queue: CommandQueue::new(),
            events: Vec::new(),
            stalled: false,
        }
    }

    /// Handle for input, physics and clock producers
    pub fn sender(&self) -> CommandSender {
        self.queue.sender()
    }

    /// Queue a command for the next tick
    pub fn submit(&self, command: Command) {
        self.queue.sender().send(command);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    pub fn score(&self) -> i64 {
        self.state.score
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.state.high_scores
    }

    /// Current session epoch
    pub fn epoch(&self) -> u32 {
        self.queue.epoch()
    }

    /// Takes effect from the next collision report
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.state.difficulty = difficulty;
    }

    /// Read-only view for the renderer
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::of(&self.state)
    }

    /// Advance one render frame. Returns what happened, in order.
    ///
    /// Timers and popups age by the full frame time; only vehicle and camera integration is
    /// clamped to `max_frame_dt`.
    pub fn tick(&mut self, dt: f32) -> Vec<GameEvent> {
        let frame_dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let step_dt = frame_dt.min(self.state.tuning.max_frame_dt);
        self.stalled = false;

        // Commands queued behind an applied retry belong to the new session
        let mut retried_from = None;
        for mut stamped in self.queue.drain() {
            if retried_from == Some(stamped.epoch) {
                stamped.epoch = self.queue.epoch();
            }
            let epoch = self.queue.epoch();
            self.apply(stamped);
            if self.queue.epoch() != epoch {
                retried_from = Some(epoch);
            }
        }

        if self.state.is_running() {
            self.advance_running(frame_dt, step_dt);
        }

        let tuning = &self.state.tuning;
        self.state.feed.advance(frame_dt, tuning.popup_lifetime);

        std::mem::take(&mut self.events)
    }

    fn advance_running(&mut self, frame_dt: f32, step_dt: f32) {
        let state = &mut self.state;

        if state.boost.advance(frame_dt, &state.tuning) {
            self.events.push(GameEvent::BoostEnded);
        }
        if state.gate.advance(frame_dt) {
            self.events.push(GameEvent::CooldownEnded);
        }

        if step_dt > 0.0 {
            kinematics::step(
                &mut state.vehicle,
                state.controls,
                &state.boost,
                &state.lanes,
                &state.tuning,
                step_dt,
            );
            state.camera.follow(&state.vehicle, &state.tuning, step_dt);
        }
        state.elapsed += frame_dt;

        // A hit this frame wins over acceleration, whichever arrived first
        if self.stalled {
            state.vehicle.speed = 0.0;
        }

        let pickups = pickup::resolve(
            &mut state.track,
            state.vehicle.position,
            state.tuning.pickup_radius,
            state.tuning.coin_value,
        );
        for event in pickups {
            self.award_pickup(event);
        }
    }

    fn apply(&mut self, stamped: Stamped) {
        let Stamped { epoch, command } = stamped;

        // Held keys track the physical keyboard regardless of session
        if let Command::Intent(intent) = command {
            if intent.is_held_change() {
                self.apply_held(intent);
                return;
            }
        }

        if epoch != self.queue.epoch() {
            log::debug!("Dropping stale {command:?} from epoch {epoch}");
            return;
        }

        match (self.state.phase(), command) {
            (GamePhase::GameOver, Command::Retry) => self.retry(),
            (GamePhase::GameOver, _) => {
                log::debug!("Ignoring {command:?} after game over");
            }
            (GamePhase::Running, Command::Retry) => {
                log::debug!("Ignoring retry while running");
            }
            (GamePhase::Running, Command::SecondElapsed) => self.second_elapsed(),
            (GamePhase::Running, Command::Collision(event)) => self.collision(event),
            (GamePhase::Running, Command::Intent(intent)) => self.apply_edge(intent),
        }
    }

    fn apply_held(&mut self, intent: IntentEvent) {
        let controls = &mut self.state.controls;
        match intent {
            IntentEvent::ForwardPressed => controls.forward = true,
            IntentEvent::ForwardReleased => controls.forward = false,
            IntentEvent::BackwardPressed => controls.backward = true,
            IntentEvent::BackwardReleased => controls.backward = false,
            _ => {}
        }
    }

    fn apply_edge(&mut self, intent: IntentEvent) {
        let state = &mut self.state;
        match intent {
            IntentEvent::LaneLeft => {
                kinematics::change_lane(&mut state.vehicle, LaneShift::Left);
            }
            IntentEvent::LaneRight => {
                kinematics::change_lane(&mut state.vehicle, LaneShift::Right);
            }
            IntentEvent::Boost => {
                if state.boost.trigger(&state.tuning) {
                    self.events.push(GameEvent::BoostStarted);
                }
            }
            _ => {}
        }
    }

    fn second_elapsed(&mut self) {
        match self.state.clock.tick_second() {
            ClockTick::Counted { remaining } => {
                self.events.push(GameEvent::TimeTick { remaining });
            }
            ClockTick::Expired => {
                self.events.push(GameEvent::TimeTick { remaining: 0 });
                self.finish(GameOverReason::TimeUp);
            }
            ClockTick::Ignored => {}
        }
    }

    fn collision(&mut self, event: CollisionEvent) {
        if event.kind == EntityKind::Coin {
            let value = self.state.tuning.coin_value;
            if let Some(pickup) = pickup::collect_coin(&mut self.state.track, event.entity_id, value) {
                self.award_pickup(pickup);
            }
            return;
        }

        let state = &mut self.state;
        let fatal = state.difficulty.collisions_are_fatal();
        let outcome = collision::resolve(
            &mut state.gate,
            event,
            &mut state.track,
            &mut state.vehicle,
            &state.tuning,
            fatal,
        );

        match outcome {
            CollisionOutcome::Ignored => {}
            CollisionOutcome::Penalized {
                obstacle_id,
                position,
                penalty,
            } => {
                self.stalled = true;
                let state = &mut self.state;
                state.stats.obstacles_hit += 1;
                state.feed.apply(&mut state.score, penalty, position, state.elapsed);
                self.events.push(GameEvent::ObstacleHit {
                    obstacle_id,
                    position,
                    penalty,
                });
            }
            CollisionOutcome::Fatal { obstacle_id } => {
                self.stalled = true;
                self.state.stats.obstacles_hit += 1;
                log::info!("Crashed into obstacle {obstacle_id}");
                self.finish(GameOverReason::Crashed);
            }
        }
    }

    fn award_pickup(&mut self, pickup: PickupEvent) {
        let state = &mut self.state;
        let anchor = pickup.position + glam::Vec3::Y * state.tuning.coin_popup_offset;
        state.stats.coins_collected += 1;
        state.feed.apply(&mut state.score, pickup.value, anchor, state.elapsed);
        self.events.push(GameEvent::CoinCollected {
            coin_id: pickup.coin_id,
            position: pickup.position,
            value: pickup.value,
        });
    }

    /// Running → GameOver, at most once per session
    fn finish(&mut self, reason: GameOverReason) {
        let state = &mut self.state;
        // The clock already flipped the phase on expiry; a crash flips it here
        if reason == GameOverReason::Crashed && !state.clock.end() {
            return;
        }

        state.boost.cancel();
        state.gate.reset();

        let final_score = state.score;
        let rank = state.high_scores.add_score(final_score);
        log::info!(
            "Game over ({reason:?}): score {final_score}, rank {rank:?}, {} coins, {} hits",
            state.stats.coins_collected,
            state.stats.obstacles_hit
        );
        self.events.push(GameEvent::GameOver {
            final_score,
            reason,
            rank,
        });
    }

    /// GameOver → Running with a fresh session
    fn retry(&mut self) {
        let epoch = self.queue.advance_epoch();
        self.state.reset_session();
        self.stalled = false;
        log::info!("Retry: session {epoch} started");
        self.events.push(GameEvent::SessionStarted { epoch });
    }
}
