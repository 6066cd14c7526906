//! Host-facing game session
//!
//! Wraps the [`Simulation`] with a storage backend and the player's settings. Hosts feed it
//! frame times and commands; it saves the leaderboard whenever a run ends.

use serde::Serialize;

use crate::garage::{VehicleKind, VehicleProfile};
use crate::highscores::HighScores;
use crate::persistence::KeyValueStore;
use crate::settings::{Difficulty, Settings};
use crate::sim::{Command, CommandSender, GameEvent, Simulation, Snapshot};
use crate::tuning::Tuning;

/// What the renderer and HUD get each frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView<'a> {
    #[serde(flatten)]
    pub snapshot: Snapshot<'a>,
    pub vehicle_profile: VehicleProfile,
    pub difficulty: Difficulty,
    pub show_popups: bool,
}

/// A running game bound to a storage backend
pub struct Game<S: KeyValueStore> {
    sim: Simulation,
    store: S,
    settings: Settings,
}

impl<S: KeyValueStore> Game<S> {
    /// Load the ledger and settings from `store` and start the first session
    pub fn new(store: S, tuning: Tuning, seed: u64) -> Self {
        let high_scores = HighScores::load(&store);
        let settings = Settings::load(&store);
        let sim = Simulation::new(tuning, settings.difficulty, seed, high_scores);
        Self {
            sim,
            store,
            settings,
        }
    }

    pub fn sender(&self) -> CommandSender {
        self.sim.sender()
    }

    pub fn submit(&self, command: Command) {
        self.sim.submit(command);
    }

    /// Tick the simulation once; persists the ledger if the run ended this frame
    pub fn frame(&mut self, dt: f32) -> Vec<GameEvent> {
        let events = self.sim.tick(dt);
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { .. }))
        {
            self.save_high_scores();
        }
        events
    }

    fn save_high_scores(&mut self) {
        if let Err(e) = self.sim.high_scores().save(&mut self.store) {
            log::error!("Failed to save high scores: {e}");
        }
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings.save(&mut self.store) {
            log::error!("Failed to save settings: {e}");
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_vehicle(&mut self, vehicle: VehicleKind) {
        if self.settings.vehicle == vehicle {
            return;
        }
        log::info!("Vehicle: {}", vehicle.profile().name);
        self.settings.vehicle = vehicle;
        self.save_settings();
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        if self.settings.difficulty == difficulty {
            return;
        }
        log::info!("Difficulty: {}", difficulty.as_str());
        self.settings.difficulty = difficulty;
        self.sim.set_difficulty(difficulty);
        self.save_settings();
    }

    pub fn set_show_popups(&mut self, show: bool) {
        if self.settings.show_popups == show {
            return;
        }
        self.settings.show_popups = show;
        self.save_settings();
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            snapshot: self.sim.snapshot(),
            vehicle_profile: self.settings.vehicle.profile(),
            difficulty: self.settings.difficulty,
            show_popups: self.settings.show_popups,
        }
    }

    pub fn view_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT;
    use crate::persistence::{MemoryStore, StoreError};
    use crate::sim::GamePhase;

    fn finish_run<S: KeyValueStore>(game: &mut Game<S>) {
        for _ in 0..game.simulation().state().tuning.game_duration {
            game.submit(Command::SecondElapsed);
            game.frame(FRAME_DT);
        }
    }

    #[test]
    fn test_loads_ledger_and_settings_from_store() {
        let mut store = MemoryStore::new();
        HighScores::from_scores([50, 20]).save(&mut store).unwrap();
        let settings = Settings {
            vehicle: VehicleKind::Wraith,
            difficulty: Difficulty::Hard,
            show_popups: true,
        };
        settings.save(&mut store).unwrap();

        let game = Game::new(store, Tuning::default(), 1);
        assert_eq!(game.simulation().high_scores().scores(), &[50, 20]);
        assert_eq!(game.settings(), &settings);
        assert_eq!(game.simulation().state().difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_game_over_persists_ledger() {
        let mut game = Game::new(MemoryStore::new(), Tuning::default(), 1);
        finish_run(&mut game);
        assert_eq!(game.simulation().phase(), GamePhase::GameOver);

        let saved = HighScores::load(game.store());
        assert_eq!(saved.scores(), game.simulation().high_scores().scores());
        assert_eq!(saved.scores().len(), 1);
    }

    #[test]
    fn test_settings_changes_persist() {
        let mut game = Game::new(MemoryStore::new(), Tuning::default(), 1);
        game.set_vehicle(VehicleKind::Jeep);
        game.set_difficulty(Difficulty::Hard);

        let saved = Settings::load(game.store());
        assert_eq!(saved.vehicle, VehicleKind::Jeep);
        assert_eq!(saved.difficulty, Difficulty::Hard);
        assert_eq!(game.simulation().state().difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_hard_mode_from_settings_ends_run_on_crash() {
        let mut game = Game::new(MemoryStore::new(), Tuning::default(), 1);
        game.set_difficulty(Difficulty::Hard);
        game.set_vehicle(VehicleKind::Wraith);
        assert_eq!(game.view().vehicle_profile, VehicleKind::Wraith.profile());

        let obstacle = game.simulation().state().track.obstacles[0].id;
        game.submit(Command::Collision(crate::sim::CollisionEvent::obstacle(obstacle)));
        let events = game.frame(FRAME_DT);

        assert_eq!(game.simulation().phase(), GamePhase::GameOver);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                reason: crate::sim::GameOverReason::Crashed,
                ..
            }
        )));
        assert_eq!(HighScores::load(game.store()).scores().len(), 1);
    }

    #[test]
    fn test_view_json_carries_vehicle_profile() {
        let game = Game::new(MemoryStore::new(), Tuning::default(), 1);
        let json = game.view_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["vehicle_profile"]["name"], VehicleKind::default().profile().name);
        assert_eq!(value["phase"], "Running");
        assert_eq!(value["score"], 0);
    }

    /// Accepts reads, rejects every write
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable(format!("read-only ({key})")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }
    }

    #[test]
    fn test_write_failures_do_not_stop_play() {
        let mut game = Game::new(ReadOnlyStore, Tuning::default(), 1);
        game.set_difficulty(Difficulty::Hard);
        finish_run(&mut game);
        assert_eq!(game.simulation().phase(), GamePhase::GameOver);
        assert_eq!(game.simulation().high_scores().scores().len(), 1);

        game.submit(Command::Retry);
        game.frame(FRAME_DT);
        assert_eq!(game.simulation().phase(), GamePhase::Running);
    }
}
