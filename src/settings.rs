//! Player settings and preferences
//!
//! Persisted separately from the leaderboard under their own key.

use serde::{Deserialize, Serialize};

use crate::garage::VehicleKind;
use crate::persistence::{KeyValueStore, StoreError};

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    /// Obstacles cost points
    #[default]
    Normal,
    /// Any obstacle hit ends the run
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Whether an obstacle collision ends the session
    pub fn collisions_are_fatal(&self) -> bool {
        matches!(self, Difficulty::Hard)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Selected vehicle
    pub vehicle: VehicleKind,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Show floating score popups
    pub show_popups: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vehicle: VehicleKind::default(),
            difficulty: Difficulty::Normal,
            show_popups: true,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "lane_dash_settings";

    /// Load settings; missing or unreadable data yields defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Corrupt settings ({e}), using defaults");
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Could not read settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Persist settings
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
