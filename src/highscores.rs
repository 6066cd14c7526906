//! High score leaderboard
//!
//! Persisted as a JSON array of integers, tracks the top 5 scores in descending order.
//! Scores can be negative; every completed session is offered to the board.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 5;

/// High score leaderboard (descending, at most [`MAX_HIGH_SCORES`])
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores {
    scores: Vec<i64>,
}

impl HighScores {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "lane_dash_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self { scores: Vec::new() }
    }

    /// Build a leaderboard from arbitrary scores (sorted and truncated)
    pub fn from_scores(scores: impl IntoIterator<Item = i64>) -> Self {
        let mut scores: Vec<i64> = scores.into_iter().collect();
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores.truncate(MAX_HIGH_SCORES);
        Self { scores }
    }

    /// Scores, highest first
    pub fn scores(&self) -> &[i64] {
        &self.scores
    }

    /// Check if a score would make the leaderboard
    pub fn qualifies(&self, score: i64) -> bool {
        if self.scores.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.scores.last().map(|&lowest| score > lowest).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: i64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.scores.iter().position(|&s| score > s);
        Some(rank.unwrap_or(self.scores.len()) + 1)
    }

    /// Append a final score, keep the top [`MAX_HIGH_SCORES`].
    /// Returns the rank achieved (1-indexed) or None if it fell off the board.
    pub fn add_score(&mut self, score: i64) -> Option<usize> {
        // Ties rank below existing equal scores
        let pos = self
            .scores
            .iter()
            .position(|&s| score > s)
            .unwrap_or(self.scores.len());
        self.scores.insert(pos, score);
        self.scores.truncate(MAX_HIGH_SCORES);

        (pos < MAX_HIGH_SCORES).then_some(pos + 1)
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<i64> {
        self.scores.first().copied()
    }

    /// Parse a persisted leaderboard; anything malformed yields an empty board
    pub fn parse(json: &str) -> Self {
        match serde_json::from_str::<Vec<i64>>(json) {
            Ok(scores) => Self::from_scores(scores),
            Err(e) => {
                log::warn!("Corrupt high score data ({e}), starting fresh");
                Self::new()
            }
        }
    }

    /// Load the leaderboard; missing or unreadable data yields an empty board
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => {
                let scores = Self::parse(&json);
                log::info!("Loaded {} high scores", scores.scores.len());
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Could not read high scores ({e}), starting fresh");
                Self::new()
            }
        }
    }

    /// Persist the leaderboard
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("High scores saved ({} entries)", self.scores.len());
        Ok(())
    }
}
