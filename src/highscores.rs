//! High score leaderboard system
//!
//! Tracks the top 10 finished games plus an all-time best that never decreases.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, Storage};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score
    pub score: i32,
    /// Pair attempts it took
    pub moves: u32,
    /// Seconds played
    pub game_time_secs: f32,
    /// Unix timestamp (ms) when achieved
    pub recorded_at_ms: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
    /// All-time best, including values carried in from restored saves
    #[serde(default)]
    best: i32,
}

impl HighScores {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "memory_match_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// All-time best score (0 when nothing recorded)
    pub fn best(&self) -> i32 {
        self.best.max(self.top_score().unwrap_or(0))
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: i32) -> bool {
        if score <= 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: i32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a finished game to the leaderboard (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }
        self.raise_best(entry.score);

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Lift the all-time best without adding a leaderboard row.
    /// Returns true if the best changed.
    pub fn raise_best(&mut self, score: i32) -> bool {
        if score > self.best() {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<i32> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores from storage, starting fresh on missing or unreadable data
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    return scores;
                }
                Err(e) => log::warn!("High score data is unreadable: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read high scores: {}", e),
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to storage
    pub fn save(&self, storage: &dyn Storage) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(self)?;
        storage.set_item(Self::STORAGE_KEY, &json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}
