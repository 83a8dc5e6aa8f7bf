//! Per-game statistics and high score bookkeeping

use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::score::format_thousands;
use crate::highscores::{HighScoreEntry, HighScores};
use crate::persistence::{PersistenceError, Storage};
use crate::unix_millis;

/// Counters for the game in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameStats {
    pub total_moves: u32,
    pub successful_matches: u32,
    pub failed_matches: u32,
    pub game_time_secs: f32,
    pub final_score: i32,
    /// Longest streak seen this game
    pub max_combo: u32,
    /// successful / total * 100
    pub accuracy: f32,
}

impl GameStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn add_move(&mut self, successful: bool) {
        self.total_moves += 1;
        if successful {
            self.successful_matches += 1;
        } else {
            self.failed_matches += 1;
        }
        self.recalculate_accuracy();
    }

    pub fn update_max_combo(&mut self, combo: u32) {
        self.max_combo = self.max_combo.max(combo);
    }

    fn recalculate_accuracy(&mut self) {
        if self.total_moves > 0 {
            self.accuracy = self.successful_matches as f32 / self.total_moves as f32 * 100.0;
        }
    }

    /// Multi-line summary for the game-over screen
    pub fn summary(&self) -> String {
        let secs = self.game_time_secs.max(0.0);
        format!(
            "Final Score: {}\nTime: {:02}:{:02}\nMoves: {}\nAccuracy: {:.1}%\nMax Combo: {}x",
            format_thousands(self.final_score),
            (secs / 60.0).floor() as u32,
            (secs % 60.0).floor() as u32,
            self.total_moves,
            self.accuracy,
            self.max_combo
        )
    }
}

/// Aggregates moves and combos for the current game and owns the high score table
pub struct StatsTracker {
    stats: GameStats,
    high_scores: HighScores,
    storage: Box<dyn Storage>,
    completed: bool,
    /// Guards against recording the same game twice
    high_score_recorded: bool,
    events: Vec<GameEvent>,
}

impl StatsTracker {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        let high_scores = HighScores::load(storage.as_ref());
        Self {
            stats: GameStats::default(),
            high_scores,
            storage,
            completed: false,
            high_score_recorded: false,
            events: Vec::new(),
        }
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn high_score(&self) -> i32 {
        self.high_scores.best()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start_new_game(&mut self) {
        self.stats.reset();
        self.completed = false;
        self.high_score_recorded = false;
        self.events.push(GameEvent::StatsUpdated(self.stats.clone()));
    }

    /// Count one pair attempt. Ignored once the game is complete.
    pub fn record_move(&mut self, successful: bool) {
        if self.completed {
            return;
        }
        self.stats.add_move(successful);
        self.events.push(GameEvent::StatsUpdated(self.stats.clone()));
    }

    pub fn observe_combo(&mut self, combo: u32) {
        self.stats.update_max_combo(combo);
    }

    pub fn complete_game(&mut self, game_time_secs: f32, final_score: i32) -> &GameStats {
        if !self.completed {
            self.stats.game_time_secs = game_time_secs;
            self.stats.final_score = final_score;
            self.completed = true;
            self.events.push(GameEvent::StatsGameCompleted(self.stats.clone()));
            log::info!(
                "Game complete: {} moves, {:.1}% accuracy",
                self.stats.total_moves,
                self.stats.accuracy
            );
        }
        &self.stats
    }

    /// Record the finished game and persist it.
    /// Returns true if the all-time best went up.
    pub fn save_high_score(&mut self) -> Result<bool, PersistenceError> {
        if !self.completed || self.high_score_recorded {
            return Ok(false);
        }
        self.high_score_recorded = true;

        let score = self.stats.final_score;
        let improved = score > self.high_scores.best();
        let rank = self.high_scores.add_score(HighScoreEntry {
            score,
            moves: self.stats.total_moves,
            game_time_secs: self.stats.game_time_secs,
            recorded_at_ms: unix_millis(),
        });

        if rank.is_some() {
            self.high_scores.save(self.storage.as_ref())?;
        }
        if improved {
            log::info!("New high score: {}", score);
        }
        Ok(improved)
    }

    /// Rebuild counters from a save
    pub fn restore(&mut self, total_moves: i32, matched_pairs: usize, high_score: i32) {
        let successful = matched_pairs as u32;
        let total = (total_moves.max(0) as u32).max(successful);
        self.stats.reset();
        self.stats.total_moves = total;
        self.stats.successful_matches = successful;
        self.stats.failed_matches = total.saturating_sub(successful);
        self.stats.recalculate_accuracy();
        self.completed = false;
        self.high_score_recorded = false;

        if self.high_scores.raise_best(high_score)
            && let Err(e) = self.high_scores.save(self.storage.as_ref())
        {
            log::warn!("Could not persist restored high score: {}", e);
        }
        self.events.push(GameEvent::StatsUpdated(self.stats.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    fn tracker() -> (StatsTracker, MemoryStorage) {
        let storage = MemoryStorage::new();
        (StatsTracker::new(Box::new(storage.clone())), storage)
    }

    #[test]
    fn test_moves_and_accuracy() {
        let (mut tracker, _) = tracker();
        tracker.start_new_game();
        tracker.record_move(true);
        tracker.record_move(false);
        tracker.record_move(true);
        tracker.record_move(true);

        let stats = tracker.stats();
        assert_eq!(stats.total_moves, 4);
        assert_eq!(stats.successful_matches, 3);
        assert_eq!(stats.failed_matches, 1);
        assert_eq!(stats.accuracy, 75.0);
    }

    #[test]
    fn test_max_combo_never_decreases() {
        let (mut tracker, _) = tracker();
        for combo in [1, 2, 3, 0, 1] {
            tracker.observe_combo(combo);
        }
        assert_eq!(tracker.stats().max_combo, 3);
    }

    #[test]
    fn test_moves_ignored_after_completion() {
        let (mut tracker, _) = tracker();
        tracker.start_new_game();
        tracker.record_move(true);
        tracker.complete_game(30.0, 1_500);
        tracker.record_move(false);
        assert_eq!(tracker.stats().total_moves, 1);
        assert_eq!(tracker.stats().final_score, 1_500);
    }

    #[test]
    fn test_high_score_only_increases() {
        let (mut tracker, storage) = tracker();
        tracker.start_new_game();
        tracker.complete_game(10.0, 2_000);
        assert!(tracker.save_high_score().unwrap());
        assert_eq!(tracker.high_score(), 2_000);

        tracker.start_new_game();
        tracker.complete_game(10.0, 900);
        assert!(!tracker.save_high_score().unwrap());
        assert_eq!(tracker.high_score(), 2_000);

        // Survives a reload from the same storage
        let reloaded = StatsTracker::new(Box::new(storage));
        assert_eq!(reloaded.high_score(), 2_000);
        assert_eq!(reloaded.high_scores().entries.len(), 2);
    }

    #[test]
    fn test_high_score_recorded_once_per_game() {
        let (mut tracker, _) = tracker();
        tracker.start_new_game();
        tracker.complete_game(5.0, 700);
        tracker.save_high_score().unwrap();
        tracker.save_high_score().unwrap();
        assert_eq!(tracker.high_scores().entries.len(), 1);
    }

    #[test]
    fn test_restore_derives_counts() {
        let (mut tracker, storage) = tracker();
        tracker.restore(7, 3, 4_200);
        let stats = tracker.stats();
        assert_eq!(stats.total_moves, 7);
        assert_eq!(stats.successful_matches, 3);
        assert_eq!(stats.failed_matches, 4);
        assert_eq!(tracker.high_score(), 4_200);
        assert_eq!(StatsTracker::new(Box::new(storage)).high_score(), 4_200);

        // Lower saved best leaves the stored one alone
        tracker.restore(1, 5, 10);
        assert_eq!(tracker.stats().total_moves, 5);
        assert_eq!(tracker.stats().failed_matches, 0);
        assert_eq!(tracker.high_score(), 4_200);
    }

    #[test]
    fn test_summary_format() {
        let stats = GameStats {
            total_moves: 12,
            successful_matches: 8,
            failed_matches: 4,
            game_time_secs: 125.7,
            final_score: 3_450,
            max_combo: 4,
            accuracy: 66.666_67,
        };
        assert_eq!(
            stats.summary(),
            "Final Score: 3,450\nTime: 02:05\nMoves: 12\nAccuracy: 66.7%\nMax Combo: 4x"
        );
    }
}
