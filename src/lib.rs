//! Memory Match - a pair-matching card game session engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board, scoring, stats, timers, snapshots)
//! - `persistence`: Save/load behind a storage abstraction with a versioned envelope
//! - `settings`: Data-driven board and scoring tunables
//! - `highscores`: High score leaderboard

pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{BoardSettings, GridPreset, ScoringSettings, Settings};
pub use sim::{GameEvent, GameSession};

/// Game configuration constants
pub mod consts {
    /// Distance between neighbouring card centers (layout units)
    pub const GRID_SPACING: f32 = 120.0;

    /// Board defaults
    pub const DEFAULT_ROWS: i32 = 2;
    pub const DEFAULT_COLUMNS: i32 = 2;
    pub const DEFAULT_GRID_CONSTRAINT: i32 = 2;
    pub const DEFAULT_MATCH_CHECK_DELAY_SECS: f32 = 0.3;
    pub const DEFAULT_INITIAL_REVEAL_SECS: f32 = 1.0;

    /// Scoring defaults
    pub const DEFAULT_BASE_MATCH_SCORE: i32 = 100;
    pub const DEFAULT_COMPLETION_BONUS: i32 = 1000;
    pub const DEFAULT_COMBO_WINDOW_SECS: f32 = 3.0;
    pub const DEFAULT_MAX_COMBO_MULTIPLIER: f32 = 5.0;
    pub const DEFAULT_COMBO_MULTIPLIER_INCREMENT: f32 = 1.0;
    pub const DEFAULT_MIN_TIME_BETWEEN_MATCHES_SECS: f32 = 0.5;
    pub const DEFAULT_TIME_BONUS_PER_SECOND: f32 = 10.0;
    pub const DEFAULT_MAX_TIME_BONUS: i32 = 5000;
    pub const DEFAULT_FAILED_MATCH_PENALTY: i32 = -10;
}

/// Convert a duration in seconds to whole simulation milliseconds.
///
/// Negative and non-finite inputs clamp to zero.
#[inline]
pub fn secs_to_ms(secs: f32) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs as f64 * 1000.0).round() as u64
}

/// Convert simulation milliseconds to seconds
#[inline]
pub fn ms_to_secs(ms: u64) -> f32 {
    (ms as f64 / 1000.0) as f32
}

/// Current wall-clock time in Unix milliseconds (0 if the clock is before the epoch)
pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
