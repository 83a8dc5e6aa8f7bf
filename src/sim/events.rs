//! Notifications emitted for presentation layers (HUD, audio, effects)

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::stats::GameStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted,
    GameCompleted,
    /// The all-cards-face-up opening phase ended; cards are clickable
    InitialRevealFinished,
    CardRevealed { index: usize },
    /// Cards flipped face-down after a mismatch
    CardsHidden { first: usize, second: usize },
    PairMatched { first: usize, second: usize },
    MatchAttempted { success: bool },
    ScoreChanged {
        score: i32,
        delta: i32,
        /// Where a popup should appear; `None` for end-of-game bonuses
        position: Option<Vec3>,
    },
    TotalScoreChanged { total: i32 },
    ComboChanged { combo: u32 },
    MultiplierChanged { multiplier: f32 },
    ComboStarted,
    /// Emitted only when a streak of two or more ends
    ComboBroken,
    StatsUpdated(GameStats),
    StatsGameCompleted(GameStats),
    SessionRestored,
}
