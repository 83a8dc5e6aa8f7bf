//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Single simulation clock (integer milliseconds) driving every timer
//! - Seeded RNG only
//! - Stable iteration order (card index, timer issue order)
//! - No rendering, input or platform dependencies

pub mod board;
pub mod card;
pub mod events;
pub mod score;
pub mod session;
pub mod shuffle;
pub mod snapshot;
pub mod stats;
pub mod timer;

pub use board::{Board, GridDims, IgnoreReason, MatchOutcome, Pick, RestoreReport, grid_positions};
pub use card::{Card, CardFace};
pub use events::GameEvent;
pub use score::{FinalTally, ScoreSession, format_thousands};
pub use session::{GameSession, SessionBuilder, SessionError};
pub use shuffle::fisher_yates;
pub use snapshot::{BoardSnapshot, CardRecord, SessionSnapshot, SnapshotError};
pub use stats::{GameStats, StatsTracker};
pub use timer::{TimerId, TimerKind, Timers};
