//! Persistable captures of a session
//!
//! Field names on the wire are stable: `cards[{identity, revealed, matched, x, y, z}]`,
//! `rows`, `columns`, `gridConstraint`, `currentScore`, `currentCombo`,
//! `gameTimeSeconds`, `totalMoves`, `highScore`.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Saved data that cannot be turned back into a board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot contains no cards")]
    EmptyBoard,

    #[error("no saved card identity is known to this board")]
    NoKnownIdentities,
}

/// One saved card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub identity: String,
    pub revealed: bool,
    pub matched: bool,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CardRecord {
    pub fn new(identity: impl Into<String>, revealed: bool, matched: bool, position: Vec3) -> Self {
        Self {
            identity: identity.into(),
            revealed,
            matched,
            x: position.x,
            y: position.y,
            z: position.z,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Board part of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub cards: Vec<CardRecord>,
    pub rows: i32,
    pub columns: i32,
    pub grid_constraint: i32,
}

/// Complete session capture: board, score and stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub board: BoardSnapshot,
    pub current_score: i32,
    pub current_combo: i32,
    pub game_time_seconds: f32,
    pub total_moves: i32,
    pub high_score: i32,
}

impl SessionSnapshot {
    /// Cards saved as matched, halved
    pub fn matched_pairs(&self) -> usize {
        self.board.cards.iter().filter(|c| c.matched).count() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let snapshot = SessionSnapshot {
            board: BoardSnapshot {
                cards: vec![CardRecord::new("kiwi", true, false, Vec3::new(1.0, 2.0, 3.0))],
                rows: 2,
                columns: 2,
                grid_constraint: 4,
            },
            current_score: 250,
            current_combo: 2,
            game_time_seconds: 9.5,
            total_moves: 3,
            high_score: 1800,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        for key in [
            "cards",
            "rows",
            "columns",
            "gridConstraint",
            "currentScore",
            "currentCombo",
            "gameTimeSeconds",
            "totalMoves",
            "highScore",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["cards"][0]["identity"], "kiwi");
        assert_eq!(value["cards"][0]["z"], 3.0);

        let back: SessionSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.board.cards[0].position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_matched_pairs() {
        let cards = vec![
            CardRecord::new("a", false, true, Vec3::ZERO),
            CardRecord::new("a", false, true, Vec3::ZERO),
            CardRecord::new("b", true, false, Vec3::ZERO),
            CardRecord::new("b", false, false, Vec3::ZERO),
        ];
        let snapshot = SessionSnapshot {
            board: BoardSnapshot {
                cards,
                rows: 2,
                columns: 2,
                grid_constraint: 2,
            },
            current_score: 0,
            current_combo: 0,
            game_time_seconds: 0.0,
            total_moves: 0,
            high_score: 0,
        };
        assert_eq!(snapshot.matched_pairs(), 1);
    }
}
