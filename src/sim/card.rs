//! Single card lifecycle
//!
//! `Hidden -> Revealed -> Matched` (terminal), or `Revealed -> Hidden` after a
//! mismatch.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which side of the card is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CardFace {
    #[default]
    Hidden,
    Revealed,
    /// Terminal: a matched card never flips back
    Matched,
}

/// A card entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Matching key, shared by exactly two cards
    pub identity: String,
    /// Layout position
    pub position: Vec3,
    face: CardFace,
    interactable: bool,
}

impl Card {
    pub fn new(identity: impl Into<String>, position: Vec3) -> Self {
        Self {
            identity: identity.into(),
            position,
            face: CardFace::Hidden,
            interactable: true,
        }
    }

    pub fn face(&self) -> CardFace {
        self.face
    }

    pub fn is_revealed(&self) -> bool {
        self.face == CardFace::Revealed
    }

    pub fn is_matched(&self) -> bool {
        self.face == CardFace::Matched
    }

    pub fn is_interactable(&self) -> bool {
        self.interactable && !self.is_matched()
    }

    /// Whether a click on this card would be accepted
    pub fn can_pick(&self) -> bool {
        self.is_interactable() && self.face == CardFace::Hidden
    }

    pub fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable && !self.is_matched();
    }

    /// Flip face-up. Returns false if already face-up or matched.
    pub fn reveal(&mut self) -> bool {
        if self.face != CardFace::Hidden {
            return false;
        }
        self.face = CardFace::Revealed;
        true
    }

    /// Flip face-down and become clickable again. Matched cards stay put.
    pub fn hide(&mut self) -> bool {
        if self.is_matched() {
            return false;
        }
        self.face = CardFace::Hidden;
        self.interactable = true;
        true
    }

    pub fn mark_matched(&mut self) {
        self.face = CardFace::Matched;
        self.interactable = false;
    }

    /// Set flags straight from saved data, skipping any reveal timing
    pub fn restore_state(&mut self, revealed: bool, matched: bool) {
        if matched {
            self.mark_matched();
        } else {
            self.face = if revealed {
                CardFace::Revealed
            } else {
                CardFace::Hidden
            };
            self.interactable = true;
        }
    }
}
