//! Board matching state machine
//!
//! Owns the cards, deals and shuffles them, tracks the current selection and
//! resolves pairs after the match-check delay. Scoring and stats never touch the
//! card list; they only see the [`MatchOutcome`] handed back from
//! [`Board::resolve_match_check`].

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::card::Card;
use super::events::GameEvent;
use super::shuffle::fisher_yates;
use super::snapshot::{BoardSnapshot, CardRecord, SnapshotError};
use super::timer::{TimerId, TimerKind, Timers};
use crate::consts::GRID_SPACING;
use crate::secs_to_ms;
use crate::settings::{BoardSettings, ConfigError};

/// Grid shape currently on the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub rows: i32,
    pub columns: i32,
    /// Cells per row used by the layout
    pub constraint: i32,
}

/// Why a click did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    BoardInactive,
    OutOfRange,
    /// Two cards are already waiting on the match-check delay
    EvaluationPending,
    AlreadyMatched,
    AlreadyRevealed,
    NotInteractable,
}

/// Result of a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Ignored(IgnoreReason),
    /// Card revealed into the first selection slot
    First,
    /// Card revealed into the second slot; match check scheduled
    Second,
}

/// Resolution of a pair after the match-check delay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub success: bool,
    pub first: usize,
    pub second: usize,
    /// Midpoint of the two cards (for score popups)
    pub position: Vec3,
    pub matched_pairs: usize,
    /// This match cleared the board
    pub completed: bool,
}

/// What a restore managed to rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Identities that were not in the pool and got dropped
    pub skipped: Vec<String>,
    pub dims: GridDims,
    /// Card re-established as the pending first selection
    pub pending_first: Option<usize>,
}

/// Pair captured at second-pick time
#[derive(Debug, Clone, Copy)]
struct PendingCheck {
    timer: TimerId,
    first: usize,
    second: usize,
}

/// Cell centers for a `rows x columns` grid, row-major, centered on the origin
pub fn grid_positions(rows: i32, columns: i32) -> Vec<Vec3> {
    let rows = rows.max(0);
    let columns = columns.max(0);
    let mut positions = Vec::with_capacity((rows * columns) as usize);
    for row in 0..rows {
        for col in 0..columns {
            positions.push(Vec3::new(
                col as f32 * GRID_SPACING - (columns - 1) as f32 * GRID_SPACING / 2.0,
                -(row as f32) * GRID_SPACING + (rows - 1) as f32 * GRID_SPACING / 2.0,
                0.0,
            ));
        }
    }
    positions
}

pub struct Board {
    settings: BoardSettings,
    dims: GridDims,
    cards: Vec<Card>,
    rng: Pcg32,
    /// First selection slot (second lives in `pending`)
    first: Option<usize>,
    pending: Option<PendingCheck>,
    reveal_timer: Option<TimerId>,
    matched_pairs: usize,
    active: bool,
    events: Vec<GameEvent>,
}

impl Board {
    /// Create an empty board; call [`Board::setup`] to deal
    pub fn new(settings: &BoardSettings, seed: u64) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings: settings.clone(),
            dims: GridDims {
                rows: settings.rows,
                columns: settings.columns,
                constraint: settings.grid_constraint,
            },
            cards: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            first: None,
            pending: None,
            reveal_timer: None,
            matched_pairs: 0,
            active: true,
            events: Vec::new(),
        })
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn matched_pair_count(&self) -> usize {
        self.matched_pairs
    }

    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn is_complete(&self) -> bool {
        !self.cards.is_empty() && self.matched_pairs == self.total_pairs()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Opening all-face-up phase still running
    pub fn is_revealing(&self) -> bool {
        self.reveal_timer.is_some()
    }

    /// Card waiting in the first selection slot
    pub fn pending_selection(&self) -> Option<usize> {
        self.first
    }

    /// Pair waiting on the match-check delay
    pub fn evaluation_pending(&self) -> Option<(usize, usize)> {
        self.pending.map(|p| (p.first, p.second))
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deal a fresh board and start the opening reveal
    pub fn setup(&mut self, timers: &mut Timers) {
        self.cancel_timers(timers);
        self.dims = GridDims {
            rows: self.settings.rows,
            columns: self.settings.columns,
            constraint: self.settings.grid_constraint,
        };

        // Identity order and placement are shuffled independently
        let mut identities = self.build_identity_pairs();
        fisher_yates(&mut identities, &mut self.rng);
        let mut positions = grid_positions(self.dims.rows, self.dims.columns);
        fisher_yates(&mut positions, &mut self.rng);

        self.cards = identities
            .into_iter()
            .zip(positions)
            .map(|(identity, position)| Card::new(identity, position))
            .collect();
        self.first = None;
        self.matched_pairs = 0;
        self.active = true;

        for card in &mut self.cards {
            card.reveal();
            card.set_interactable(false);
        }
        let delay = secs_to_ms(self.settings.initial_reveal_secs);
        self.reveal_timer = Some(timers.schedule(delay, TimerKind::InitialReveal));

        log::info!(
            "Board dealt: {}x{} ({} pairs), constraint {}",
            self.dims.rows,
            self.dims.columns,
            self.total_pairs(),
            self.dims.constraint
        );
    }

    /// Discard every card and deal again
    pub fn restart(&mut self, timers: &mut Timers) {
        self.cards.clear();
        self.matched_pairs = 0;
        self.active = true;
        self.setup(timers);
    }

    /// `pairs_needed` identities from the pool (cycling if short), each twice
    fn build_identity_pairs(&self) -> Vec<String> {
        let pairs_needed = self.settings.card_count() / 2;
        let pool = &self.settings.identities;
        if pool.len() < pairs_needed {
            log::warn!(
                "Identity pool has {} faces for {} pairs; faces will repeat",
                pool.len(),
                pairs_needed
            );
        }
        let mut identities = Vec::with_capacity(pairs_needed * 2);
        for i in 0..pairs_needed {
            let identity = &pool[i % pool.len()];
            identities.push(identity.clone());
            identities.push(identity.clone());
        }
        identities
    }

    /// Opening reveal timer fired: flip everything face-down and allow clicks
    pub fn finish_initial_reveal(&mut self, id: TimerId) -> bool {
        if self.reveal_timer != Some(id) {
            return false;
        }
        self.reveal_timer = None;
        for card in &mut self.cards {
            if !card.is_matched() {
                card.hide();
            }
        }
        self.events.push(GameEvent::InitialRevealFinished);
        log::debug!("Initial reveal finished");
        true
    }

    /// Handle a click on card `index`
    pub fn select(&mut self, index: usize, timers: &mut Timers) -> Pick {
        if !self.active {
            return Pick::Ignored(IgnoreReason::BoardInactive);
        }
        if self.pending.is_some() {
            return Pick::Ignored(IgnoreReason::EvaluationPending);
        }
        let Some(card) = self.cards.get_mut(index) else {
            return Pick::Ignored(IgnoreReason::OutOfRange);
        };
        if card.is_matched() {
            return Pick::Ignored(IgnoreReason::AlreadyMatched);
        }
        if card.is_revealed() {
            return Pick::Ignored(IgnoreReason::AlreadyRevealed);
        }
        if !card.is_interactable() {
            return Pick::Ignored(IgnoreReason::NotInteractable);
        }

        card.reveal();
        self.events.push(GameEvent::CardRevealed { index });

        match self.first.take() {
            None => {
                self.first = Some(index);
                Pick::First
            }
            Some(first) => {
                // Lock both before the delay so nothing else can be picked
                for i in [first, index] {
                    if let Some(card) = self.cards.get_mut(i) {
                        card.set_interactable(false);
                    }
                }
                let delay = secs_to_ms(self.settings.match_check_delay_secs);
                let timer = timers.schedule(delay, TimerKind::MatchCheck);
                self.pending = Some(PendingCheck {
                    timer,
                    first,
                    second: index,
                });
                Pick::Second
            }
        }
    }

    /// Match-check timer fired: resolve the captured pair
    pub fn resolve_match_check(&mut self, id: TimerId) -> Option<MatchOutcome> {
        let pending = self.pending.filter(|p| p.timer == id)?;
        self.pending = None;

        let (a, b) = match (self.cards.get(pending.first), self.cards.get(pending.second)) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                log::warn!("Match check fired for cards that no longer exist");
                return None;
            }
        };
        let success = a.identity == b.identity;
        let position = (a.position + b.position) / 2.0;

        if success {
            for i in [pending.first, pending.second] {
                self.cards[i].mark_matched();
            }
            self.matched_pairs += 1;
            self.events.push(GameEvent::PairMatched {
                first: pending.first,
                second: pending.second,
            });
        } else {
            for i in [pending.first, pending.second] {
                self.cards[i].hide();
            }
            self.events.push(GameEvent::CardsHidden {
                first: pending.first,
                second: pending.second,
            });
        }

        let completed = success && self.matched_pairs >= self.total_pairs();
        if completed {
            self.active = false;
            log::info!("All {} pairs matched", self.matched_pairs);
        }

        Some(MatchOutcome {
            success,
            first: pending.first,
            second: pending.second,
            position,
            matched_pairs: self.matched_pairs,
            completed,
        })
    }

    /// End the game early. Returns false if it was already over.
    pub fn force_complete(&mut self, timers: &mut Timers) -> bool {
        if !self.active {
            return false;
        }
        self.cancel_timers(timers);
        self.active = false;
        true
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        // The opening preview is presentation only; cards settle face-down
        let previewing = self.is_revealing();
        BoardSnapshot {
            cards: self
                .cards
                .iter()
                .map(|c| {
                    CardRecord::new(
                        c.identity.clone(),
                        c.is_revealed() && !previewing,
                        c.is_matched(),
                        c.position,
                    )
                })
                .collect(),
            rows: self.dims.rows,
            columns: self.dims.columns,
            grid_constraint: self.dims.constraint,
        }
    }

    /// Fail without touching the board if `snapshot` cannot be rebuilt
    pub fn check_snapshot(&self, snapshot: &BoardSnapshot) -> Result<(), SnapshotError> {
        if snapshot.cards.is_empty() {
            return Err(SnapshotError::EmptyBoard);
        }
        if !snapshot
            .cards
            .iter()
            .any(|c| self.resolve_identity(&c.identity).is_some())
        {
            return Err(SnapshotError::NoKnownIdentities);
        }
        Ok(())
    }

    fn resolve_identity(&self, name: &str) -> Option<&String> {
        if name.is_empty() {
            return None;
        }
        self.settings.identities.iter().find(|id| *id == name)
    }

    /// Rebuild the board from saved data, bypassing the opening reveal
    pub fn restore(
        &mut self,
        snapshot: &BoardSnapshot,
        timers: &mut Timers,
    ) -> Result<RestoreReport, SnapshotError> {
        self.check_snapshot(snapshot)?;
        self.cancel_timers(timers);
        self.cards.clear();
        self.first = None;

        let (rows, columns) = if snapshot.rows <= 0 || snapshot.columns <= 0 {
            log::warn!(
                "Saved grid {}x{} is invalid, using configured {}x{}",
                snapshot.rows,
                snapshot.columns,
                self.settings.rows,
                self.settings.columns
            );
            (self.settings.rows, self.settings.columns)
        } else {
            (snapshot.rows, snapshot.columns)
        };
        let constraint = if snapshot.grid_constraint <= 0 {
            self.settings.grid_constraint
        } else {
            snapshot.grid_constraint
        };
        self.dims = GridDims {
            rows,
            columns,
            constraint,
        };

        let mut skipped = Vec::new();
        for record in &snapshot.cards {
            let Some(identity) = self.resolve_identity(&record.identity).cloned() else {
                log::warn!("Skipping saved card with unknown identity '{}'", record.identity);
                skipped.push(record.identity.clone());
                continue;
            };
            let mut card = Card::new(identity, record.position());
            card.restore_state(record.revealed, record.matched);
            self.cards.push(card);
        }

        self.matched_pairs = self.cards.iter().filter(|c| c.is_matched()).count() / 2;

        // A single face-up card resumes as the first pick; two or more stay as they are
        let mut face_up = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_revealed())
            .map(|(i, _)| i);
        if let (Some(only), None) = (face_up.next(), face_up.next()) {
            self.first = Some(only);
        }

        self.active = self.matched_pairs < self.total_pairs();

        log::info!(
            "Board restored with {} cards ({} skipped), constraint {}",
            self.cards.len(),
            skipped.len(),
            constraint
        );

        Ok(RestoreReport {
            restored: self.cards.len(),
            skipped,
            dims: self.dims,
            pending_first: self.first,
        })
    }

    fn cancel_timers(&mut self, timers: &mut Timers) {
        if let Some(id) = self.reveal_timer.take() {
            timers.cancel(id);
        }
        if let Some(pending) = self.pending.take() {
            timers.cancel(pending.timer);
        }
    }
}
