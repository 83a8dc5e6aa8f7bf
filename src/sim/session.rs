//! Session coordinator
//!
//! Owns the clock and the three engines, pumps timers in order and routes
//! outcomes between them. Board, score and stats never call each other; every
//! hand-off goes through here.

use thiserror::Error;

use super::board::{Board, MatchOutcome, Pick};
use super::events::GameEvent;
use super::score::{FinalTally, ScoreSession};
use super::snapshot::{SessionSnapshot, SnapshotError};
use super::stats::{GameStats, StatsTracker};
use super::timer::{TimerKind, Timers};
use crate::persistence::{PersistenceError, SaveSystem, Storage};
use crate::secs_to_ms;
use crate::settings::{ConfigError, Settings};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is missing its {0}")]
    MissingCollaborator(&'static str),

    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("unusable snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl SessionError {
    /// True when a load failed only because nothing was saved
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::Persistence(e) if e.is_not_found())
    }
}

/// Wires a [`GameSession`] together
#[derive(Default)]
pub struct SessionBuilder {
    settings: Option<Settings>,
    seed: Option<u64>,
    save_system: Option<Box<dyn SaveSystem>>,
    stats_storage: Option<Box<dyn Storage>>,
}

impl SessionBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Shuffle seed (defaults to the wall clock)
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn save_system(mut self, saves: impl SaveSystem + 'static) -> Self {
        self.save_system = Some(Box::new(saves));
        self
    }

    /// Where high scores live
    pub fn stats_storage(mut self, storage: impl Storage + 'static) -> Self {
        self.stats_storage = Some(Box::new(storage));
        self
    }

    pub fn build(self) -> Result<GameSession, SessionError> {
        let saves = self
            .save_system
            .ok_or(SessionError::MissingCollaborator("save system"))?;
        let stats_storage = self
            .stats_storage
            .ok_or(SessionError::MissingCollaborator("stats storage"))?;
        let settings = self.settings.unwrap_or_default();
        settings.validate()?;
        let seed = self.seed.unwrap_or_else(crate::unix_millis);

        log::info!(
            "Session built: {}x{} board, seed {}",
            settings.board.rows,
            settings.board.columns,
            seed
        );

        Ok(GameSession {
            board: Board::new(&settings.board, seed)?,
            score: ScoreSession::new(settings.scoring.clone()),
            stats: StatsTracker::new(stats_storage),
            saves,
            timers: Timers::new(),
            settings,
            events: Vec::new(),
            completed: false,
        })
    }
}

pub struct GameSession {
    settings: Settings,
    timers: Timers,
    board: Board,
    score: ScoreSession,
    stats: StatsTracker,
    saves: Box<dyn SaveSystem>,
    events: Vec<GameEvent>,
    completed: bool,
}

impl GameSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> &ScoreSession {
        &self.score
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn game_time_secs(&self) -> f32 {
        self.score.game_time_secs(self.timers.now_ms())
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deal a new board and start scoring
    pub fn start(&mut self) {
        self.board.setup(&mut self.timers);
        self.score.start_game(&mut self.timers);
        self.stats.start_new_game();
        self.completed = false;
        self.events.push(GameEvent::GameStarted);
        self.collect_events();
        log::info!("Game started");
    }

    pub fn restart(&mut self) {
        self.board.restart(&mut self.timers);
        self.score.restart(&mut self.timers);
        self.stats.start_new_game();
        self.completed = false;
        self.events.push(GameEvent::GameStarted);
        self.collect_events();
        log::info!("Game restarted");
    }

    pub fn select(&mut self, index: usize) -> Pick {
        let pick = self.board.select(index, &mut self.timers);
        if let Pick::Ignored(reason) = pick {
            log::debug!("Pick on card {} ignored: {:?}", index, reason);
        }
        self.collect_events();
        pick
    }

    /// Run the clock forward, firing every timer due on the way
    pub fn advance(&mut self, dt_ms: u64) {
        let target = self.timers.now_ms().saturating_add(dt_ms);
        while let Some((id, kind)) = self.timers.pop_due(target) {
            match kind {
                TimerKind::InitialReveal => {
                    self.board.finish_initial_reveal(id);
                }
                TimerKind::MatchCheck => {
                    if let Some(outcome) = self.board.resolve_match_check(id) {
                        self.collect_events();
                        self.handle_outcome(outcome);
                    }
                }
                TimerKind::ComboDecay => {
                    self.score.on_decay_timer(id);
                }
            }
            self.collect_events();
        }
        self.timers.advance_to(target);
    }

    pub fn advance_secs(&mut self, secs: f32) {
        self.advance(secs_to_ms(secs));
    }

    fn handle_outcome(&mut self, outcome: MatchOutcome) {
        self.events.push(GameEvent::MatchAttempted {
            success: outcome.success,
        });
        if outcome.success {
            self.score.on_successful_match(outcome.position, &mut self.timers);
        } else {
            self.score.on_failed_match(outcome.position, &mut self.timers);
        }
        // Combo first so max_combo is current when the move is recorded
        self.collect_events();
        self.stats.record_move(outcome.success);
        self.collect_events();

        if outcome.completed {
            self.complete();
        }
    }

    /// Finish the game now, clearing the board or not
    pub fn end_game(&mut self) -> Option<GameStats> {
        if self.completed {
            return None;
        }
        self.board.force_complete(&mut self.timers);
        self.complete().map(|_| self.stats.stats().clone())
    }

    fn complete(&mut self) -> Option<FinalTally> {
        if self.completed {
            return None;
        }
        self.completed = true;

        let tally = self.score.end_game(&mut self.timers);
        self.collect_events();

        let game_time = self.score.game_time_secs(self.timers.now_ms());
        self.stats.complete_game(game_time, self.score.total_score());
        if let Err(e) = self.stats.save_high_score() {
            log::error!("Failed to save high score: {}", e);
        }
        self.events.push(GameEvent::GameCompleted);
        self.collect_events();
        tally
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.snapshot(),
            current_score: self.score.current_score(),
            current_combo: self.score.combo() as i32,
            game_time_seconds: self.game_time_secs(),
            total_moves: self.stats.stats().total_moves as i32,
            high_score: self.stats.high_score(),
        }
    }

    pub fn save(&mut self) -> Result<(), SessionError> {
        let snapshot = self.snapshot();
        self.saves.save(&snapshot)?;
        Ok(())
    }

    pub fn has_save(&self) -> bool {
        self.saves.exists()
    }

    pub fn delete_save(&mut self) -> Result<(), SessionError> {
        self.saves.delete()?;
        Ok(())
    }

    /// Replace the running game with the saved one. On error nothing changes.
    pub fn load(&mut self) -> Result<(), SessionError> {
        let snapshot = self.saves.load()?;
        self.apply_snapshot(&snapshot)
    }

    /// Apply a snapshot to board, score and stats, in that order
    pub fn apply_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        self.board.check_snapshot(&snapshot.board)?;

        let report = self.board.restore(&snapshot.board, &mut self.timers)?;
        self.score.restore(
            snapshot.current_score,
            snapshot.current_combo,
            snapshot.game_time_seconds,
            &mut self.timers,
        );
        self.stats.restore(
            snapshot.total_moves,
            self.board.matched_pair_count(),
            snapshot.high_score,
        );
        self.stats.observe_combo(self.score.combo());

        // A save taken after the last pair stays finished; bonuses are already in the score
        self.completed = !self.board.is_active();
        if self.completed {
            self.score.halt(&mut self.timers);
            let game_time = self.game_time_secs();
            self.stats.complete_game(game_time, self.score.total_score());
        }

        self.board.drain_events();
        self.score.drain_events();
        self.stats.drain_events();
        self.events.push(GameEvent::SessionRestored);

        log::info!(
            "Session restored: {} cards, {} pairs matched, score {}",
            report.restored,
            self.board.matched_pair_count(),
            self.score.current_score()
        );
        Ok(())
    }

    /// Move component events into the session queue, feeding combo changes to stats
    fn collect_events(&mut self) {
        self.events.extend(self.board.drain_events());
        for event in self.score.drain_events() {
            if let GameEvent::ComboChanged { combo } = event {
                self.stats.observe_combo(combo);
            }
            self.events.push(event);
        }
        self.events.extend(self.stats.drain_events());
    }
}
