//! Score, combo and multiplier engine
//!
//! A combo continues when the gap since the previous match lies within
//! `[min_time_between_matches, combo_time_window]`; anything else starts a new
//! streak. Each match (re)arms a single decay timer that breaks the combo if no
//! further match arrives inside the window.

use glam::Vec3;

use super::events::GameEvent;
use super::timer::{TimerId, TimerKind, Timers};
use crate::settings::ScoringSettings;
use crate::{ms_to_secs, secs_to_ms};

/// End-of-game bonus breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalTally {
    pub time_bonus: i32,
    pub completion_bonus: i32,
    pub final_score: i32,
}

/// `1234567` -> `"1,234,567"`
pub fn format_thousands(value: i32) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub struct ScoreSession {
    settings: ScoringSettings,
    current_score: i32,
    /// Running ledger of every delta this game
    total_score: i32,
    combo: u32,
    multiplier: f32,
    last_match_ms: Option<u64>,
    started_at_ms: Option<u64>,
    /// Play time carried in from a restored save
    carried_ms: u64,
    ended_at_ms: Option<u64>,
    decay_timer: Option<TimerId>,
    active: bool,
    events: Vec<GameEvent>,
}

impl ScoreSession {
    pub fn new(settings: ScoringSettings) -> Self {
        Self {
            settings,
            current_score: 0,
            total_score: 0,
            combo: 0,
            multiplier: 1.0,
            last_match_ms: None,
            started_at_ms: None,
            carried_ms: 0,
            ended_at_ms: None,
            decay_timer: None,
            active: false,
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    pub fn current_score(&self) -> i32 {
        self.current_score
    }

    pub fn total_score(&self) -> i32 {
        self.total_score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn decay_pending(&self) -> bool {
        self.decay_timer.is_some()
    }

    /// Played time; frozen once the game ends
    pub fn game_time_ms(&self, now_ms: u64) -> u64 {
        let running = match self.started_at_ms {
            Some(start) => self.ended_at_ms.unwrap_or(now_ms).saturating_sub(start),
            None => 0,
        };
        self.carried_ms + running
    }

    pub fn game_time_secs(&self, now_ms: u64) -> f32 {
        ms_to_secs(self.game_time_ms(now_ms))
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn score_text(&self) -> String {
        format!("Score: {}", format_thousands(self.current_score))
    }

    /// Empty unless a streak of two or more is running
    pub fn combo_text(&self) -> String {
        if self.combo <= 1 {
            return String::new();
        }
        format!("Combo: {}x", self.combo)
    }

    pub fn total_score_text(&self) -> String {
        format!("Total: {}", format_thousands(self.total_score))
    }

    pub fn start_game(&mut self, timers: &mut Timers) {
        self.reset(timers);
        self.started_at_ms = Some(timers.now_ms());
        self.active = true;
        log::debug!("Score session started at {}ms", timers.now_ms());
    }

    pub fn restart(&mut self, timers: &mut Timers) {
        self.start_game(timers);
    }

    fn reset(&mut self, timers: &mut Timers) {
        self.cancel_decay(timers);
        self.current_score = 0;
        self.total_score = 0;
        self.combo = 0;
        self.multiplier = 1.0;
        self.last_match_ms = None;
        self.started_at_ms = None;
        self.carried_ms = 0;
        self.ended_at_ms = None;
        self.active = false;

        self.events.push(GameEvent::ScoreChanged {
            score: 0,
            delta: 0,
            position: None,
        });
        self.events.push(GameEvent::TotalScoreChanged { total: 0 });
        self.push_combo_events();
    }

    /// Score a successful match. Returns the points awarded (0 when inactive).
    pub fn on_successful_match(&mut self, position: Vec3, timers: &mut Timers) -> i32 {
        if !self.active {
            return 0;
        }
        let now = timers.now_ms();
        let min_gap = secs_to_ms(self.settings.min_time_between_matches_secs);
        let window = secs_to_ms(self.settings.combo_time_window_secs);
        // A broken streak never continues, whatever the gap
        let continues = self.combo >= 1
            && self.last_match_ms.is_some_and(|last| {
                let gap = now.saturating_sub(last);
                gap >= min_gap && gap <= window
            });
        self.last_match_ms = Some(now);

        if continues {
            self.combo += 1;
            self.multiplier = self.multiplier_for(self.combo);
        } else {
            self.combo = 1;
            self.multiplier = 1.0;
            self.events.push(GameEvent::ComboStarted);
        }
        self.push_combo_events();

        let points = self.match_points();
        self.add_score(points, Some(position));

        self.cancel_decay(timers);
        self.decay_timer = Some(timers.schedule(window, TimerKind::ComboDecay));

        log::debug!(
            "Match scored {} (combo {}, x{})",
            points,
            self.combo,
            self.multiplier
        );
        points
    }

    /// Apply the optional penalty and break the combo straight away
    pub fn on_failed_match(&mut self, position: Vec3, timers: &mut Timers) {
        if !self.active {
            return;
        }
        if self.settings.apply_failed_match_penalty {
            self.add_score(self.settings.failed_match_penalty, Some(position));
        }
        self.cancel_decay(timers);
        self.break_combo();
    }

    /// Decay timer fired. Returns false for a stale or unknown id.
    pub fn on_decay_timer(&mut self, id: TimerId) -> bool {
        if self.decay_timer != Some(id) {
            return false;
        }
        self.decay_timer = None;
        self.break_combo();
        true
    }

    /// Add the time and completion bonuses and freeze the session
    pub fn end_game(&mut self, timers: &mut Timers) -> Option<FinalTally> {
        if !self.active {
            return None;
        }
        self.cancel_decay(timers);
        self.ended_at_ms = Some(timers.now_ms());

        let played = self.game_time_secs(timers.now_ms());
        let time_bonus = ((played * self.settings.time_bonus_per_second).round_ties_even()
            as i32)
            .min(self.settings.max_time_bonus);
        if time_bonus > 0 {
            self.add_score(time_bonus, None);
        }
        let completion_bonus = self.settings.game_completion_bonus;
        self.add_score(completion_bonus, None);
        self.active = false;

        log::info!(
            "Game over after {:.1}s: time bonus {}, final score {}",
            played,
            time_bonus.max(0),
            self.total_score
        );
        Some(FinalTally {
            time_bonus: time_bonus.max(0),
            completion_bonus,
            final_score: self.total_score,
        })
    }

    /// Stop the clock and refuse further scoring without adding bonuses
    pub fn halt(&mut self, timers: &mut Timers) {
        self.cancel_decay(timers);
        if self.ended_at_ms.is_none() {
            self.ended_at_ms = Some(timers.now_ms());
        }
        self.active = false;
    }

    /// Resume from saved values; the game clock picks up from `game_time_secs`
    pub fn restore(&mut self, score: i32, combo: i32, game_time_secs: f32, timers: &mut Timers) {
        self.cancel_decay(timers);
        let now = timers.now_ms();
        self.current_score = score;
        self.total_score = score;
        self.combo = combo.max(0) as u32;
        self.multiplier = self.multiplier_for(self.combo);
        self.carried_ms = secs_to_ms(game_time_secs);
        self.started_at_ms = Some(now);
        self.ended_at_ms = None;
        self.active = true;

        if self.combo > 0 {
            // Give a restored streak a fresh window
            self.last_match_ms = Some(now);
            let window = secs_to_ms(self.settings.combo_time_window_secs);
            self.decay_timer = Some(timers.schedule(window, TimerKind::ComboDecay));
        } else {
            self.last_match_ms = None;
        }

        self.events.push(GameEvent::ScoreChanged {
            score,
            delta: 0,
            position: None,
        });
        self.events.push(GameEvent::TotalScoreChanged { total: score });
        self.push_combo_events();
    }

    /// Multiplier a streak of `combo` would have built up to
    fn multiplier_for(&self, combo: u32) -> f32 {
        if combo <= 1 {
            return 1.0;
        }
        (1.0 + (combo - 1) as f32 * self.settings.combo_multiplier_increment)
            .min(self.settings.max_combo_multiplier)
    }

    fn match_points(&self) -> i32 {
        let base = self.settings.base_match_score;
        base.saturating_add((base as f32 * (self.multiplier - 1.0)).round_ties_even() as i32)
    }

    fn add_score(&mut self, delta: i32, position: Option<Vec3>) {
        self.current_score = self.current_score.saturating_add(delta);
        self.total_score = self.total_score.saturating_add(delta);
        self.events.push(GameEvent::ScoreChanged {
            score: self.current_score,
            delta,
            position,
        });
        self.events.push(GameEvent::TotalScoreChanged {
            total: self.total_score,
        });
    }

    fn break_combo(&mut self) {
        if self.combo > 1 {
            self.events.push(GameEvent::ComboBroken);
        }
        self.combo = 0;
        self.multiplier = 1.0;
        self.last_match_ms = None;
        self.push_combo_events();
    }

    fn cancel_decay(&mut self, timers: &mut Timers) {
        if let Some(id) = self.decay_timer.take() {
            timers.cancel(id);
        }
    }

    fn push_combo_events(&mut self) {
        self.events.push(GameEvent::ComboChanged { combo: self.combo });
        self.events.push(GameEvent::MultiplierChanged {
            multiplier: self.multiplier,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (ScoreSession, Timers) {
        let mut timers = Timers::new();
        let mut score = ScoreSession::new(ScoringSettings::default());
        score.start_game(&mut timers);
        (score, timers)
    }

    /// Advance to `ms`, firing decay timers on the way
    fn run_to(score: &mut ScoreSession, timers: &mut Timers, ms: u64) {
        while let Some((id, kind)) = timers.pop_due(ms) {
            assert_eq!(kind, TimerKind::ComboDecay);
            score.on_decay_timer(id);
        }
        timers.advance_to(ms);
    }

    #[test]
    fn test_first_match_starts_combo() {
        let (mut score, mut timers) = session();
        let points = score.on_successful_match(Vec3::ZERO, &mut timers);
        assert_eq!(points, 100);
        assert_eq!(score.combo(), 1);
        assert_eq!(score.multiplier(), 1.0);
        assert!(score.drain_events().contains(&GameEvent::ComboStarted));
    }

    #[test]
    fn test_combo_window_exceeded_restarts_streak() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        run_to(&mut score, &mut timers, 1_000);
        score.on_successful_match(Vec3::ZERO, &mut timers);
        assert_eq!(score.combo(), 2);
        run_to(&mut score, &mut timers, 5_000);
        score.on_successful_match(Vec3::ZERO, &mut timers);
        assert_eq!(score.combo(), 1);
        assert_eq!(score.multiplier(), 1.0);
    }

    #[test]
    fn test_too_fast_does_not_continue() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        run_to(&mut score, &mut timers, 400);
        score.on_successful_match(Vec3::ZERO, &mut timers);
        assert_eq!(score.combo(), 1);
    }

    #[test]
    fn test_decay_breaks_combo() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        assert!(score.decay_pending());
        run_to(&mut score, &mut timers, 2_999);
        assert_eq!(score.combo(), 1);
        run_to(&mut score, &mut timers, 3_000);
        assert_eq!(score.combo(), 0);
        assert_eq!(score.multiplier(), 1.0);
        assert!(!score.decay_pending());
    }

    #[test]
    fn test_only_one_decay_timer_live() {
        let (mut score, mut timers) = session();
        for t in [0, 1_000, 2_000, 3_000] {
            run_to(&mut score, &mut timers, t);
            score.on_successful_match(Vec3::ZERO, &mut timers);
            assert_eq!(timers.pending_of(TimerKind::ComboDecay), 1);
        }
        assert_eq!(score.combo(), 4);
    }

    #[test]
    fn test_match_after_failed_match_starts_fresh_streak() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        run_to(&mut score, &mut timers, 1_000);
        score.on_failed_match(Vec3::ZERO, &mut timers);
        run_to(&mut score, &mut timers, 2_000);
        score.drain_events();

        let points = score.on_successful_match(Vec3::ZERO, &mut timers);
        assert_eq!(points, 100);
        assert_eq!(score.combo(), 1);
        assert_eq!(score.multiplier(), 1.0);
        assert!(score.drain_events().contains(&GameEvent::ComboStarted));
    }

    #[test]
    fn test_match_at_decay_deadline_starts_fresh_streak() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        run_to(&mut score, &mut timers, 3_000);
        assert_eq!(score.combo(), 0);

        let points = score.on_successful_match(Vec3::ZERO, &mut timers);
        assert_eq!(points, 100);
        assert_eq!(score.combo(), 1);
        assert_eq!(score.multiplier(), 1.0);
    }

    #[test]
    fn test_restored_huge_score_saturates() {
        let (mut score, mut timers) = session();
        score.restore(i32::MAX, 0, 0.0, &mut timers);
        score.on_successful_match(Vec3::ZERO, &mut timers);
        assert_eq!(score.current_score(), i32::MAX);
        assert_eq!(score.total_score(), i32::MAX);

        score.restore(i32::MIN, 0, 0.0, &mut timers);
        score.on_failed_match(Vec3::ZERO, &mut timers);
        assert_eq!(score.current_score(), i32::MIN);
    }

    #[test]
    fn test_multiplier_three_scores_300() {
        let (mut score, mut timers) = session();
        let mut last = 0;
        for t in [0, 1_000, 2_000] {
            run_to(&mut score, &mut timers, t);
            last = score.on_successful_match(Vec3::ZERO, &mut timers);
        }
        assert_eq!(score.multiplier(), 3.0);
        assert_eq!(last, 300);
        assert_eq!(score.current_score(), 100 + 200 + 300);
    }

    #[test]
    fn test_multiplier_is_capped() {
        let (mut score, mut timers) = session();
        for i in 0..10 {
            run_to(&mut score, &mut timers, i * 1_000);
            score.on_successful_match(Vec3::ZERO, &mut timers);
        }
        assert_eq!(score.combo(), 10);
        assert_eq!(score.multiplier(), 5.0);
    }

    #[test]
    fn test_failed_match_penalty_breaks_combo() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        run_to(&mut score, &mut timers, 1_000);
        score.on_successful_match(Vec3::ZERO, &mut timers);
        let before = score.current_score();
        score.drain_events();

        score.on_failed_match(Vec3::ZERO, &mut timers);
        assert_eq!(score.current_score(), before - 10);
        assert_eq!(score.combo(), 0);
        assert!(!score.decay_pending());
        assert!(score.drain_events().contains(&GameEvent::ComboBroken));
    }

    #[test]
    fn test_penalty_can_be_disabled() {
        let mut timers = Timers::new();
        let mut score = ScoreSession::new(ScoringSettings {
            apply_failed_match_penalty: false,
            ..ScoringSettings::default()
        });
        score.start_game(&mut timers);
        score.on_failed_match(Vec3::ZERO, &mut timers);
        assert_eq!(score.current_score(), 0);
        // Breaking a streak of zero is silent
        assert!(!score.drain_events().contains(&GameEvent::ComboBroken));
    }

    #[test]
    fn test_end_game_bonuses_and_freeze() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        run_to(&mut score, &mut timers, 12_000);

        let tally = score.end_game(&mut timers).unwrap();
        assert_eq!(tally.time_bonus, 120);
        assert_eq!(tally.completion_bonus, 1000);
        assert_eq!(tally.final_score, 100 + 120 + 1000);
        assert_eq!(score.total_score(), tally.final_score);
        assert!(!score.is_active());

        // Frozen
        timers.advance_to(60_000);
        assert_eq!(score.game_time_ms(timers.now_ms()), 12_000);
        assert_eq!(score.on_successful_match(Vec3::ZERO, &mut timers), 0);
        assert_eq!(score.end_game(&mut timers), None);
    }

    #[test]
    fn test_time_bonus_is_capped() {
        let (mut score, mut timers) = session();
        timers.advance_to(10_000_000);
        let tally = score.end_game(&mut timers).unwrap();
        assert_eq!(tally.time_bonus, 5000);
    }

    #[test]
    fn test_restart_resets_everything() {
        let (mut score, mut timers) = session();
        score.on_successful_match(Vec3::ZERO, &mut timers);
        score.restart(&mut timers);
        assert_eq!(score.current_score(), 0);
        assert_eq!(score.total_score(), 0);
        assert_eq!(score.combo(), 0);
        assert_eq!(timers.pending_of(TimerKind::ComboDecay), 0);
        assert!(score.is_active());
    }

    #[test]
    fn test_restore_derives_multiplier_and_clock() {
        let mut timers = Timers::new();
        timers.advance_to(500);
        let mut score = ScoreSession::new(ScoringSettings::default());
        score.restore(1_450, 3, 42.0, &mut timers);

        assert_eq!(score.current_score(), 1_450);
        assert_eq!(score.total_score(), 1_450);
        assert_eq!(score.combo(), 3);
        assert_eq!(score.multiplier(), 3.0);
        assert!(score.decay_pending());
        assert_eq!(score.game_time_ms(timers.now_ms()), 42_000);
        timers.advance_to(1_500);
        assert_eq!(score.game_time_ms(timers.now_ms()), 43_000);

        score.restore(10, 1, 0.0, &mut timers);
        assert_eq!(score.multiplier(), 1.0);
        assert_eq!(timers.pending_of(TimerKind::ComboDecay), 1);
    }

    #[test]
    fn test_hud_text() {
        let (mut score, mut timers) = session();
        assert_eq!(score.score_text(), "Score: 0");
        assert_eq!(score.combo_text(), "");
        score.restore(1_234_567, 2, 0.0, &mut timers);
        assert_eq!(score.score_text(), "Score: 1,234,567");
        assert_eq!(score.total_score_text(), "Total: 1,234,567");
        assert_eq!(score.combo_text(), "Combo: 2x");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(-12_345), "-12,345");
    }
}
