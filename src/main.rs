//! Memory Match entry point
//!
//! Headless native runner: plays one session with an autoplayer that remembers
//! every card it has flipped, saves half-way, reloads the save into a fresh
//! session and finishes the game.
//!
//! Usage: `memory-match [preset] [seed]` (preset: 2x2, 2x3, 5x6, 6x8)

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::BTreeMap;

    use memory_match::persistence::{FileStorage, StorageSaveSystem};
    use memory_match::sim::{Board, GameSession, Pick, SessionError};
    use memory_match::{GridPreset, Settings, secs_to_ms, unix_millis};

    /// Simulated frame step
    const FRAME_MS: u64 = 16;
    /// Pause between the autoplayer's turns
    const THINK_MS: u64 = 450;
    /// Hard stop in case the board gets stuck
    const MAX_TURNS: usize = 1_000;

    /// Player with perfect recall of every card it has seen face-up
    #[derive(Default)]
    struct AutoPlayer {
        seen: BTreeMap<usize, String>,
    }

    impl AutoPlayer {
        fn remember(&mut self, board: &Board, index: usize) {
            if let Some(card) = board.card(index) {
                self.seen.insert(index, card.identity.clone());
            }
        }

        /// Two remembered, still-pickable cards with the same face
        fn known_pair(&self, board: &Board) -> Option<(usize, usize)> {
            let mut first_of: BTreeMap<&str, usize> = BTreeMap::new();
            for (&index, identity) in &self.seen {
                if !board.card(index).is_some_and(|c| c.can_pick()) {
                    continue;
                }
                if let Some(&other) = first_of.get(identity.as_str()) {
                    return Some((other, index));
                }
                first_of.insert(identity, index);
            }
            None
        }

        fn partner_of(&self, board: &Board, index: usize) -> Option<usize> {
            let identity = self.seen.get(&index)?;
            self.seen
                .iter()
                .find(|&(&i, id)| {
                    i != index && id == identity && board.card(i).is_some_and(|c| c.can_pick())
                })
                .map(|(&i, _)| i)
        }

        fn fresh_card(&self, board: &Board, skip: Option<usize>) -> Option<usize> {
            let pickable =
                |i: usize| Some(i) != skip && board.card(i).is_some_and(|c| c.can_pick());
            let count = board.cards().len();
            (0..count)
                .find(|&i| pickable(i) && !self.seen.contains_key(&i))
                .or_else(|| (0..count).find(|&i| pickable(i)))
        }

        /// Flip two cards. Returns false when nothing is left to pick.
        fn take_turn(&mut self, session: &mut GameSession) -> bool {
            let (first, second) = match self.known_pair(session.board()) {
                Some(pair) => pair,
                None => {
                    let Some(first) = self.fresh_card(session.board(), None) else {
                        return false;
                    };
                    session.select(first);
                    self.remember(session.board(), first);
                    let second = self
                        .partner_of(session.board(), first)
                        .or_else(|| self.fresh_card(session.board(), Some(first)));
                    let Some(second) = second else {
                        return false;
                    };
                    session.select(second);
                    self.remember(session.board(), second);
                    return true;
                }
            };

            if session.select(first) != Pick::First || session.select(second) != Pick::Second {
                log::warn!("Autoplayer pick on {} / {} was refused", first, second);
            }
            true
        }
    }

    /// Run the clock for `ms`, one frame at a time
    fn idle(session: &mut GameSession, ms: u64) {
        let mut left = ms;
        while left > 0 {
            let step = left.min(FRAME_MS);
            session.advance(step);
            left -= step;
        }
    }

    fn build(
        settings: &Settings,
        seed: u64,
        storage: &FileStorage,
    ) -> Result<GameSession, SessionError> {
        GameSession::builder()
            .settings(settings.clone())
            .seed(seed)
            .save_system(StorageSaveSystem::new(storage.clone()))
            .stats_storage(storage.clone())
            .build()
    }

    pub fn run(preset: GridPreset, seed: u64) -> Result<(), SessionError> {
        let dir = std::env::temp_dir().join("memory-match");
        let storage = FileStorage::new(&dir)?;
        log::info!("Using storage at {}", storage.base_dir().display());

        let settings = Settings::from_preset(preset);
        settings.save(&storage)?;

        let mut session = build(&settings, seed, &storage)?;
        session.start();
        idle(&mut session, secs_to_ms(settings.board.initial_reveal_secs) + FRAME_MS);

        let mut player = AutoPlayer::default();
        let half = session.board().total_pairs() / 2;
        let mut reloaded = false;

        for _ in 0..MAX_TURNS {
            if session.is_completed() || !player.take_turn(&mut session) {
                break;
            }
            idle(&mut session, THINK_MS);

            let past_half = session.board().matched_pair_count() >= half.max(1);
            if !reloaded && past_half && !session.is_completed() {
                session.save()?;
                println!(
                    "Saved at {} / {} pairs, {}",
                    session.board().matched_pair_count(),
                    session.board().total_pairs(),
                    session.score().score_text()
                );

                // Pick up the save in a brand new session, as a relaunch would
                let mut resumed = build(&settings, seed.wrapping_add(1), &storage)?;
                resumed.load()?;
                session = resumed;
                reloaded = true;
                println!("Reloaded save, game time {:.1}s", session.game_time_secs());
            }

            for event in session.drain_events() {
                log::debug!("{:?}", event);
            }
        }

        if !session.is_completed() {
            log::warn!("Autoplayer gave up; ending the game early");
            session.end_game();
        }
        session.delete_save()?;

        println!("\n{}", session.stats().stats().summary());
        println!("High score: {}", session.stats().high_score());
        Ok(())
    }

    pub fn main() {
        env_logger::init();
        log::info!("Memory Match (native) starting...");

        let mut args = std::env::args().skip(1);
        let preset = args
            .next()
            .and_then(|s| GridPreset::from_str(&s))
            .unwrap_or(GridPreset::Medium);
        let seed = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(unix_millis);
        log::info!("Preset {} with seed {}", preset.as_str(), seed);

        if let Err(e) = run(preset, seed) {
            log::error!("Session failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    use memory_match::persistence::WebStorage;
    use memory_match::{HighScores, Settings};

    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Memory Match (web) starting...");

    // No front end here; report what a host page would resume from
    match WebStorage::local() {
        Ok(storage) => {
            let settings = Settings::load(&storage);
            let scores = HighScores::load(&storage);
            log::info!(
                "Board {}x{}, high score {}",
                settings.board.rows,
                settings.board.columns,
                scores.best()
            );
        }
        Err(e) => log::error!("{}", e),
    }
}
