//! Run orchestration: the state machine driving levels, timers, taps,
//! scoring, and persistence.
use serde::{Deserialize, Serialize};

use crate::balance::BalanceData;
use crate::constants::{
    AUTOSAVE_PERIOD_TICKS, CHARACTER_LEVEL_BONUS, FINAL_LEVEL, TIME_LOW_THRESHOLD,
};
use crate::ending::EndingRecord;
use crate::persist::{PersistenceAdapter, RunSummary};
use crate::progress;
use crate::scoring;
use crate::sequence::{SequenceState, TapJudgment};
use crate::state::{GamePhase, SessionState};
use crate::timer::{Countdown, IntervalTimer};
use crate::{BlobStore, Clock};

/// Notifications for the presentation and audio collaborators.
///
/// Events are plain values accumulated per operation and drained by the
/// host; the engine never calls back into a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum GameEvent {
    LevelStarted {
        level: u8,
        target_length: u8,
        time_limit_seconds: u16,
    },
    TapResult {
        value: u8,
        judgment: TapJudgment,
        score_delta: i64,
    },
    ComboChanged {
        combo: u32,
    },
    PerfectTap {
        value: u8,
    },
    LevelCompleted {
        level: u8,
        bonus: i64,
    },
    TimeLow {
        seconds_remaining: u16,
    },
    TimeUp,
    CharacterLeveledUp {
        new_level: u8,
    },
    RunEnded {
        summary: RunSummary,
        ending: EndingRecord,
    },
}

/// Root game session: owns the session state, the active sequence, both
/// timers, and the persistence adapter.
///
/// Everything is synchronous: the host delivers [`GameSession::tick`] once
/// per second, [`GameSession::on_tap`] per input, and the explicit
/// pause/resume/reset calls, so no two stimuli can ever interleave.
#[derive(Debug)]
pub struct GameSession<S: BlobStore, C: Clock> {
    balance: BalanceData,
    state: SessionState,
    sequence: SequenceState,
    countdown: Countdown,
    autosave: IntervalTimer,
    persistence: PersistenceAdapter<S>,
    clock: C,
    events: Vec<GameEvent>,
}

impl<S: BlobStore, C: Clock> GameSession<S, C> {
    /// Build a session over the given balance tables, blob store, and
    /// clock. A saved session younger than 24 hours is restored into the
    /// menu; anything else starts from defaults.
    pub fn new(balance: BalanceData, store: S, clock: C) -> Self {
        let persistence = PersistenceAdapter::new(store);
        let state = persistence.load_snapshot(clock.now_ms()).unwrap_or_default();
        Self {
            balance,
            state,
            sequence: SequenceState::default(),
            countdown: Countdown::default(),
            autosave: IntervalTimer::new(AUTOSAVE_PERIOD_TICKS),
            persistence,
            clock,
            events: Vec::new(),
        }
    }

    /// Begin a fresh run: reset the session state, enter `Playing`, start
    /// the autosave interval, and enter level 1.
    pub fn start(&mut self) {
        self.state = SessionState {
            phase: GamePhase::Playing,
            started_at_epoch_ms: self.clock.now_ms(),
            ..SessionState::default()
        };
        self.sequence = SequenceState::default();
        self.autosave.start();
        self.enter_level(1);
    }

    /// Advance the session by one second.
    ///
    /// Carries both scheduled tasks: the autosave interval (fires every
    /// five ticks, persists only while `Playing`) and the level countdown.
    pub fn tick(&mut self) {
        if self.autosave.tick() && self.state.phase.is_playing() {
            self.persist_snapshot();
        }
        if !self.state.phase.is_playing() {
            return;
        }
        if let Some(remaining) = self.countdown.tick() {
            if remaining == 0 {
                self.push(GameEvent::TimeUp);
                self.handle_time_up();
            } else if remaining <= TIME_LOW_THRESHOLD {
                self.push(GameEvent::TimeLow {
                    seconds_remaining: remaining,
                });
            }
        }
    }

    /// Judge one tapped tile value.
    ///
    /// Dropped silently outside `Playing` and for values outside the active
    /// sequence; both are invalid taps, not errors.
    pub fn on_tap(&mut self, value: u8) {
        if !self.state.phase.is_playing() {
            return;
        }
        if !self.sequence.in_range(value) {
            return;
        }
        self.state.total_taps += 1;
        match self.sequence.judge_tap(value) {
            TapJudgment::Correct => self.handle_correct_tap(value),
            TapJudgment::Incorrect => self.handle_incorrect_tap(value),
        }
    }

    /// Suspend the countdown without losing remaining time. Autosave keeps
    /// ticking but persists nothing while paused.
    pub fn pause(&mut self) {
        if self.state.phase.is_playing() {
            self.state.phase = GamePhase::Paused;
            self.countdown.cancel();
        }
    }

    /// Resume a paused run from the stored remaining time.
    pub fn resume(&mut self) {
        if self.state.phase == GamePhase::Paused {
            self.state.phase = GamePhase::Playing;
            self.countdown.resume();
        }
    }

    /// Finish the run: cancel all timers, resolve the ending, and commit
    /// the run summary to history.
    pub fn end_game(&mut self) {
        if !matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused) {
            return;
        }
        self.state.phase = GamePhase::Ended;
        self.countdown.cancel();
        self.autosave.cancel();

        let now_ms = self.clock.now_ms();
        let play_time_seconds = (now_ms - self.state.started_at_epoch_ms).max(0) / 1_000;
        let ending = self.balance.endings.resolve(self.state.score).clone();
        let summary = RunSummary {
            final_score: self.state.score,
            final_level: self.state.level,
            play_time_seconds,
            accuracy_percent: self.state.accuracy_percent(),
            max_combo: self.state.max_combo,
            ending_id: ending.id.clone(),
            finished_at_epoch_ms: now_ms,
        };
        if let Err(err) = self.persistence.append_history(&summary) {
            log::warn!("failed to record run history: {err}");
        }
        self.push(GameEvent::RunEnded { summary, ending });
    }

    /// Return to the menu from any phase, discarding run state and the
    /// saved session slot.
    pub fn reset(&mut self) {
        self.countdown = Countdown::default();
        self.autosave.cancel();
        self.state = SessionState::default();
        self.sequence = SequenceState::default();
        if let Err(err) = self.persistence.clear_snapshot() {
            log::warn!("failed to clear saved session: {err}");
        }
    }

    /// Take all events emitted since the previous drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.state.phase
    }

    #[must_use]
    pub const fn remaining_seconds(&self) -> u16 {
        self.countdown.remaining()
    }

    #[must_use]
    pub const fn sequence(&self) -> &SequenceState {
        &self.sequence
    }

    #[must_use]
    pub const fn balance(&self) -> &BalanceData {
        &self.balance
    }

    /// Recorded run history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<RunSummary> {
        self.persistence.load_history()
    }

    fn enter_level(&mut self, level: u8) {
        self.state.level = level;
        let (target_length, time_limit_seconds) = match self.balance.balance_for(level) {
            Some(row) => (row.sequence_length, row.time_limit_seconds),
            None => {
                // All configured levels exhausted: natural end of the run.
                self.end_game();
                return;
            }
        };
        self.sequence.begin_level(target_length);
        self.countdown.start(time_limit_seconds);
        self.push(GameEvent::LevelStarted {
            level,
            target_length,
            time_limit_seconds,
        });
    }

    fn handle_correct_tap(&mut self, value: u8) {
        self.state.correct_taps += 1;
        progress::record_correct_tap(&mut self.state);

        let remaining = self.countdown.remaining();
        let delta = scoring::tap_score(remaining, self.state.combo, self.level_multiplier());
        self.state.score += delta;

        self.push(GameEvent::TapResult {
            value,
            judgment: TapJudgment::Correct,
            score_delta: delta,
        });
        self.push(GameEvent::ComboChanged {
            combo: self.state.combo,
        });
        if scoring::is_perfect_timing(remaining, self.sequence.target_length()) {
            self.push(GameEvent::PerfectTap { value });
        }

        if self.sequence.is_complete() {
            self.handle_level_complete();
        }
    }

    fn handle_incorrect_tap(&mut self, value: u8) {
        progress::record_incorrect_tap(&mut self.state);
        let new_score = scoring::incorrect_penalty(self.state.score);
        let delta = new_score - self.state.score;
        self.state.score = new_score;

        self.push(GameEvent::TapResult {
            value,
            judgment: TapJudgment::Incorrect,
            score_delta: delta,
        });
        self.push(GameEvent::ComboChanged { combo: 0 });
    }

    fn handle_level_complete(&mut self) {
        self.countdown.cancel();
        let level = self.state.level;
        let remaining = self.countdown.remaining();

        let bonus = scoring::completion_bonus(self.level_multiplier(), remaining);
        self.state.score += bonus;
        self.state.currency += scoring::currency_earned(self.state.score);
        progress::apply_level_products(&mut self.state, level);
        if let Some(new_level) = progress::recompute_character_level(&mut self.state, level) {
            self.state.score += i64::from(new_level) * CHARACTER_LEVEL_BONUS;
            self.push(GameEvent::CharacterLeveledUp { new_level });
        }
        self.push(GameEvent::LevelCompleted { level, bonus });
        self.persist_snapshot();

        if level >= FINAL_LEVEL {
            self.end_game();
        } else {
            self.enter_level(level + 1);
        }
    }

    fn handle_time_up(&mut self) {
        self.countdown.cancel();
        if self.sequence.tapped_count() == 0 {
            // No progress at all: the run is over.
            self.end_game();
            return;
        }
        self.state.score = scoring::time_up_decay(self.state.score);
        let level = self.state.level;
        if level >= FINAL_LEVEL {
            self.end_game();
        } else {
            self.enter_level(level + 1);
        }
    }

    fn level_multiplier(&self) -> f64 {
        self.balance
            .balance_for(self.state.level)
            .map_or(1.0, |row| row.score_multiplier)
    }

    fn persist_snapshot(&mut self) {
        if let Err(err) = self
            .persistence
            .save_snapshot(&self.state, self.clock.now_ms())
        {
            log::warn!("session autosave failed: {err}");
        }
    }

    fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStore {
        blobs: Rc<RefCell<HashMap<String, String>>>,
    }

    impl BlobStore for MemoryStore {
        type Error = Infallible;

        fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.blobs.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
            self.blobs
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), Self::Error> {
            self.blobs.borrow_mut().remove(key);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<i64>>);

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.get()
        }
    }

    fn new_session() -> GameSession<MemoryStore, ManualClock> {
        GameSession::new(
            BalanceData::load_from_static(),
            MemoryStore::default(),
            ManualClock::default(),
        )
    }

    fn clear_level(session: &mut GameSession<MemoryStore, ManualClock>) {
        let length = session.sequence().target_length();
        for value in 1..=length {
            session.on_tap(value);
        }
    }

    #[test]
    fn taps_outside_playing_are_dropped() {
        let mut session = new_session();
        session.on_tap(1);
        assert_eq!(session.state().total_taps, 0);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn out_of_range_taps_are_dropped() {
        let mut session = new_session();
        session.start();
        session.drain_events();
        session.on_tap(0);
        session.on_tap(99);
        assert_eq!(session.state().total_taps, 0);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn correct_tap_scores_and_emits() {
        let mut session = new_session();
        session.start();
        session.drain_events();

        session.on_tap(1);
        let state = session.state();
        assert_eq!(state.combo, 1);
        assert_eq!(state.correct_taps, 1);
        // 10 * 15 remaining * 1.0 combo * 1.0 level multiplier
        assert_eq!(state.score, 150);

        let events = session.drain_events();
        assert_eq!(
            events[0],
            GameEvent::TapResult {
                value: 1,
                judgment: TapJudgment::Correct,
                score_delta: 150,
            }
        );
        assert_eq!(events[1], GameEvent::ComboChanged { combo: 1 });
    }

    #[test]
    fn incorrect_tap_resets_combo_and_penalizes() {
        let mut session = new_session();
        session.start();
        session.on_tap(1);
        session.drain_events();

        session.on_tap(3);
        let state = session.state();
        assert_eq!(state.combo, 0);
        assert_eq!(state.score, 145);
        assert_eq!(state.total_taps, 2);
        assert_eq!(state.correct_taps, 1);

        let events = session.drain_events();
        assert_eq!(
            events[0],
            GameEvent::TapResult {
                value: 3,
                judgment: TapJudgment::Incorrect,
                score_delta: -5,
            }
        );
        assert_eq!(events[1], GameEvent::ComboChanged { combo: 0 });
    }

    #[test]
    fn penalty_never_drives_score_negative() {
        let mut session = new_session();
        session.start();
        session.drain_events();
        session.on_tap(2);
        assert_eq!(session.state().score, 0);
    }

    #[test]
    fn completing_a_level_advances_and_pays_out() {
        let mut session = new_session();
        session.start();
        session.drain_events();

        clear_level(&mut session);

        let state = session.state();
        assert_eq!(state.level, 2);
        // Taps: 150 + 165 + 180 + 195 + 210 = 900; bonus 50 + 15*5 = 125.
        assert_eq!(state.score, 1025);
        assert_eq!(state.currency, 102);
        assert_eq!(state.products.coffee, 1);
        assert_eq!(state.combo, 5);

        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LevelCompleted {
            level: 1,
            bonus: 125,
        }));
        assert!(events.contains(&GameEvent::LevelStarted {
            level: 2,
            target_length: 5,
            time_limit_seconds: 14,
        }));
    }

    #[test]
    fn combo_carries_across_level_boundaries() {
        let mut session = new_session();
        session.start();
        clear_level(&mut session);
        assert_eq!(session.state().combo, 5);

        session.on_tap(1);
        assert_eq!(session.state().combo, 6);
        assert_eq!(session.state().max_combo, 6);
    }

    #[test]
    fn character_levels_up_after_third_level() {
        let mut session = new_session();
        session.start();
        clear_level(&mut session);
        clear_level(&mut session);
        assert_eq!(session.state().character_level, 1);
        session.drain_events();

        clear_level(&mut session);
        assert_eq!(session.state().character_level, 2);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::CharacterLeveledUp { new_level: 2 }));
    }

    #[test]
    fn countdown_emits_low_time_then_time_up() {
        let mut session = new_session();
        session.start();
        session.on_tap(1);
        session.drain_events();

        // Level 1 allows 15 seconds; burn down to the warning band.
        for _ in 0..11 {
            session.tick();
        }
        assert_eq!(session.remaining_seconds(), 4);
        assert!(session.drain_events().is_empty());

        session.tick();
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::TimeLow {
                seconds_remaining: 3
            }]
        );

        session.tick();
        session.tick();
        session.tick();
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::TimeUp));
        // One correct tap happened, so the run continues on level 2.
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.state().level, 2);
    }

    #[test]
    fn time_up_with_progress_decays_score() {
        let mut session = new_session();
        session.start();
        session.on_tap(1);
        assert_eq!(session.state().score, 150);

        for _ in 0..15 {
            session.tick();
        }
        assert_eq!(session.state().score, 105);
        assert_eq!(session.state().level, 2);
        // No payout on a timed-out level.
        assert_eq!(session.state().currency, 0);
        assert_eq!(session.state().products.coffee, 0);
    }

    #[test]
    fn time_up_with_no_progress_ends_the_run() {
        let mut session = new_session();
        session.start();
        for _ in 0..15 {
            session.tick();
        }
        assert_eq!(session.phase(), GamePhase::Ended);
        let events = session.drain_events();
        assert!(
            events
                .iter()
                .any(|event| matches!(event, GameEvent::RunEnded { .. }))
        );
    }

    #[test]
    fn pause_freezes_countdown_and_drops_taps() {
        let mut session = new_session();
        session.start();
        session.tick();
        assert_eq!(session.remaining_seconds(), 14);

        session.pause();
        assert_eq!(session.phase(), GamePhase::Paused);
        for _ in 0..10 {
            session.tick();
        }
        assert_eq!(session.remaining_seconds(), 14);
        session.on_tap(1);
        assert_eq!(session.state().total_taps, 0);

        session.resume();
        session.tick();
        assert_eq!(session.remaining_seconds(), 13);
    }

    #[test]
    fn resume_outside_paused_is_inert() {
        let mut session = new_session();
        session.resume();
        assert_eq!(session.phase(), GamePhase::Menu);
        session.start();
        session.resume();
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn autosave_persists_every_five_ticks_while_playing() {
        let store = MemoryStore::default();
        let mut session = GameSession::new(
            BalanceData::load_from_static(),
            store.clone(),
            ManualClock::default(),
        );
        session.start();
        session.on_tap(1);

        for _ in 0..4 {
            session.tick();
        }
        assert!(!store.blobs.borrow().contains_key("current-session"));
        session.tick();
        assert!(store.blobs.borrow().contains_key("current-session"));
    }

    #[test]
    fn autosave_skips_paused_sessions() {
        let store = MemoryStore::default();
        let mut session = GameSession::new(
            BalanceData::load_from_static(),
            store.clone(),
            ManualClock::default(),
        );
        session.start();
        session.pause();
        for _ in 0..20 {
            session.tick();
        }
        assert!(!store.blobs.borrow().contains_key("current-session"));
    }

    #[test]
    fn ended_run_appends_bounded_history() {
        let mut session = new_session();
        for _ in 0..12 {
            session.start();
            for _ in 0..15 {
                session.tick();
            }
            assert_eq!(session.phase(), GamePhase::Ended);
        }
        let history = session.history();
        assert_eq!(history.len(), 10);
        assert!(history.iter().all(|summary| summary.ending_id == "newbie"));
    }

    #[test]
    fn reset_returns_to_menu_and_clears_slot() {
        let store = MemoryStore::default();
        let mut session = GameSession::new(
            BalanceData::load_from_static(),
            store.clone(),
            ManualClock::default(),
        );
        session.start();
        session.on_tap(1);
        for _ in 0..5 {
            session.tick();
        }
        assert!(store.blobs.borrow().contains_key("current-session"));

        session.reset();
        assert_eq!(session.phase(), GamePhase::Menu);
        assert_eq!(session.state().score, 0);
        assert!(!store.blobs.borrow().contains_key("current-session"));
    }

    #[test]
    fn fresh_snapshot_restores_into_menu() {
        let store = MemoryStore::default();
        let clock = ManualClock::default();
        let mut session = GameSession::new(
            BalanceData::load_from_static(),
            store.clone(),
            clock.clone(),
        );
        session.start();
        clear_level(&mut session);
        let saved_score = session.state().score;

        let restored = GameSession::new(BalanceData::load_from_static(), store, clock);
        assert_eq!(restored.phase(), GamePhase::Menu);
        assert_eq!(restored.state().score, saved_score);
        // The slot is written on completion, before the level advances.
        assert_eq!(restored.state().level, 1);
    }

    #[test]
    fn stale_snapshot_is_discarded() {
        let store = MemoryStore::default();
        let clock = ManualClock::default();
        let mut session = GameSession::new(
            BalanceData::load_from_static(),
            store.clone(),
            clock.clone(),
        );
        session.start();
        clear_level(&mut session);

        clock.0.set(24 * 60 * 60 * 1_000);
        let restored = GameSession::new(BalanceData::load_from_static(), store, clock);
        assert_eq!(restored.state(), &SessionState::default());
    }

    #[test]
    fn empty_balance_ends_immediately_on_start() {
        let mut session = GameSession::new(
            BalanceData::empty(),
            MemoryStore::default(),
            ManualClock::default(),
        );
        session.start();
        assert_eq!(session.phase(), GamePhase::Ended);
        let events = session.drain_events();
        assert!(
            events
                .iter()
                .any(|event| matches!(event, GameEvent::RunEnded { ending, .. } if ending.id == "newbie"))
        );
    }
}
