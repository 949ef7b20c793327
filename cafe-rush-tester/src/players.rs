//! Simulated players and the in-process collaborator implementations the
//! scenarios drive the engine with.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use cafe_rush_game::{BalanceData, BlobStore, Clock, GamePhase, GameSession};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// In-memory blob store standing in for the platform's key/value storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Overwrite a raw blob, bypassing the engine (corruption scenarios).
    pub fn inject(&self, key: &str, value: &str) {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
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

/// Hand-cranked wall clock so scenarios control snapshot freshness.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<i64>>);

impl ManualClock {
    pub fn advance_ms(&self, delta: i64) {
        self.0.set(self.0.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

pub type TesterSession = GameSession<MemoryStore, ManualClock>;

/// Fresh session over the stock balance tables.
#[must_use]
pub fn new_session() -> (TesterSession, MemoryStore, ManualClock) {
    let store = MemoryStore::default();
    let clock = ManualClock::default();
    let session = GameSession::new(
        BalanceData::load_from_static(),
        store.clone(),
        clock.clone(),
    );
    (session, store, clock)
}

/// Tap behavior of a simulated player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerProfile {
    /// Chance of tapping a wrong tile instead of the expected one.
    pub miss_chance: f64,
    /// Whole seconds burned before each tap.
    pub seconds_per_tap: u16,
}

impl PlayerProfile {
    pub const PERFECT: Self = Self {
        miss_chance: 0.0,
        seconds_per_tap: 0,
    };
    pub const SLOPPY: Self = Self {
        miss_chance: 0.25,
        seconds_per_tap: 1,
    };
    pub const SLUGGISH: Self = Self {
        miss_chance: 0.05,
        seconds_per_tap: 3,
    };
}

/// Drive a started session with the given profile until the run ends.
///
/// Returns the number of taps issued. `max_taps` bounds runaway loops so a
/// misbehaving engine fails the scenario instead of hanging it.
pub fn drive_run(
    session: &mut TesterSession,
    clock: &ManualClock,
    profile: PlayerProfile,
    rng: &mut ChaCha8Rng,
    max_taps: usize,
) -> usize {
    let mut taps = 0;
    while session.phase() == GamePhase::Playing && taps < max_taps {
        for _ in 0..profile.seconds_per_tap {
            session.tick();
            clock.advance_ms(1_000);
            if session.phase() != GamePhase::Playing {
                return taps;
            }
        }
        let expected = session.sequence().next_expected();
        let target = session.sequence().target_length();
        let value = if profile.miss_chance > 0.0 && rng.gen_bool(profile.miss_chance) {
            // Any in-range value other than the expected one.
            if expected >= target { 1 } else { target }
        } else {
            expected
        };
        session.on_tap(value);
        taps += 1;
    }
    taps
}
