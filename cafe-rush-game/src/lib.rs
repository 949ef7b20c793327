//! Cafe Rush Game Engine
//!
//! Platform-agnostic core game logic for the Cafe Rush timed tapping game.
//! This crate provides the level/scoring/progression state machine without
//! UI, audio, or platform-specific dependencies.

pub mod balance;
pub mod constants;
pub mod ending;
pub mod numbers;
pub mod persist;
pub mod progress;
pub mod scoring;
pub mod sequence;
pub mod session;
pub mod state;
pub mod timer;

// Re-export commonly used types
pub use balance::{BalanceData, LevelBalance, ProgressionReward};
pub use ending::{EndingRecord, EndingTable};
pub use persist::{PersistError, PersistenceAdapter, RunSummary, SaveSnapshot};
pub use progress::{
    apply_level_products, record_correct_tap, record_incorrect_tap, recompute_character_level,
};
pub use scoring::{
    completion_bonus, currency_earned, incorrect_penalty, is_perfect_timing, tap_score,
    time_up_decay,
};
pub use sequence::{SequenceState, TapJudgment};
pub use session::{GameEvent, GameSession};
pub use state::{GamePhase, ProductCounts, SessionState};
pub use timer::{Countdown, IntervalTimer};

/// Trait for abstracting balance-table loading operations.
/// Platform-specific implementations should provide this.
pub trait DataSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the level balance, ending, and reward tables from the
    /// platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance data cannot be loaded.
    fn load_balance_data(&self) -> Result<BalanceData, Self::Error>;
}

/// Trait for abstracting the string-keyed JSON blob store backing
/// persistence. Platform-specific implementations should provide this.
pub trait BlobStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a blob, `None` when the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write a blob, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove a blob; removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Wall-clock source, injected so tests and replays can control time.
pub trait Clock {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System wall clock for native hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
            })
    }
}

/// Main game engine binding a data source to a blob store.
pub struct GameEngine<D, S>
where
    D: DataSource,
    S: BlobStore + Clone,
{
    data_source: D,
    store: S,
}

impl<D, S> GameEngine<D, S>
where
    D: DataSource,
    S: BlobStore + Clone,
{
    /// Create a new game engine with the provided data source and store.
    pub const fn new(data_source: D, store: S) -> Self {
        Self { data_source, store }
    }

    /// Construct a session over freshly loaded balance data, restoring any
    /// saved session that is still within the freshness window.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance data cannot be loaded.
    pub fn create_session<C: Clock>(&self, clock: C) -> Result<GameSession<S, C>, anyhow::Error>
    where
        D::Error: Into<anyhow::Error>,
    {
        let balance = self.data_source.load_balance_data().map_err(Into::into)?;
        Ok(GameSession::new(balance, self.store.clone(), clock))
    }
}
