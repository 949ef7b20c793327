//! Session snapshot and run-history persistence.
//!
//! Everything goes through a string-keyed JSON blob store supplied by the
//! platform. Reads are lenient: an absent, corrupt, or stale blob degrades
//! to defaults and is at most logged, never surfaced to gameplay.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BlobStore;
use crate::constants::{
    KEY_CURRENT_SESSION, KEY_RUN_HISTORY, RUN_HISTORY_CAPACITY, SNAPSHOT_FRESHNESS_MS,
};
use crate::state::{GamePhase, ProductCounts, SessionState};

/// Write-side persistence failure.
#[derive(Debug, Error)]
pub enum PersistError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("storage backend: {0}")]
    Store(#[source] E),
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Serialized form of a session, one overwritten slot.
///
/// The phase is deliberately absent: a restored session always re-enters
/// the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    pub level: u8,
    pub score: i64,
    pub currency: i64,
    pub combo: u32,
    pub max_combo: u32,
    pub total_taps: u32,
    pub correct_taps: u32,
    pub character_level: u8,
    #[serde(default)]
    pub products: ProductCounts,
    #[serde(default)]
    pub started_at_epoch_ms: i64,
    pub saved_at_epoch_ms: i64,
}

impl SaveSnapshot {
    fn capture(state: &SessionState, saved_at_epoch_ms: i64) -> Self {
        Self {
            level: state.level,
            score: state.score,
            currency: state.currency,
            combo: state.combo,
            max_combo: state.max_combo,
            total_taps: state.total_taps,
            correct_taps: state.correct_taps,
            character_level: state.character_level,
            products: state.products,
            started_at_epoch_ms: state.started_at_epoch_ms,
            saved_at_epoch_ms,
        }
    }

    fn restore(self) -> SessionState {
        SessionState {
            phase: GamePhase::Menu,
            level: self.level,
            score: self.score,
            currency: self.currency,
            combo: self.combo,
            max_combo: self.max_combo,
            total_taps: self.total_taps,
            correct_taps: self.correct_taps,
            character_level: self.character_level,
            products: self.products,
            started_at_epoch_ms: self.started_at_epoch_ms,
        }
    }
}

/// Immutable record of one finished run, kept in the bounded history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub final_score: i64,
    pub final_level: u8,
    pub play_time_seconds: i64,
    pub accuracy_percent: f64,
    pub max_combo: u32,
    pub ending_id: String,
    pub finished_at_epoch_ms: i64,
}

/// Snapshot and history access over a platform blob store.
#[derive(Debug, Clone)]
pub struct PersistenceAdapter<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> PersistenceAdapter<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Overwrite the current-session slot.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding fails or the backend rejects the
    /// write. Callers treat this as best-effort and keep playing.
    pub fn save_snapshot(
        &self,
        state: &SessionState,
        now_ms: i64,
    ) -> Result<(), PersistError<S::Error>> {
        let snapshot = SaveSnapshot::capture(state, now_ms);
        let blob = serde_json::to_string(&snapshot)?;
        self.store
            .set(KEY_CURRENT_SESSION, &blob)
            .map_err(PersistError::Store)
    }

    /// Restore the saved session when one exists and is fresh.
    ///
    /// Absent, unreadable, corrupt, or stale (24 hours or older) slots all
    /// yield `None`; corruption is logged for diagnostics only.
    #[must_use]
    pub fn load_snapshot(&self, now_ms: i64) -> Option<SessionState> {
        let blob = match self.store.get(KEY_CURRENT_SESSION) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("session snapshot unreadable: {err}");
                return None;
            }
        };
        let snapshot: SaveSnapshot = match serde_json::from_str(&blob) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("session snapshot corrupt, discarding: {err}");
                return None;
            }
        };
        if now_ms - snapshot.saved_at_epoch_ms >= SNAPSHOT_FRESHNESS_MS {
            log::debug!("session snapshot stale, using defaults");
            return None;
        }
        Some(snapshot.restore())
    }

    /// Remove the current-session slot.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the removal.
    pub fn clear_snapshot(&self) -> Result<(), PersistError<S::Error>> {
        self.store
            .remove(KEY_CURRENT_SESSION)
            .map_err(PersistError::Store)
    }

    /// Append a finished run to the history list, evicting the oldest
    /// entries beyond capacity.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding fails or the backend rejects the
    /// write. A corrupt existing list is replaced rather than propagated.
    pub fn append_history(&self, summary: &RunSummary) -> Result<(), PersistError<S::Error>> {
        let mut history = self.load_history();
        history.push(summary.clone());
        if history.len() > RUN_HISTORY_CAPACITY {
            let excess = history.len() - RUN_HISTORY_CAPACITY;
            history.drain(..excess);
        }
        let blob = serde_json::to_string(&history)?;
        self.store
            .set(KEY_RUN_HISTORY, &blob)
            .map_err(PersistError::Store)
    }

    /// The recorded history, oldest first. Absent or corrupt lists read as
    /// empty.
    #[must_use]
    pub fn load_history(&self) -> Vec<RunSummary> {
        let blob = match self.store.get(KEY_RUN_HISTORY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(err) => {
                log::warn!("run history unreadable: {err}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&blob) {
            Ok(history) => history,
            Err(err) => {
                log::warn!("run history corrupt, starting fresh: {err}");
                Vec::new()
            }
        }
    }
}
