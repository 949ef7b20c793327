//! Centralized tuning constants for Cafe Rush game logic.
//!
//! These values define the deterministic scoring and timer math of the
//! engine. Per-level balance lives in the JSON tables; everything here is
//! fixed arithmetic that only changes through reviewed code.

// Storage keys -------------------------------------------------------------
pub(crate) const KEY_CURRENT_SESSION: &str = "current-session";
pub(crate) const KEY_RUN_HISTORY: &str = "run-history";

// Scoring tuning -----------------------------------------------------------
pub(crate) const TAP_BASE_SCORE: i64 = 10;
pub(crate) const COMBO_STEP: f64 = 0.1;
pub(crate) const INCORRECT_TAP_PENALTY: i64 = 5;
pub(crate) const COMPLETION_BONUS_BASE: f64 = 50.0;
pub(crate) const TIME_BONUS_PER_SECOND: i64 = 5;
pub(crate) const TIME_UP_DECAY_FACTOR: f64 = 0.7;
pub(crate) const CURRENCY_RATE: f64 = 0.1;
pub(crate) const PERFECT_TIMING_RATIO: f64 = 0.8;

// Progression tuning -------------------------------------------------------
pub(crate) const FINAL_LEVEL: u8 = 10;
pub(crate) const CHARACTER_LEVEL_MAX: u8 = 5;
pub(crate) const CHARACTER_LEVEL_BONUS: i64 = 100;

// Timer tuning -------------------------------------------------------------
pub(crate) const AUTOSAVE_PERIOD_TICKS: u32 = 5;
pub(crate) const TIME_LOW_THRESHOLD: u16 = 3;

// Persistence limits -------------------------------------------------------
pub(crate) const SNAPSHOT_FRESHNESS_MS: i64 = 24 * 60 * 60 * 1_000;
pub(crate) const RUN_HISTORY_CAPACITY: usize = 10;
