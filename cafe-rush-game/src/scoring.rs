//! Pure scoring arithmetic for taps, bonuses, and penalties.
//!
//! Every function here is deterministic in its inputs; the engine carries no
//! randomness (tile placement is a presentation concern).

use crate::constants::{
    COMBO_STEP, COMPLETION_BONUS_BASE, CURRENCY_RATE, INCORRECT_TAP_PENALTY, PERFECT_TIMING_RATIO,
    TAP_BASE_SCORE, TIME_BONUS_PER_SECOND, TIME_UP_DECAY_FACTOR,
};
use crate::numbers::{floor_f64_to_i64, i64_to_f64};

/// Score for one correct tap.
///
/// `combo` is the value after incrementing for this tap: the first tap of a
/// fresh combo has `combo == 1` and a multiplier factor of exactly 1.0.
#[must_use]
pub fn tap_score(time_remaining_seconds: u16, combo: u32, level_multiplier: f64) -> i64 {
    let time_bonus = f64::from(time_remaining_seconds);
    let combo_factor = 1.0 + f64::from(combo.saturating_sub(1)) * COMBO_STEP;
    floor_f64_to_i64(i64_to_f64(TAP_BASE_SCORE) * time_bonus * combo_factor * level_multiplier)
}

/// New score after an incorrect tap; floors at zero.
#[must_use]
pub fn incorrect_penalty(current_score: i64) -> i64 {
    (current_score - INCORRECT_TAP_PENALTY).max(0)
}

/// Bonus granted when a level's sequence is fully cleared.
#[must_use]
pub fn completion_bonus(level_multiplier: f64, time_remaining_seconds: u16) -> i64 {
    floor_f64_to_i64(COMPLETION_BONUS_BASE * level_multiplier)
        + i64::from(time_remaining_seconds) * TIME_BONUS_PER_SECOND
}

/// New score after the timer expires with partial progress.
#[must_use]
pub fn time_up_decay(current_score: i64) -> i64 {
    floor_f64_to_i64(i64_to_f64(current_score) * TIME_UP_DECAY_FACTOR)
}

/// Currency granted on level completion.
#[must_use]
pub fn currency_earned(score: i64) -> i64 {
    floor_f64_to_i64(i64_to_f64(score) * CURRENCY_RATE)
}

/// Whether a tap qualifies for the perfect-timing flourish.
///
/// Compares seconds remaining against 80% of the level's tile count. The
/// mismatched units are deliberate shipped balance; do not "fix" them.
#[must_use]
pub fn is_perfect_timing(time_remaining_seconds: u16, target_length: u8) -> bool {
    f64::from(time_remaining_seconds) > f64::from(target_length) * PERFECT_TIMING_RATIO
}
