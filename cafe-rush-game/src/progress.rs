//! Combo, product, and character-level progression.
//!
//! Free functions over the session state, mirroring how the scoring module
//! stays free of ownership: callers pass the state they already own.

use crate::constants::CHARACTER_LEVEL_MAX;
use crate::state::SessionState;

/// Register a correct tap: the combo grows and the high-water mark follows
/// it immediately, so a run that ends mid-level still reports its best combo.
pub fn record_correct_tap(state: &mut SessionState) {
    state.combo = state.combo.saturating_add(1);
    state.max_combo = state.max_combo.max(state.combo);
}

/// Register an incorrect tap: the combo resets to zero.
pub fn record_incorrect_tap(state: &mut SessionState) {
    state.combo = 0;
}

/// Stock every product category after a level completes.
pub fn apply_level_products(state: &mut SessionState, level: u8) {
    let amount = 1 + u32::from(level / 2);
    state.products.add_to_all(amount);
}

/// Recompute the character level after completing `level`.
///
/// Returns the new character level when it increased; the caller awards the
/// level-up score bonus. The character never regresses and caps at five.
pub fn recompute_character_level(state: &mut SessionState, level: u8) -> Option<u8> {
    let new_level = ((level.saturating_sub(1)) / 2 + 1).min(CHARACTER_LEVEL_MAX);
    if new_level > state.character_level {
        state.character_level = new_level;
        Some(new_level)
    } else {
        None
    }
}
