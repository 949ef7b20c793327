//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

fn saturate(value: f64) -> i64 {
    if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    }
}

/// Floor a f64 and convert it to i64, saturating at the i64 range and
/// returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let floored = value.floor();
    cast::<f64, i64>(floored).unwrap_or_else(|| saturate(floored))
}

/// Round a f64 and convert it to i64, saturating at the i64 range and
/// returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let rounded = value.round();
    cast::<f64, i64>(rounded).unwrap_or_else(|| saturate(rounded))
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}
