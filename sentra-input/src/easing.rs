//! Easing curves on `[0, 1]`.
//!
//! Every curve maps 0 to 0 and 1 to 1 exactly and is monotonic
//! non-decreasing, so partial sums of a paced command never overshoot.

use sentra_types::EasingKind;

#[must_use]
pub fn linear(t: f64) -> f64 {
    t
}

/// Decelerating: `1 - (1 - t)^2`.
#[must_use]
pub fn ease_out_quad(t: f64) -> f64 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Accelerates until the midpoint, then decelerates.
#[must_use]
pub fn ease_in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u / 2.0
    }
}

/// Applies `kind` to `t`, clamping `t` into `[0, 1]` first. NaN maps to 0.
#[must_use]
pub fn ease(kind: EasingKind, t: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    match kind {
        EasingKind::Linear => linear(t),
        EasingKind::EaseOutQuad => ease_out_quad(t),
        EasingKind::EaseInOutQuad => ease_in_out_quad(t),
    }
}
