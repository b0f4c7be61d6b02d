// Small numeric helpers shared by the recognizer and the pinch tracker.

/// Durations shorter than this are clamped so velocity stays finite.
pub const MIN_DURATION_MS: f64 = 1.0;

pub fn elapsed(since: f64, now: f64) -> f64 {
    (now - since).max(0.0)
}

/// px/ms over `duration` ms.
pub fn velocity(distance: f64, duration: f64) -> f64 {
    distance / duration.max(MIN_DURATION_MS)
}

/// Wraps an angle difference into (-180, 180].
pub fn wrap_degrees(mut deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    while deg <= -180.0 {
        deg += 360.0;
    }
    while deg > 180.0 {
        deg -= 360.0;
    }
    deg
}
