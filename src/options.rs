// Per-listener recognition settings. Serialized with camelCase keys so the
// same JSON works from localStorage or a data attribute.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 10.0;
pub const DEFAULT_VELOCITY_THRESHOLD: f64 = 0.3;
pub const DEFAULT_TIME_THRESHOLD: f64 = 500.0;
pub const DEFAULT_DOUBLE_TAP_WINDOW: f64 = 300.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureOptions {
    /// Movement (px) a contact must exceed before it stops being a tap.
    pub distance_threshold: f64,
    /// px/ms at release separating a swipe from a drag.
    pub velocity_threshold: f64,
    /// Long-press dwell (ms); also the ceiling for a tap.
    pub time_threshold: f64,
    pub double_tap_window: f64,
    pub prevent_scroll: bool,
    pub passive: bool,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            time_threshold: DEFAULT_TIME_THRESHOLD,
            double_tap_window: DEFAULT_DOUBLE_TAP_WINDOW,
            prevent_scroll: false,
            passive: true,
        }
    }
}

impl GestureOptions {
    pub fn with_distance_threshold(mut self, px: f64) -> Self {
        self.distance_threshold = px;
        self
    }

    pub fn with_velocity_threshold(mut self, px_per_ms: f64) -> Self {
        self.velocity_threshold = px_per_ms;
        self
    }

    pub fn with_time_threshold(mut self, ms: f64) -> Self {
        self.time_threshold = ms;
        self
    }

    pub fn with_double_tap_window(mut self, ms: f64) -> Self {
        self.double_tap_window = ms;
        self
    }

    /// Also makes the native binding non-passive, otherwise browsers ignore
    /// `preventDefault()` on touchmove.
    pub fn with_prevent_scroll(mut self, prevent: bool) -> Self {
        self.prevent_scroll = prevent;
        if prevent {
            self.passive = false;
        }
        self
    }

    pub fn with_passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }

    /// Whether native listeners serving these options may be passive.
    pub fn wants_passive(&self) -> bool {
        self.passive && !self.prevent_scroll
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<GestureOptions>(raw).map(GestureOptions::sanitized)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Replaces negative or non-finite values with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = GestureOptions::default();
        let fix = |name: &str, value: f64, fallback: f64| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                log::warn!("gesture option {name}={value} is invalid, using {fallback}");
                fallback
            }
        };
        Self {
            distance_threshold: fix(
                "distanceThreshold",
                self.distance_threshold,
                defaults.distance_threshold,
            ),
            velocity_threshold: fix(
                "velocityThreshold",
                self.velocity_threshold,
                defaults.velocity_threshold,
            ),
            time_threshold: fix("timeThreshold", self.time_threshold, defaults.time_threshold),
            double_tap_window: fix(
                "doubleTapWindow",
                self.double_tap_window,
                defaults.double_tap_window,
            ),
            ..self
        }
    }
}
