// One-time interaction hints for touch targets.

/// Attribute marking an element that already received the hints.
pub const OPTIMIZED_MARKER: &str = "data-touch-optimized";

/// Minimum comfortable hit area, in CSS px.
pub const MIN_HIT_SIZE: f64 = 44.0;

pub const TOUCH_HINTS: &[(&str, &str)] = &[
    ("touch-action", "manipulation"),
    ("-webkit-tap-highlight-color", "transparent"),
    ("-webkit-touch-callout", "none"),
    ("user-select", "none"),
    ("-webkit-user-select", "none"),
];

pub trait TouchHintTarget {
    fn is_marked(&self) -> bool;
    fn mark(&self);
    fn set_style(&self, property: &str, value: &str);
    /// Rendered (width, height) in CSS px.
    fn box_size(&self) -> (f64, f64);
}

/// Applies the hints unless the target is already marked. Returns whether
/// anything was written.
pub fn optimize_for_touch<T: TouchHintTarget + ?Sized>(target: &T) -> bool {
    if target.is_marked() {
        return false;
    }
    for (property, value) in TOUCH_HINTS {
        target.set_style(property, value);
    }
    let (width, height) = target.box_size();
    let min = format!("{MIN_HIT_SIZE}px");
    if width < MIN_HIT_SIZE {
        target.set_style("min-width", &min);
    }
    if height < MIN_HIT_SIZE {
        target.set_style("min-height", &min);
    }
    target.mark();
    true
}
