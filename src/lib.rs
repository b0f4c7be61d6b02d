//! Touch and mouse gesture recognition for yew/web-sys front ends.
//!
//! Tap, double-tap, long-press, swipe, drag and pinch are recognized from
//! raw touch and mouse events and delivered to per-element subscriptions.
//! The recognition core ([`engine`]) works on plain element ids and an
//! injected timer [`Scheduler`], so it runs and tests without a browser;
//! [`web`] and [`hooks`] bind it to the DOM.

pub mod engine;
pub mod haptics;
pub mod hooks;
pub mod model;
pub mod optimizer;
pub mod options;
pub mod state;
pub mod testing;
pub mod util;
pub mod web;

pub use engine::{BindingChange, GestureEngine, SubscriptionId};
pub use haptics::{HapticDispatcher, HapticPattern, HapticRequest, Vibrator};
pub use model::{
    Direction, ElementId, GestureEvent, GestureFilter, GestureKind, GesturePhase, Point,
    PointerId, SwipeFilter,
};
pub use options::GestureOptions;
pub use state::Scheduler;
pub use web::{
    Unsubscribe, add_filtered_listener, add_gesture_listener, cleanup, init_console_logger,
    is_haptic_supported, is_touch_supported, load_options, on_double_tap, on_drag,
    on_long_press, on_pinch, on_swipe, on_tap, optimize_for_touch, save_options, trigger_haptic,
};
