//! yew function-component hooks over the browser API.
//!
//! The subscription follows the `NodeRef`, filter and options; a new
//! callback on each render does not resubscribe, the latest one is simply
//! used for the next event.

use yew::platform::spawn_local;
use yew::prelude::*;
use web_sys::{Element, HtmlElement};

use crate::haptics::HapticPattern;
use crate::model::{GestureEvent, GestureFilter, GestureKind, SwipeFilter};
use crate::options::GestureOptions;
use crate::web::{add_filtered_listener, optimize_for_touch, trigger_haptic};

#[hook]
pub fn use_gesture(
    node: &NodeRef,
    filter: GestureFilter,
    options: Option<GestureOptions>,
    on_gesture: Callback<GestureEvent>,
) {
    let latest = use_mut_ref(|| on_gesture.clone());
    *latest.borrow_mut() = on_gesture;

    use_effect_with((node.clone(), filter, options), move |(node, filter, options)| {
        let sub = node.cast::<Element>().map(|el| {
            add_filtered_listener(
                &el,
                *filter,
                move |e: &GestureEvent| {
                    // Clone out first: emitting may re-render and replace it.
                    let cb = latest.borrow().clone();
                    cb.emit(e.clone());
                },
                options.clone(),
            )
        });
        move || {
            if let Some(sub) = sub {
                sub.unsubscribe();
            }
        }
    });
}

#[hook]
pub fn use_swipe(
    node: &NodeRef,
    direction: SwipeFilter,
    options: Option<GestureOptions>,
    on_swipe: Callback<GestureEvent>,
) {
    use_gesture(node, GestureFilter::swipe(direction), options, on_swipe);
}

#[hook]
pub fn use_tap(node: &NodeRef, options: Option<GestureOptions>, on_tap: Callback<GestureEvent>) {
    use_gesture(node, GestureKind::Tap.into(), options, on_tap);
}

#[hook]
pub fn use_long_press(
    node: &NodeRef,
    options: Option<GestureOptions>,
    on_long_press: Callback<GestureEvent>,
) {
    use_gesture(node, GestureKind::LongPress.into(), options, on_long_press);
}

#[hook]
pub fn use_drag(node: &NodeRef, options: Option<GestureOptions>, on_drag: Callback<GestureEvent>) {
    use_gesture(node, GestureKind::Drag.into(), options, on_drag);
}

#[hook]
pub fn use_pinch(node: &NodeRef, on_pinch: Callback<GestureEvent>) {
    use_gesture(node, GestureKind::Pinch.into(), None, on_pinch);
}

/// Applies the touch interaction hints to the node once it is mounted.
#[hook]
pub fn use_touch_optimized(node: &NodeRef) {
    use_effect_with(node.clone(), |node| {
        if let Some(el) = node.cast::<HtmlElement>() {
            optimize_for_touch(&el);
        }
        || ()
    });
}

/// A callback that fires a haptic pattern without blocking the caller.
#[hook]
pub fn use_haptics() -> Callback<HapticPattern> {
    use_callback((), |pattern: HapticPattern, _| {
        spawn_local(async move {
            if !trigger_haptic(pattern).await {
                log::debug!("haptic {pattern:?} not issued");
            }
        });
    })
}
