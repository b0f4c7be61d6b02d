//! Browser layer: maps DOM elements onto the engine, owns the native
//! listeners and timers, and exposes the public gesture API.
//!
//! All state lives in a thread-local runtime. Every entry point takes the
//! runtime borrow only long enough to run the engine, then delivers the
//! resulting batch with the borrow released, so a handler can subscribe,
//! unsubscribe or call [`cleanup`] from inside a callback.

mod bindings;
mod haptics;
mod logger;
mod timers;

pub use haptics::{NavigatorVibrator, is_haptic_supported, trigger_haptic};
pub use logger::init_console_logger;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use wasm_bindgen::JsValue;
use web_sys::{Element, HtmlElement};

use crate::engine::{BindingChange, Delivery, GestureEngine, NativeEvent, SubscriptionId, deliver};
use crate::model::{ElementId, GestureEvent, GestureFilter, GestureKind, SwipeFilter};
use crate::optimizer::{self, OPTIMIZED_MARKER, TouchHintTarget};
use crate::options::GestureOptions;
use crate::state::TimerId;
use bindings::{BlurBinding, ElementBindings};
use timers::WebScheduler;

struct WebRuntime {
    engine: GestureEngine<WebScheduler>,
    next_element: u32,
    elements: Vec<(ElementId, Element)>,
    bindings: HashMap<ElementId, ElementBindings>,
    blur: Option<BlurBinding>,
    // Detached listeners whose closures may still be on the stack.
    retired: Vec<ElementBindings>,
    retired_blur: Vec<BlurBinding>,
}

impl WebRuntime {
    fn new() -> Self {
        Self {
            engine: GestureEngine::new(WebScheduler::default()),
            next_element: 0,
            elements: Vec::new(),
            bindings: HashMap::new(),
            blur: None,
            retired: Vec::new(),
            retired_blur: Vec::new(),
        }
    }

    fn lookup(&self, element: &Element) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|(_, el)| Object::is(el.as_ref(), element.as_ref()))
            .map(|(id, _)| *id)
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|(e, _)| *e == id).map(|(_, el)| el)
    }

    fn element_id(&mut self, element: &Element) -> ElementId {
        if let Some(id) = self.lookup(element) {
            return id;
        }
        self.next_element += 1;
        let id = ElementId(self.next_element);
        self.elements.push((id, element.clone()));
        id
    }

    fn apply(&mut self, id: ElementId, change: BindingChange) {
        match change {
            BindingChange::None => {}
            BindingChange::Install { passive } => self.install(id, passive),
            BindingChange::Upgrade => {
                if self.bindings.get(&id).is_some_and(ElementBindings::is_passive) {
                    self.release(id);
                    self.install(id, false);
                }
            }
            BindingChange::Downgrade => {
                if self.bindings.get(&id).is_some_and(|b| !b.is_passive()) {
                    self.release(id);
                    self.install(id, true);
                }
            }
            BindingChange::Release => {
                self.release(id);
                self.elements.retain(|(e, _)| *e != id);
            }
        }
    }

    fn install(&mut self, id: ElementId, passive: bool) {
        let Some(element) = self.element(id).cloned() else {
            return;
        };
        let bound = ElementBindings::attach(&element, id, passive);
        self.bindings.insert(id, bound);
        if self.blur.is_none() {
            self.blur = BlurBinding::attach();
        }
    }

    fn release(&mut self, id: ElementId) {
        if let Some(bound) = self.bindings.remove(&id) {
            bound.detach();
            self.retired.push(bound);
        }
        if self.bindings.is_empty() {
            if let Some(blur) = self.blur.take() {
                blur.detach();
                self.retired_blur.push(blur);
            }
        }
    }

    fn collect(&mut self) {
        self.retired.clear();
        self.retired_blur.clear();
        self.engine.scheduler_mut().collect();
    }

    fn fire(&mut self, timer: TimerId, now: f64) -> Vec<Delivery> {
        self.engine.scheduler_mut().retire(timer);
        if let Some(id) = self.engine.timer_element(timer) {
            let detached = self.element(id).is_some_and(|el| !el.is_connected());
            if detached {
                let dropped = self.engine.detach_element(id);
                log::debug!(
                    "{id:?} left the document, {} subscription(s) dropped",
                    dropped.len()
                );
                self.apply(id, BindingChange::Release);
                return Vec::new();
            }
        }
        self.engine.fire_timer(timer, now)
    }
}

thread_local! {
    static RUNTIME: RefCell<Option<WebRuntime>> = const { RefCell::new(None) };
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

fn with_runtime<R>(f: impl FnOnce(&mut WebRuntime) -> R) -> Option<R> {
    RUNTIME.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => Some(f(slot.get_or_insert_with(WebRuntime::new))),
        Err(_) => {
            log::error!("gesture runtime re-entered while borrowed");
            None
        }
    })
}

/// Marks one native callback on the stack. The outermost one frees the
/// closures retired by earlier callbacks.
struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Self {
        let outermost = DEPTH.with(|d| {
            let depth = d.get();
            d.set(depth + 1);
            depth == 0
        });
        if outermost {
            with_runtime(WebRuntime::collect);
        }
        DispatchGuard
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

pub(crate) fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now())
}

fn dispatch(element: ElementId, event: NativeEvent) {
    let _guard = DispatchGuard::enter();
    if let Some(batch) = with_runtime(|rt| rt.engine.handle(element, event)) {
        deliver(batch);
    }
}

fn blur() {
    let _guard = DispatchGuard::enter();
    if let Some(batch) = with_runtime(|rt| rt.engine.blur(now())) {
        deliver(batch);
    }
}

fn fire_timer(timer: TimerId) {
    let _guard = DispatchGuard::enter();
    if let Some(batch) = with_runtime(|rt| rt.fire(timer, now())) {
        deliver(batch);
    }
}

/// Handle returned by every subscribe call. Clones share state, and
/// unsubscribing more than once is harmless.
#[must_use = "keep the handle to remove the listener later"]
#[derive(Clone, Debug)]
pub struct Unsubscribe {
    target: Option<(ElementId, SubscriptionId)>,
    done: Rc<Cell<bool>>,
}

impl Unsubscribe {
    fn inert() -> Self {
        Self {
            target: None,
            done: Rc::new(Cell::new(true)),
        }
    }

    pub fn unsubscribe(&self) {
        if self.done.replace(true) {
            return;
        }
        let Some((element, id)) = self.target else {
            return;
        };
        with_runtime(|rt| {
            let change = rt.engine.remove_listener(id);
            rt.apply(element, change);
        });
    }

    pub fn is_active(&self) -> bool {
        !self.done.get()
    }
}

pub fn add_filtered_listener(
    element: &Element,
    filter: GestureFilter,
    handler: impl Fn(&GestureEvent) + 'static,
    options: Option<GestureOptions>,
) -> Unsubscribe {
    let options = options.unwrap_or_default();
    let added = with_runtime(|rt| {
        let id = rt.element_id(element);
        let (sub, change) = rt
            .engine
            .add_listener(id, filter, Rc::new(handler), options);
        rt.apply(id, change);
        (id, sub)
    });
    match added {
        Some(target) => Unsubscribe {
            target: Some(target),
            done: Rc::new(Cell::new(false)),
        },
        None => Unsubscribe::inert(),
    }
}

pub fn add_gesture_listener(
    element: &Element,
    kind: GestureKind,
    handler: impl Fn(&GestureEvent) + 'static,
    options: Option<GestureOptions>,
) -> Unsubscribe {
    add_filtered_listener(element, GestureFilter::kind(kind), handler, options)
}

pub fn on_swipe(
    element: &Element,
    direction: SwipeFilter,
    handler: impl Fn(&GestureEvent) + 'static,
    options: Option<GestureOptions>,
) -> Unsubscribe {
    add_filtered_listener(element, GestureFilter::swipe(direction), handler, options)
}

pub fn on_tap(
    element: &Element,
    handler: impl Fn(&GestureEvent) + 'static,
    options: Option<GestureOptions>,
) -> Unsubscribe {
    add_gesture_listener(element, GestureKind::Tap, handler, options)
}

pub fn on_double_tap(element: &Element, handler: impl Fn(&GestureEvent) + 'static) -> Unsubscribe {
    add_gesture_listener(element, GestureKind::DoubleTap, handler, None)
}

pub fn on_long_press(
    element: &Element,
    handler: impl Fn(&GestureEvent) + 'static,
    options: Option<GestureOptions>,
) -> Unsubscribe {
    add_gesture_listener(element, GestureKind::LongPress, handler, options)
}

pub fn on_drag(
    element: &Element,
    handler: impl Fn(&GestureEvent) + 'static,
    options: Option<GestureOptions>,
) -> Unsubscribe {
    add_gesture_listener(element, GestureKind::Drag, handler, options)
}

pub fn on_pinch(element: &Element, handler: impl Fn(&GestureEvent) + 'static) -> Unsubscribe {
    add_gesture_listener(element, GestureKind::Pinch, handler, None)
}

/// Drops every subscription, timer and native listener.
pub fn cleanup() {
    with_runtime(|rt| {
        for id in rt.engine.cleanup() {
            rt.release(id);
        }
        rt.elements.clear();
    });
}

/// Touch events exist, or the device reports touch points.
pub fn is_touch_supported() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    Reflect::has(window.as_ref(), &JsValue::from_str("ontouchstart")).unwrap_or(false)
        || window.navigator().max_touch_points() > 0
}

impl TouchHintTarget for HtmlElement {
    fn is_marked(&self) -> bool {
        self.has_attribute(OPTIMIZED_MARKER)
    }

    fn mark(&self) {
        let _ = self.set_attribute(OPTIMIZED_MARKER, "true");
    }

    fn set_style(&self, property: &str, value: &str) {
        let _ = self.style().set_property(property, value);
    }

    fn box_size(&self) -> (f64, f64) {
        let rect = self.get_bounding_client_rect();
        (rect.width(), rect.height())
    }
}

/// Applies the touch interaction hints once per element.
pub fn optimize_for_touch(element: &HtmlElement) {
    if optimizer::optimize_for_touch(element) {
        log::debug!("touch hints applied");
    }
}

/// Reads options saved under `key` in localStorage; defaults when absent or
/// malformed.
pub fn load_options(key: &str) -> GestureOptions {
    let raw = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|store| store.get_item(key).ok().flatten());
    let Some(raw) = raw else {
        return GestureOptions::default();
    };
    GestureOptions::from_json(&raw).unwrap_or_else(|err| {
        log::warn!("options under {key:?} unreadable: {err}");
        GestureOptions::default()
    })
}

pub fn save_options(key: &str, options: &GestureOptions) -> bool {
    let Some(store) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) else {
        return false;
    };
    store.set_item(key, &options.to_json()).is_ok()
}
