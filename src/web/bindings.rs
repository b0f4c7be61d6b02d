// Native listeners for one bound element, plus the window blur listener.
// Touch listeners honour the passive flag; mouseup goes on the window so a
// release outside the element still ends the press.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{AddEventListenerOptions, Element, Event, MouseEvent, TouchEvent, Window};

use crate::engine::{Contact, NativeEvent, PointerPhase};
use crate::model::{DefaultAction, ElementId};

const TOUCH_EVENTS: [&str; 4] = ["touchstart", "touchmove", "touchend", "touchcancel"];

fn touch_phase(kind: &str) -> Option<PointerPhase> {
    match kind {
        "touchstart" => Some(PointerPhase::Start),
        "touchmove" => Some(PointerPhase::Move),
        "touchend" => Some(PointerPhase::End),
        "touchcancel" => Some(PointerPhase::Cancel),
        _ => None,
    }
}

fn mouse_phase(kind: &str) -> Option<PointerPhase> {
    match kind {
        "mousedown" => Some(PointerPhase::Start),
        "mousemove" => Some(PointerPhase::Move),
        "mouseup" => Some(PointerPhase::End),
        _ => None,
    }
}

fn default_action(event: &Event) -> DefaultAction {
    let event = event.clone();
    DefaultAction::new(move || event.prevent_default())
}

/// Decodes the changed touches; `touches()` would also list contacts that
/// did not take part in this event.
fn decode_touch(e: &TouchEvent) -> Option<NativeEvent> {
    let phase = touch_phase(&e.type_())?;
    let changed = e.changed_touches();
    let contacts = (0..changed.length())
        .filter_map(|i| changed.item(i))
        .map(|t| Contact::new(t.identifier(), f64::from(t.client_x()), f64::from(t.client_y())))
        .collect();
    Some(NativeEvent::touch(phase, contacts, e.time_stamp()).with_default_action(default_action(e)))
}

fn decode_mouse(e: &MouseEvent) -> Option<NativeEvent> {
    let phase = mouse_phase(&e.type_())?;
    Some(
        NativeEvent::mouse(
            phase,
            f64::from(e.client_x()),
            f64::from(e.client_y()),
            e.button(),
            e.time_stamp(),
        )
        .with_default_action(default_action(e)),
    )
}

pub(crate) struct ElementBindings {
    element: Element,
    window: Option<Window>,
    passive: bool,
    touch: Closure<dyn FnMut(TouchEvent)>,
    mouse: Closure<dyn FnMut(MouseEvent)>,
}

impl ElementBindings {
    pub(crate) fn attach(element: &Element, id: ElementId, passive: bool) -> Self {
        let touch = Closure::wrap(Box::new(move |e: TouchEvent| {
            if let Some(native) = decode_touch(&e) {
                super::dispatch(id, native);
            }
        }) as Box<dyn FnMut(_)>);
        let mouse = Closure::wrap(Box::new(move |e: MouseEvent| {
            if let Some(native) = decode_mouse(&e) {
                super::dispatch(id, native);
            }
        }) as Box<dyn FnMut(_)>);

        let opts = AddEventListenerOptions::new();
        opts.set_passive(passive);
        for kind in TOUCH_EVENTS {
            if let Err(err) = element
                .add_event_listener_with_callback_and_add_event_listener_options(
                    kind,
                    touch.as_ref().unchecked_ref(),
                    &opts,
                )
            {
                log::debug!("{id:?}: {kind} listener not added: {err:?}");
            }
        }
        element
            .add_event_listener_with_callback("mousedown", mouse.as_ref().unchecked_ref())
            .ok();
        element
            .add_event_listener_with_callback("mousemove", mouse.as_ref().unchecked_ref())
            .ok();
        let window = web_sys::window();
        if let Some(window) = &window {
            window
                .add_event_listener_with_callback("mouseup", mouse.as_ref().unchecked_ref())
                .ok();
        }
        log::debug!("{id:?}: listeners installed (passive: {passive})");
        Self {
            element: element.clone(),
            window,
            passive,
            touch,
            mouse,
        }
    }

    pub(crate) fn is_passive(&self) -> bool {
        self.passive
    }

    /// Removes the listeners. The closures stay alive with `self`.
    pub(crate) fn detach(&self) {
        for kind in TOUCH_EVENTS {
            let _ = self
                .element
                .remove_event_listener_with_callback(kind, self.touch.as_ref().unchecked_ref());
        }
        let _ = self
            .element
            .remove_event_listener_with_callback("mousedown", self.mouse.as_ref().unchecked_ref());
        let _ = self
            .element
            .remove_event_listener_with_callback("mousemove", self.mouse.as_ref().unchecked_ref());
        if let Some(window) = &self.window {
            let _ = window.remove_event_listener_with_callback(
                "mouseup",
                self.mouse.as_ref().unchecked_ref(),
            );
        }
    }
}

pub(crate) struct BlurBinding {
    window: Window,
    blur: Closure<dyn FnMut(Event)>,
}

impl BlurBinding {
    pub(crate) fn attach() -> Option<Self> {
        let window = web_sys::window()?;
        let blur = Closure::wrap(Box::new(move |_e: Event| super::blur()) as Box<dyn FnMut(_)>);
        window
            .add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())
            .ok();
        Some(Self { window, blur })
    }

    pub(crate) fn detach(&self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("blur", self.blur.as_ref().unchecked_ref());
    }
}
