// setTimeout-backed scheduler. A closure that has fired is parked in `spent`
// instead of being dropped, since it is still on the stack; the runtime
// clears it at the next outermost dispatch.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::state::{Scheduler, TimerId};

#[derive(Default)]
pub(crate) struct WebScheduler {
    armed: HashMap<TimerId, (i32, Closure<dyn FnMut()>)>,
    spent: Vec<Closure<dyn FnMut()>>,
}

impl WebScheduler {
    /// Moves a timer's closure out of the armed table once it has fired.
    pub(crate) fn retire(&mut self, timer: TimerId) {
        if let Some((_, cb)) = self.armed.remove(&timer) {
            self.spent.push(cb);
        }
    }

    pub(crate) fn collect(&mut self) {
        self.spent.clear();
    }
}

impl Scheduler for WebScheduler {
    fn schedule(&mut self, timer: TimerId, deadline: f64) {
        let Some(window) = web_sys::window() else {
            log::warn!("no window, {timer:?} not armed");
            return;
        };
        let delay = (deadline - super::now()).max(0.0).ceil() as i32;
        let cb = Closure::wrap(Box::new(move || super::fire_timer(timer)) as Box<dyn FnMut()>);
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(handle) => {
                self.armed.insert(timer, (handle, cb));
            }
            Err(err) => log::warn!("setTimeout failed for {timer:?}: {err:?}"),
        }
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some((handle, _cb)) = self.armed.remove(&timer) {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(handle);
            }
        }
    }
}
