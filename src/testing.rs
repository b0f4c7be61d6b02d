//! Virtual clock for driving the engine without a browser.
//!
//! ```
//! use touch_gestures::testing::Harness;
//! use touch_gestures::{ElementId, GestureKind};
//!
//! let mut h = Harness::new();
//! let el = ElementId(1);
//! let taps = h.record(el, GestureKind::Tap);
//! h.touch_start(el, 0, 100.0, 100.0, 0.0);
//! h.touch_end(el, 0, 100.0, 100.0, 100.0);
//! assert_eq!(taps.borrow().len(), 1);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::engine::{
    Contact, GestureEngine, NativeEvent, PointerPhase, SubscriptionId, deliver,
};
use crate::model::{ElementId, GestureEvent, GestureFilter};
use crate::options::GestureOptions;
use crate::state::{Scheduler, TimerId};

/// Records deadlines instead of arming real timers.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: BTreeMap<TimerId, f64>,
    scheduled: usize,
    cancelled: usize,
}

impl ManualScheduler {
    /// Removes and returns the timers due at or before `now`, earliest first.
    pub fn due(&mut self, now: f64) -> Vec<(TimerId, f64)> {
        let mut due: Vec<(TimerId, f64)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (*id, *deadline))
            .collect();
        due.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        for (id, _) in &due {
            self.pending.remove(id);
        }
        due
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.values().copied().min_by(f64::total_cmp)
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, timer: TimerId, deadline: f64) {
        self.scheduled += 1;
        self.pending.insert(timer, deadline);
    }

    fn cancel(&mut self, timer: TimerId) {
        if self.pending.remove(&timer).is_some() {
            self.cancelled += 1;
        }
    }
}

pub type Recorded = Rc<RefCell<Vec<GestureEvent>>>;

/// An engine plus a clock. Every input first fires the timers that would
/// have fired before it, so the ordering matches a real event loop.
pub struct Harness {
    pub engine: GestureEngine<ManualScheduler>,
    now: f64,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            engine: GestureEngine::new(ManualScheduler::default()),
            now: 0.0,
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Subscribes a recorder with default options.
    pub fn record(&mut self, element: ElementId, filter: impl Into<GestureFilter>) -> Recorded {
        self.record_with(element, filter, GestureOptions::default()).1
    }

    pub fn record_with(
        &mut self,
        element: ElementId,
        filter: impl Into<GestureFilter>,
        options: GestureOptions,
    ) -> (SubscriptionId, Recorded) {
        let seen: Recorded = Rc::default();
        let sink = seen.clone();
        let (id, _) = self.engine.add_listener(
            element,
            filter.into(),
            Rc::new(move |e: &GestureEvent| sink.borrow_mut().push(e.clone())),
            options,
        );
        (id, seen)
    }

    /// Advances the clock, firing due timers in deadline order.
    pub fn advance_to(&mut self, t: f64) -> usize {
        let mut delivered = 0;
        loop {
            let due = self.engine.scheduler_mut().due(t);
            if due.is_empty() {
                break;
            }
            for (timer, deadline) in due {
                self.now = self.now.max(deadline);
                delivered += deliver(self.engine.fire_timer(timer, deadline));
            }
        }
        self.now = self.now.max(t);
        delivered
    }

    pub fn send(&mut self, element: ElementId, event: NativeEvent) -> usize {
        self.advance_to(event.time);
        deliver(self.engine.handle(element, event))
    }

    pub fn touch(
        &mut self,
        element: ElementId,
        phase: PointerPhase,
        contacts: Vec<Contact>,
        t: f64,
    ) -> usize {
        self.send(element, NativeEvent::touch(phase, contacts, t))
    }

    pub fn touch_start(&mut self, element: ElementId, id: i32, x: f64, y: f64, t: f64) -> usize {
        self.touch(element, PointerPhase::Start, vec![Contact::new(id, x, y)], t)
    }

    pub fn touch_move(&mut self, element: ElementId, id: i32, x: f64, y: f64, t: f64) -> usize {
        self.touch(element, PointerPhase::Move, vec![Contact::new(id, x, y)], t)
    }

    pub fn touch_end(&mut self, element: ElementId, id: i32, x: f64, y: f64, t: f64) -> usize {
        self.touch(element, PointerPhase::End, vec![Contact::new(id, x, y)], t)
    }

    pub fn touch_cancel(&mut self, element: ElementId, id: i32, t: f64) -> usize {
        self.touch(element, PointerPhase::Cancel, vec![Contact::new(id, 0.0, 0.0)], t)
    }

    pub fn mouse(
        &mut self,
        element: ElementId,
        phase: PointerPhase,
        x: f64,
        y: f64,
        t: f64,
    ) -> usize {
        self.send(element, NativeEvent::mouse(phase, x, y, 0, t))
    }

    pub fn blur(&mut self, t: f64) -> usize {
        self.advance_to(t);
        deliver(self.engine.blur(t))
    }
}
