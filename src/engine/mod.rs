//! The recognition pipeline without a DOM: native events in, deliveries out.
//!
//! [`GestureEngine`] owns the normalizer, the recognizer lanes, the listener
//! registry and the timer table. It never calls a handler itself; every entry
//! point returns the [`Delivery`] batch for the caller to [`deliver`] once it
//! has released whatever borrow it holds on the engine, so handlers may
//! subscribe or unsubscribe re-entrantly.

pub mod normalizer;
pub mod recognizer;
pub mod registry;

pub use normalizer::{
    Contact, InputSource, NativeEvent, PointerPhase, PointerStreamNormalizer, PointerUpdate,
};
pub use recognizer::{Emission, GestureRecognizer, Interest, MoveOutcome, TimerContext};
pub use registry::{
    BindingChange, Delivery, GestureHandler, ListenerRegistry, SubscriptionId, deliver,
};

use crate::model::{ElementId, GestureFilter, GestureKind, PointerId};
use crate::options::GestureOptions;
use crate::state::{LaneId, Scheduler, TimerId, TimerTable, TrackState};

pub struct GestureEngine<S: Scheduler> {
    scheduler: S,
    timers: TimerTable,
    registry: ListenerRegistry,
    normalizer: PointerStreamNormalizer,
    recognizer: GestureRecognizer,
}

impl<S: Scheduler> GestureEngine<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            timers: TimerTable::default(),
            registry: ListenerRegistry::default(),
            normalizer: PointerStreamNormalizer::default(),
            recognizer: GestureRecognizer::default(),
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn add_listener(
        &mut self,
        element: ElementId,
        filter: GestureFilter,
        handler: GestureHandler,
        options: GestureOptions,
    ) -> (SubscriptionId, BindingChange) {
        let options = options.sanitized();
        let added = self.registry.add(element, filter, handler, &options);
        if added.lane_created {
            self.recognizer.open_lane(added.lane, element, options);
        }
        if let Some(interest) = self.recognizer.interest_mut(added.lane) {
            interest.add(filter.kind);
        }
        self.sync_tap_pairing(element);
        (added.id, added.binding)
    }

    /// Idempotent: a second call for the same id returns `BindingChange::None`.
    pub fn remove_listener(&mut self, id: SubscriptionId) -> BindingChange {
        let Some(removed) = self.registry.remove(id) else {
            return BindingChange::None;
        };
        if removed.lane_emptied {
            let mut timers = TimerContext {
                table: &mut self.timers,
                scheduler: &mut self.scheduler,
            };
            self.recognizer.close_lane(removed.lane, &mut timers);
        } else if let Some(interest) = self.recognizer.interest_mut(removed.lane) {
            interest.remove(removed.kind);
        }
        if removed.binding == BindingChange::Release {
            self.normalizer.forget(removed.element);
        } else {
            self.sync_tap_pairing(removed.element);
        }
        removed.binding
    }

    /// Feeds one native event for `element` through the pipeline.
    pub fn handle(&mut self, element: ElementId, event: NativeEvent) -> Vec<Delivery> {
        if !self.registry.is_bound(element) {
            log::debug!("{element:?}: event without subscriptions dropped");
            return Vec::new();
        }
        let updates = self.normalizer.normalize(element, event);
        let mut emissions = Vec::new();
        for update in &updates {
            self.route(element, update, &mut emissions);
        }
        self.resolve(emissions)
    }

    /// Window blur: every contact everywhere is cancelled, nothing is emitted.
    pub fn blur(&mut self, now: f64) -> Vec<Delivery> {
        let cancelled = self.normalizer.cancel_all(now);
        let mut emissions = Vec::new();
        for (element, update) in &cancelled {
            self.route(*element, update, &mut emissions);
        }
        self.resolve(emissions)
    }

    pub fn fire_timer(&mut self, timer: TimerId, now: f64) -> Vec<Delivery> {
        let Some(kind) = self.timers.take(timer) else {
            log::debug!("{timer:?} fired after cancellation, ignored");
            return Vec::new();
        };
        let mut emissions = Vec::new();
        self.recognizer.timer_fired(kind, now, &mut emissions);
        self.resolve(emissions)
    }

    /// The element a pending timer belongs to.
    pub fn timer_element(&self, timer: TimerId) -> Option<ElementId> {
        let kind = self.timers.kind(timer)?;
        self.recognizer.lane_element(kind.lane())
    }

    /// Drops every subscription on `element` (it left the document).
    /// Returns the removed ids; the element's bindings must be released.
    pub fn detach_element(&mut self, element: ElementId) -> Vec<SubscriptionId> {
        let ids = self.registry.subscriptions_on(element);
        for id in &ids {
            self.remove_listener(*id);
        }
        self.normalizer.forget(element);
        ids
    }

    /// Global teardown. Returns the elements whose bindings must be released.
    pub fn cleanup(&mut self) -> Vec<ElementId> {
        self.timers.disarm_all(&mut self.scheduler);
        self.recognizer = GestureRecognizer::default();
        self.normalizer.clear();
        let elements = self.registry.drain();
        log::debug!("cleanup released {} element(s)", elements.len());
        elements
    }

    pub fn listener_count(&self, element: ElementId) -> usize {
        self.registry.ref_count(element)
    }

    pub fn is_bound(&self, element: ElementId) -> bool {
        self.registry.is_bound(element)
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.registry.contains(id)
    }

    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn active_pointers(&self, element: ElementId) -> usize {
        self.normalizer.active_count(element)
    }

    pub fn lanes_of(&self, element: ElementId) -> Vec<LaneId> {
        self.registry.lanes_of(element)
    }

    pub fn track_state(&self, element: ElementId, pointer: PointerId) -> Option<TrackState> {
        self.registry
            .lanes_of(element)
            .into_iter()
            .find_map(|lane| self.recognizer.track_state(lane, pointer))
    }

    fn sync_tap_pairing(&mut self, element: ElementId) {
        let lanes = self.registry.lanes_of(element);
        let pairs = lanes.iter().any(|&lane| {
            self.recognizer
                .interest(lane)
                .is_some_and(|i| i.has(GestureKind::DoubleTap))
        });
        for lane in lanes {
            self.recognizer.set_pairs_taps(lane, pairs);
        }
    }

    fn route(&mut self, element: ElementId, update: &PointerUpdate, emissions: &mut Vec<Emission>) {
        let mut prevent = false;
        for lane in self.registry.lanes_of(element) {
            let mut timers = TimerContext {
                table: &mut self.timers,
                scheduler: &mut self.scheduler,
            };
            let outcome = self
                .recognizer
                .pointer_update(lane, update, &mut timers, emissions);
            let wants_prevent = self
                .registry
                .lane_options(lane)
                .is_some_and(|o| o.prevent_scroll);
            if update.phase == PointerPhase::Move && wants_prevent {
                prevent |= match outcome {
                    MoveOutcome::Pinching => true,
                    MoveOutcome::Directional(dir) => self.registry.claims_direction(lane, dir),
                    MoveOutcome::Ambiguous => false,
                };
            }
        }
        if prevent {
            update.default_action.prevent();
        }
    }

    fn resolve(&self, emissions: Vec<Emission>) -> Vec<Delivery> {
        emissions
            .into_iter()
            .flat_map(|e| self.registry.deliveries(e.lane, &e.event))
            .collect()
    }
}
