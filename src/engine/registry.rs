//! Subscription table.
//!
//! Subscriptions are grouped per element into lanes of identical options.
//! The element's reference count is its number of live subscriptions; native
//! bindings are installed when it leaves zero and released when it returns
//! there, whatever mix of gesture kinds came and went in between.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::model::{Direction, ElementId, GestureEvent, GestureFilter, GestureKind};
use crate::options::GestureOptions;
use crate::state::LaneId;

pub type GestureHandler = Rc<dyn Fn(&GestureEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// What the host must do with an element's native listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingChange {
    None,
    Install { passive: bool },
    /// Reinstall as non-passive so `preventDefault()` is honoured.
    Upgrade,
    /// The last non-passive subscription left; reinstall as passive.
    Downgrade,
    Release,
}

struct Subscription {
    element: ElementId,
    lane: LaneId,
    filter: GestureFilter,
    handler: GestureHandler,
    live: Rc<Cell<bool>>,
}

#[derive(Debug)]
struct ElementEntry {
    refs: usize,
    passive: bool,
    lanes: Vec<LaneId>,
}

#[derive(Debug)]
struct LaneEntry {
    element: ElementId,
    options: GestureOptions,
    subscribers: Vec<SubscriptionId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Added {
    pub id: SubscriptionId,
    pub lane: LaneId,
    pub lane_created: bool,
    pub binding: BindingChange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removed {
    pub element: ElementId,
    pub lane: LaneId,
    pub kind: GestureKind,
    pub lane_emptied: bool,
    pub binding: BindingChange,
}

/// A handler paired with the event it should receive. Skipped if its
/// subscription was removed before the batch reached it.
pub struct Delivery {
    pub subscription: SubscriptionId,
    pub event: GestureEvent,
    handler: GestureHandler,
    live: Rc<Cell<bool>>,
}

impl Delivery {
    /// Runs the handler, catching a panic so later deliveries still happen.
    /// Returns whether the handler ran to completion.
    pub fn run(self) -> bool {
        if !self.live.get() {
            return false;
        }
        let Delivery {
            subscription,
            event,
            handler,
            ..
        } = self;
        match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
            Ok(()) => true,
            Err(_) => {
                log::error!("{} handler {subscription:?} panicked", event.kind);
                false
            }
        }
    }
}

/// Delivers a batch in order; returns how many handlers completed.
pub fn deliver(batch: Vec<Delivery>) -> usize {
    if log::log_enabled!(log::Level::Trace) {
        for d in &batch {
            log::trace!("deliver {:?} {}", d.subscription, d.event.to_json());
        }
    }
    batch.into_iter().map(Delivery::run).filter(|ok| *ok).count()
}

#[derive(Default)]
pub struct ListenerRegistry {
    next_subscription: u64,
    next_lane: u32,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    elements: HashMap<ElementId, ElementEntry>,
    lanes: BTreeMap<LaneId, LaneEntry>,
}

impl ListenerRegistry {
    pub fn add(
        &mut self,
        element: ElementId,
        filter: GestureFilter,
        handler: GestureHandler,
        options: &GestureOptions,
    ) -> Added {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);

        let binding = match self.elements.get_mut(&element) {
            None => {
                self.elements.insert(
                    element,
                    ElementEntry {
                        refs: 1,
                        passive: options.wants_passive(),
                        lanes: Vec::new(),
                    },
                );
                BindingChange::Install {
                    passive: options.wants_passive(),
                }
            }
            Some(entry) => {
                entry.refs += 1;
                if entry.passive && !options.wants_passive() {
                    entry.passive = false;
                    BindingChange::Upgrade
                } else {
                    BindingChange::None
                }
            }
        };

        let existing = self.elements.get(&element).and_then(|entry| {
            entry
                .lanes
                .iter()
                .copied()
                .find(|lane| self.lanes.get(lane).is_some_and(|l| &l.options == options))
        });
        let (lane, lane_created) = match existing {
            Some(lane) => (lane, false),
            None => {
                self.next_lane += 1;
                let lane = LaneId(self.next_lane);
                self.lanes.insert(
                    lane,
                    LaneEntry {
                        element,
                        options: options.clone(),
                        subscribers: Vec::new(),
                    },
                );
                if let Some(entry) = self.elements.get_mut(&element) {
                    entry.lanes.push(lane);
                }
                (lane, true)
            }
        };
        if let Some(l) = self.lanes.get_mut(&lane) {
            l.subscribers.push(id);
        }

        self.subscriptions.insert(
            id,
            Subscription {
                element,
                lane,
                filter,
                handler,
                live: Rc::new(Cell::new(true)),
            },
        );
        log::debug!("{id:?} added: {} on {element:?} in {lane:?}", filter.kind);
        Added {
            id,
            lane,
            lane_created,
            binding,
        }
    }

    /// `None` when the subscription is already gone; removing twice is fine.
    pub fn remove(&mut self, id: SubscriptionId) -> Option<Removed> {
        let sub = self.subscriptions.remove(&id)?;
        sub.live.set(false);

        let mut lane_emptied = false;
        if let Some(lane) = self.lanes.get_mut(&sub.lane) {
            lane.subscribers.retain(|s| *s != id);
            if lane.subscribers.is_empty() {
                self.lanes.remove(&sub.lane);
                lane_emptied = true;
            }
        }

        let mut binding = BindingChange::None;
        if let Some(entry) = self.elements.get_mut(&sub.element) {
            entry.refs = entry.refs.saturating_sub(1);
            if lane_emptied {
                entry.lanes.retain(|l| *l != sub.lane);
            }
            if entry.refs == 0 {
                self.elements.remove(&sub.element);
                binding = BindingChange::Release;
            } else if !entry.passive
                && entry.lanes.iter().all(|lane| {
                    self.lanes.get(lane).is_none_or(|l| l.options.wants_passive())
                })
            {
                entry.passive = true;
                binding = BindingChange::Downgrade;
            }
        }
        log::debug!("{id:?} removed from {:?}", sub.element);
        Some(Removed {
            element: sub.element,
            lane: sub.lane,
            kind: sub.filter.kind,
            lane_emptied,
            binding,
        })
    }

    /// Resolves an event emitted by `lane` to the handlers that want it, in
    /// subscription order.
    pub fn deliveries(&self, lane: LaneId, event: &GestureEvent) -> Vec<Delivery> {
        let Some(entry) = self.lanes.get(&lane) else {
            return Vec::new();
        };
        entry
            .subscribers
            .iter()
            .filter_map(|id| self.subscriptions.get(id).map(|s| (*id, s)))
            .filter(|(_, s)| s.filter.matches(event))
            .map(|(id, s)| Delivery {
                subscription: id,
                event: event.clone(),
                handler: s.handler.clone(),
                live: s.live.clone(),
            })
            .collect()
    }

    /// Whether a subscriber in `lane` consumes single-pointer motion in `dir`
    /// (a drag, an any-direction swipe or a swipe in exactly `dir`).
    pub fn claims_direction(&self, lane: LaneId, dir: Direction) -> bool {
        let Some(entry) = self.lanes.get(&lane) else {
            return false;
        };
        entry.subscribers.iter().any(|id| {
            self.subscriptions.get(id).is_some_and(|s| match s.filter.kind {
                GestureKind::Drag => true,
                GestureKind::Swipe => s.filter.direction.is_none_or(|d| d == dir),
                _ => false,
            })
        })
    }

    pub fn lane_options(&self, lane: LaneId) -> Option<&GestureOptions> {
        self.lanes.get(&lane).map(|l| &l.options)
    }

    pub fn lane_element(&self, lane: LaneId) -> Option<ElementId> {
        self.lanes.get(&lane).map(|l| l.element)
    }

    pub fn lanes_of(&self, element: ElementId) -> Vec<LaneId> {
        self.elements
            .get(&element)
            .map(|e| e.lanes.clone())
            .unwrap_or_default()
    }

    pub fn subscriptions_on(&self, element: ElementId) -> Vec<SubscriptionId> {
        self.subscriptions
            .iter()
            .filter(|(_, s)| s.element == element)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn ref_count(&self, element: ElementId) -> usize {
        self.elements.get(&element).map_or(0, |e| e.refs)
    }

    pub fn is_bound(&self, element: ElementId) -> bool {
        self.elements.contains_key(&element)
    }

    pub fn is_passive(&self, element: ElementId) -> Option<bool> {
        self.elements.get(&element).map(|e| e.passive)
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Drops every subscription. Returns the elements that had bindings.
    pub fn drain(&mut self) -> Vec<ElementId> {
        for sub in self.subscriptions.values() {
            sub.live.set(false);
        }
        self.subscriptions.clear();
        self.lanes.clear();
        let mut elements: Vec<ElementId> = self.elements.drain().map(|(id, _)| id).collect();
        elements.sort();
        elements
    }
}
