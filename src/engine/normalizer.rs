//! Touch and mouse input folded into one pointer-update stream.
//!
//! The browser layer decodes `TouchEvent`/`MouseEvent` into [`NativeEvent`]s;
//! this module keeps track of which contacts are down on each element, drops
//! stray updates, and suppresses the compatibility mouse events browsers
//! synthesize after a touch.

use std::collections::{BTreeSet, HashMap};

use crate::model::{DefaultAction, ElementId, Point, PointerId};

/// Mouse events this soon after a touch on the same element are treated as
/// the browser's emulated mouse events and dropped.
pub const GHOST_MOUSE_WINDOW_MS: f64 = 800.0;

pub const PRIMARY_BUTTON: i16 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Touch,
    Mouse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub id: i32,
    pub x: f64,
    pub y: f64,
}

impl Contact {
    pub fn new(id: i32, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

/// A decoded native event. For touch, `contacts` holds the changed touches;
/// for mouse it holds one entry whose id is unused.
#[derive(Clone, Debug)]
pub struct NativeEvent {
    pub source: InputSource,
    pub phase: PointerPhase,
    pub contacts: Vec<Contact>,
    pub button: i16,
    pub time: f64,
    pub default_action: DefaultAction,
}

impl NativeEvent {
    pub fn touch(phase: PointerPhase, contacts: Vec<Contact>, time: f64) -> Self {
        Self {
            source: InputSource::Touch,
            phase,
            contacts,
            button: PRIMARY_BUTTON,
            time,
            default_action: DefaultAction::none(),
        }
    }

    pub fn mouse(phase: PointerPhase, x: f64, y: f64, button: i16, time: f64) -> Self {
        Self {
            source: InputSource::Mouse,
            phase,
            contacts: vec![Contact::new(0, x, y)],
            button,
            time,
            default_action: DefaultAction::none(),
        }
    }

    pub fn with_default_action(mut self, action: DefaultAction) -> Self {
        self.default_action = action;
        self
    }
}

#[derive(Clone, Debug)]
pub struct PointerUpdate {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub position: Point,
    pub time: f64,
    pub default_action: DefaultAction,
}

#[derive(Debug, Default)]
struct ElementContacts {
    active: BTreeSet<PointerId>,
    last_touch: Option<f64>,
}

impl ElementContacts {
    fn touch_active(&self) -> bool {
        self.active.iter().any(|p| matches!(p, PointerId::Touch(_)))
    }

    fn is_ghost_mouse(&self, time: f64) -> bool {
        self.touch_active()
            || self
                .last_touch
                .is_some_and(|t| time >= t && time - t < GHOST_MOUSE_WINDOW_MS)
    }
}

#[derive(Debug, Default)]
pub struct PointerStreamNormalizer {
    elements: HashMap<ElementId, ElementContacts>,
}

impl PointerStreamNormalizer {
    pub fn normalize(&mut self, element: ElementId, event: NativeEvent) -> Vec<PointerUpdate> {
        let contacts = self.elements.entry(element).or_default();
        match event.source {
            InputSource::Touch => Self::normalize_touch(element, contacts, event),
            InputSource::Mouse => Self::normalize_mouse(element, contacts, event),
        }
    }

    fn normalize_touch(
        element: ElementId,
        contacts: &mut ElementContacts,
        event: NativeEvent,
    ) -> Vec<PointerUpdate> {
        contacts.last_touch = Some(event.time);
        let mut out = Vec::with_capacity(event.contacts.len());
        for c in &event.contacts {
            let pointer = PointerId::Touch(c.id);
            match event.phase {
                PointerPhase::Start => {
                    if !contacts.active.insert(pointer) {
                        log::debug!("{element:?}: duplicate start for {pointer:?}, restarting");
                    }
                }
                PointerPhase::Move => {
                    if !contacts.active.contains(&pointer) {
                        log::debug!("{element:?}: move for unknown {pointer:?} dropped");
                        continue;
                    }
                }
                PointerPhase::End | PointerPhase::Cancel => {
                    if !contacts.active.remove(&pointer) {
                        log::debug!(
                            "{element:?}: {:?} for unknown {pointer:?} dropped",
                            event.phase
                        );
                        continue;
                    }
                }
            }
            out.push(PointerUpdate {
                pointer,
                phase: event.phase,
                position: Point::new(c.x, c.y),
                time: event.time,
                default_action: event.default_action.clone(),
            });
        }
        out
    }

    fn normalize_mouse(
        element: ElementId,
        contacts: &mut ElementContacts,
        event: NativeEvent,
    ) -> Vec<PointerUpdate> {
        let pointer = PointerId::Mouse;
        let Some(c) = event.contacts.first().copied() else {
            log::debug!("{element:?}: mouse event without coordinates dropped");
            return Vec::new();
        };
        if contacts.is_ghost_mouse(event.time) {
            log::debug!("{element:?}: emulated mouse {:?} suppressed", event.phase);
            return Vec::new();
        }
        let known = contacts.active.contains(&pointer);
        let accept = match event.phase {
            PointerPhase::Start => {
                if event.button != PRIMARY_BUTTON {
                    return Vec::new();
                }
                if known {
                    log::debug!("{element:?}: mousedown while already down, restarting");
                }
                contacts.active.insert(pointer);
                true
            }
            // Hover moves and window-level mouseups for other elements are
            // routine; only pressed moves and our own release matter.
            PointerPhase::Move => known,
            PointerPhase::End => {
                if event.button != PRIMARY_BUTTON {
                    return Vec::new();
                }
                contacts.active.remove(&pointer)
            }
            PointerPhase::Cancel => contacts.active.remove(&pointer),
        };
        if !accept {
            return Vec::new();
        }
        vec![PointerUpdate {
            pointer,
            phase: event.phase,
            position: Point::new(c.x, c.y),
            time: event.time,
            default_action: event.default_action,
        }]
    }

    /// Window blur or similar: every active contact on every element is
    /// cancelled. Positions are unknown so the updates carry the origin;
    /// cancel never reads them.
    pub fn cancel_all(&mut self, time: f64) -> Vec<(ElementId, PointerUpdate)> {
        let mut out = Vec::new();
        let mut elements: Vec<_> = self.elements.iter_mut().collect();
        elements.sort_by_key(|(id, _)| **id);
        for (element, contacts) in elements {
            for pointer in std::mem::take(&mut contacts.active) {
                out.push((
                    *element,
                    PointerUpdate {
                        pointer,
                        phase: PointerPhase::Cancel,
                        position: Point::default(),
                        time,
                        default_action: DefaultAction::none(),
                    },
                ));
            }
        }
        out
    }

    pub fn forget(&mut self, element: ElementId) {
        self.elements.remove(&element);
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn active_count(&self, element: ElementId) -> usize {
        self.elements.get(&element).map_or(0, |c| c.active.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EL: ElementId = ElementId(1);

    #[test]
    fn touch_updates_are_keyed_by_identifier() {
        let mut n = PointerStreamNormalizer::default();
        let ups = n.normalize(
            EL,
            NativeEvent::touch(
                PointerPhase::Start,
                vec![Contact::new(3, 1.0, 2.0), Contact::new(7, 5.0, 6.0)],
                0.0,
            ),
        );
        assert_eq!(ups.len(), 2);
        assert_eq!(ups[1].pointer, PointerId::Touch(7));
        assert_eq!(n.active_count(EL), 2);
        n.normalize(
            EL,
            NativeEvent::touch(PointerPhase::End, vec![Contact::new(3, 1.0, 2.0)], 50.0),
        );
        assert_eq!(n.active_count(EL), 1);
    }

    #[test]
    fn stray_end_is_dropped() {
        let mut n = PointerStreamNormalizer::default();
        let ups = n.normalize(
            EL,
            NativeEvent::touch(PointerPhase::End, vec![Contact::new(9, 0.0, 0.0)], 0.0),
        );
        assert!(ups.is_empty());
        let ups = n.normalize(
            EL,
            NativeEvent::touch(PointerPhase::Cancel, vec![Contact::new(9, 0.0, 0.0)], 0.0),
        );
        assert!(ups.is_empty());
    }

    #[test]
    fn mouse_after_touch_is_suppressed() {
        let mut n = PointerStreamNormalizer::default();
        n.normalize(
            EL,
            NativeEvent::touch(PointerPhase::Start, vec![Contact::new(0, 1.0, 1.0)], 0.0),
        );
        n.normalize(
            EL,
            NativeEvent::touch(PointerPhase::End, vec![Contact::new(0, 1.0, 1.0)], 90.0),
        );
        let ghost = n.normalize(EL, NativeEvent::mouse(PointerPhase::Start, 1.0, 1.0, 0, 120.0));
        assert!(ghost.is_empty());
        let real = n.normalize(
            EL,
            NativeEvent::mouse(PointerPhase::Start, 1.0, 1.0, 0, 90.0 + GHOST_MOUSE_WINDOW_MS),
        );
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].pointer, PointerId::Mouse);
    }

    #[test]
    fn mouse_moves_only_while_pressed() {
        let mut n = PointerStreamNormalizer::default();
        assert!(
            n.normalize(EL, NativeEvent::mouse(PointerPhase::Move, 4.0, 4.0, 0, 0.0))
                .is_empty()
        );
        assert!(
            n.normalize(EL, NativeEvent::mouse(PointerPhase::Start, 4.0, 4.0, 2, 1.0))
                .is_empty()
        );
        n.normalize(EL, NativeEvent::mouse(PointerPhase::Start, 4.0, 4.0, 0, 2.0));
        assert_eq!(
            n.normalize(EL, NativeEvent::mouse(PointerPhase::Move, 9.0, 4.0, 0, 3.0))
                .len(),
            1
        );
        // Releasing the right button leaves the primary press in place.
        assert!(
            n.normalize(EL, NativeEvent::mouse(PointerPhase::End, 9.0, 4.0, 2, 3.5))
                .is_empty()
        );
        assert_eq!(n.active_count(EL), 1);
        assert_eq!(
            n.normalize(EL, NativeEvent::mouse(PointerPhase::End, 9.0, 4.0, 0, 4.0))
                .len(),
            1
        );
        assert!(
            n.normalize(EL, NativeEvent::mouse(PointerPhase::End, 9.0, 4.0, 0, 5.0))
                .is_empty()
        );
    }

    #[test]
    fn cancel_all_empties_every_element() {
        let mut n = PointerStreamNormalizer::default();
        n.normalize(
            ElementId(2),
            NativeEvent::touch(PointerPhase::Start, vec![Contact::new(1, 0.0, 0.0)], 0.0),
        );
        n.normalize(EL, NativeEvent::mouse(PointerPhase::Start, 0.0, 0.0, 0, 0.0));
        let cancelled = n.cancel_all(10.0);
        assert_eq!(cancelled.len(), 2);
        assert_eq!(cancelled[0].0, EL);
        assert!(cancelled.iter().all(|(_, u)| u.phase == PointerPhase::Cancel));
        assert_eq!(n.active_count(EL) + n.active_count(ElementId(2)), 0);
    }
}
