use std::cell::{Cell, RefCell};
use std::rc::Rc;

use touch_gestures::engine::{
    BindingChange, Contact, GestureEngine, NativeEvent, PointerPhase, deliver,
};
use touch_gestures::testing::{Harness, ManualScheduler};
use touch_gestures::{ElementId, GestureEvent, GestureKind, GestureOptions};

const EL: ElementId = ElementId(5);

#[test]
fn element_binding_is_reference_counted() {
    let mut engine = GestureEngine::new(ManualScheduler::default());
    let noop = || Rc::new(|_: &GestureEvent| {});

    let (tap, change) =
        engine.add_listener(EL, GestureKind::Tap.into(), noop(), GestureOptions::default());
    assert_eq!(change, BindingChange::Install { passive: true });
    let (swipe, change) =
        engine.add_listener(EL, GestureKind::Swipe.into(), noop(), GestureOptions::default());
    assert_eq!(change, BindingChange::None);
    assert_eq!(engine.listener_count(EL), 2);

    assert_eq!(engine.remove_listener(tap), BindingChange::None);
    assert!(engine.is_bound(EL));
    assert_eq!(engine.remove_listener(swipe), BindingChange::Release);
    assert!(!engine.is_bound(EL));
    assert_eq!(engine.remove_listener(swipe), BindingChange::None);

    let (_, change) =
        engine.add_listener(EL, GestureKind::Tap.into(), noop(), GestureOptions::default());
    assert_eq!(change, BindingChange::Install { passive: true });
}

#[test]
fn prevent_scroll_listener_upgrades_the_binding() {
    let mut engine = GestureEngine::new(ManualScheduler::default());
    let noop = || Rc::new(|_: &GestureEvent| {});
    engine.add_listener(EL, GestureKind::Tap.into(), noop(), GestureOptions::default());
    let (_, change) = engine.add_listener(
        EL,
        GestureKind::Swipe.into(),
        noop(),
        GestureOptions::default().with_prevent_scroll(true),
    );
    assert_eq!(change, BindingChange::Upgrade);
}

#[test]
fn removing_the_last_prevent_scroll_listener_downgrades_the_binding() {
    let mut engine = GestureEngine::new(ManualScheduler::default());
    let noop = || Rc::new(|_: &GestureEvent| {});
    engine.add_listener(EL, GestureKind::Tap.into(), noop(), GestureOptions::default());
    let (strict, _) = engine.add_listener(
        EL,
        GestureKind::Swipe.into(),
        noop(),
        GestureOptions::default().with_prevent_scroll(true),
    );
    assert_eq!(engine.remove_listener(strict), BindingChange::Downgrade);
    assert!(engine.is_bound(EL));
    assert_eq!(engine.remove_listener(strict), BindingChange::None);
}

#[test]
fn unsubscribing_mid_press_cancels_its_timer() {
    let mut h = Harness::new();
    let (id, presses) = h.record_with(EL, GestureKind::LongPress, GestureOptions::default());
    h.touch_start(EL, 0, 10.0, 10.0, 0.0);
    assert_eq!(h.engine.armed_timers(), 1);

    h.advance_to(100.0);
    assert_eq!(h.engine.remove_listener(id), BindingChange::Release);
    assert_eq!(h.engine.armed_timers(), 0);
    assert!(h.engine.scheduler().cancelled() >= 1);

    h.advance_to(1_000.0);
    assert!(presses.borrow().is_empty());
}

#[test]
fn removing_one_kind_keeps_the_others_running() {
    let mut h = Harness::new();
    let (press_id, presses) =
        h.record_with(EL, GestureKind::LongPress, GestureOptions::default());
    let taps = h.record(EL, GestureKind::Tap);

    h.engine.remove_listener(press_id);
    h.touch_start(EL, 0, 10.0, 10.0, 0.0);
    assert_eq!(h.engine.armed_timers(), 0, "no long-press interest left");
    h.touch_end(EL, 0, 10.0, 10.0, 90.0);
    assert_eq!(taps.borrow().len(), 1);
    assert!(presses.borrow().is_empty());
}

#[test]
fn timer_firing_after_cancellation_is_ignored() {
    let mut h = Harness::new();
    let presses = h.record(EL, GestureKind::LongPress);
    h.touch_start(EL, 0, 0.0, 0.0, 0.0);
    let stale = h.engine.scheduler_mut().due(f64::INFINITY);
    assert_eq!(stale.len(), 1);
    h.touch_end(EL, 0, 0.0, 0.0, 100.0);
    for (timer, deadline) in stale {
        assert_eq!(deliver(h.engine.fire_timer(timer, deadline)), 0);
    }
    assert!(presses.borrow().is_empty());
}

#[test]
fn panicking_handler_does_not_starve_the_next_one() {
    let mut h = Harness::new();
    let reached = Rc::new(Cell::new(false));
    let r = reached.clone();
    h.engine.add_listener(
        EL,
        GestureKind::Tap.into(),
        Rc::new(|e: &GestureEvent| {
            if e.kind == GestureKind::Tap {
                panic!("listener bug");
            }
        }),
        GestureOptions::default(),
    );
    h.engine.add_listener(
        EL,
        GestureKind::Tap.into(),
        Rc::new(move |_: &GestureEvent| r.set(true)),
        GestureOptions::default(),
    );
    h.touch_start(EL, 0, 0.0, 0.0, 0.0);
    let completed = h.touch_end(EL, 0, 0.0, 0.0, 50.0);
    assert_eq!(completed, 1);
    assert!(reached.get());
}

#[test]
fn handler_removed_earlier_in_a_batch_is_skipped() {
    let engine = Rc::new(RefCell::new(GestureEngine::new(ManualScheduler::default())));
    let second_ran = Rc::new(Cell::new(false));
    let victim = Rc::new(Cell::new(None));

    let (e, v) = (engine.clone(), victim.clone());
    engine.borrow_mut().add_listener(
        EL,
        GestureKind::Tap.into(),
        Rc::new(move |_: &GestureEvent| {
            if let Some(id) = v.get() {
                e.borrow_mut().remove_listener(id);
            }
        }),
        GestureOptions::default(),
    );
    let ran = second_ran.clone();
    let (id, _) = engine.borrow_mut().add_listener(
        EL,
        GestureKind::Tap.into(),
        Rc::new(move |_: &GestureEvent| ran.set(true)),
        GestureOptions::default(),
    );
    victim.set(Some(id));

    let start = engine.borrow_mut().handle(
        EL,
        NativeEvent::touch(PointerPhase::Start, vec![Contact::new(0, 1.0, 1.0)], 0.0),
    );
    deliver(start);
    let batch = engine.borrow_mut().handle(
        EL,
        NativeEvent::touch(PointerPhase::End, vec![Contact::new(0, 1.0, 1.0)], 40.0),
    );
    assert_eq!(batch.len(), 2);
    assert_eq!(deliver(batch), 1);
    assert!(!second_ran.get());
    assert!(!engine.borrow().is_subscribed(id));
}

#[test]
fn detaching_an_element_drops_its_subscriptions() {
    let mut h = Harness::new();
    let other = ElementId(6);
    let gone = h.record(EL, GestureKind::LongPress);
    let kept = h.record(other, GestureKind::Tap);

    h.touch_start(EL, 0, 0.0, 0.0, 0.0);
    let dropped = h.engine.detach_element(EL);
    assert_eq!(dropped.len(), 1);
    assert!(!h.engine.is_bound(EL));
    assert_eq!(h.engine.armed_timers(), 0);

    h.touch_start(other, 1, 0.0, 0.0, 100.0);
    h.touch_end(other, 1, 0.0, 0.0, 150.0);
    h.advance_to(1_000.0);
    assert!(gone.borrow().is_empty());
    assert_eq!(kept.borrow().len(), 1);
}

#[test]
fn cleanup_releases_everything() {
    let mut h = Harness::new();
    let presses = h.record(EL, GestureKind::LongPress);
    let _taps = h.record(ElementId(9), GestureKind::Tap);
    h.touch_start(EL, 0, 0.0, 0.0, 0.0);

    let released = h.engine.cleanup();
    assert_eq!(released, vec![EL, ElementId(9)]);
    assert_eq!(h.engine.armed_timers(), 0);
    assert_eq!(h.engine.scheduler().pending(), 0);

    h.advance_to(1_000.0);
    h.touch_end(EL, 0, 0.0, 0.0, 1_000.0);
    assert!(presses.borrow().is_empty());
    assert!(!h.engine.is_bound(EL));
}

#[test]
fn events_without_subscriptions_are_dropped() {
    let mut h = Harness::new();
    assert_eq!(h.touch_start(ElementId(42), 0, 0.0, 0.0, 0.0), 0);
    assert_eq!(h.engine.active_pointers(ElementId(42)), 0);
}
