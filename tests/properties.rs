//! Invariants that must hold for any input sequence, not just the scripted
//! scenarios in the other suites.

use std::f64::consts::TAU;

use proptest::prelude::*;
use touch_gestures::engine::{Contact, PointerPhase};
use touch_gestures::testing::{Harness, Recorded};
use touch_gestures::{ElementId, GestureFilter, GestureKind, GesturePhase, SwipeFilter};

const EL: ElementId = ElementId(11);

struct Everything {
    taps: Recorded,
    doubles: Recorded,
    presses: Recorded,
    swipes: Recorded,
    drags: Recorded,
    pinches: Recorded,
}

impl Everything {
    fn on(h: &mut Harness) -> Self {
        Self {
            taps: h.record(EL, GestureKind::Tap),
            doubles: h.record(EL, GestureKind::DoubleTap),
            presses: h.record(EL, GestureKind::LongPress),
            swipes: h.record(EL, GestureFilter::swipe(SwipeFilter::Any)),
            drags: h.record(EL, GestureKind::Drag),
            pinches: h.record(EL, GestureKind::Pinch),
        }
    }

    fn total(&self) -> usize {
        [
            &self.taps,
            &self.doubles,
            &self.presses,
            &self.swipes,
            &self.drags,
            &self.pinches,
        ]
        .iter()
        .map(|r| r.borrow().len())
        .sum()
    }
}

/// A press that wobbles inside the default 10 px threshold and lifts before
/// the long-press delay.
fn short_press() -> impl Strategy<Value = (Vec<(f64, f64)>, f64)> {
    (
        prop::collection::vec((-6.0..6.0f64, -6.0..6.0f64), 0..5),
        1.0..140.0f64,
    )
}

fn press(h: &mut Harness, id: i32, wobble: &[(f64, f64)], at: f64, duration: f64) {
    let (x, y) = (100.0, 100.0);
    h.touch_start(EL, id, x, y, at);
    let steps = wobble.len() as f64 + 1.0;
    for (i, (dx, dy)) in wobble.iter().enumerate() {
        let t = at + duration * (i as f64 + 1.0) / steps;
        h.touch_move(EL, id, x + dx, y + dy, t);
    }
    let (dx, dy) = wobble.last().copied().unwrap_or_default();
    h.touch_end(EL, id, x + dx, y + dy, at + duration);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn press_inside_the_threshold_is_exactly_one_tap(
        (wobble, duration) in short_press(),
        second in prop::option::of((1.0..150.0f64, short_press())),
    ) {
        let mut h = Harness::new();
        let all = Everything::on(&mut h);

        press(&mut h, 0, &wobble, 0.0, duration);
        if let Some((gap, (wobble2, duration2))) = &second {
            press(&mut h, 0, wobble2, duration + gap, *duration2);
        }
        h.advance_to(10_000.0);

        let (taps, doubles) = (all.taps.borrow().len(), all.doubles.borrow().len());
        prop_assert_eq!(taps + doubles, 1);
        prop_assert_eq!(doubles, usize::from(second.is_some()));
        prop_assert_eq!(all.total(), 1);
        prop_assert_eq!(h.engine.armed_timers(), 0);
    }

    #[test]
    fn motion_past_the_threshold_ends_in_one_swipe_or_drag(
        radius in 15.0..300.0f64,
        angle in 0.0..TAU,
        moves in 0usize..5,
        duration in 1.0..450.0f64,
    ) {
        let mut h = Harness::new();
        let all = Everything::on(&mut h);
        let (tx, ty) = (radius * angle.cos(), radius * angle.sin());

        h.touch_start(EL, 0, 0.0, 0.0, 0.0);
        let steps = moves as f64 + 1.0;
        for i in 1..=moves {
            let f = i as f64 / steps;
            h.touch_move(EL, 0, tx * f, ty * f, duration * f);
        }
        h.touch_end(EL, 0, tx, ty, duration);
        h.advance_to(10_000.0);

        let swipes = all.swipes.borrow().len();
        let drag_ends = all
            .drags
            .borrow()
            .iter()
            .filter(|e| e.phase == GesturePhase::End)
            .count();
        prop_assert_eq!(swipes + drag_ends, 1);
        prop_assert!(all.taps.borrow().is_empty());
        prop_assert!(all.doubles.borrow().is_empty());
        prop_assert!(all.presses.borrow().is_empty());
        prop_assert_eq!(h.engine.armed_timers(), 0);
    }

    #[test]
    fn cancel_reports_nothing_and_leaves_no_timers(
        contacts in 1i32..4,
        travel in prop::collection::vec(0.0..80.0f64, 0..4),
        hold in 0.0..1_200.0f64,
    ) {
        let mut h = Harness::new();
        let all = Everything::on(&mut h);

        for id in 0..contacts {
            h.touch_start(EL, id, 50.0 * f64::from(id), 0.0, 0.0);
        }
        for (i, dx) in travel.iter().enumerate() {
            h.touch_move(EL, 0, *dx, 0.0, 10.0 * (i as f64 + 1.0));
        }
        h.advance_to(50.0 + hold);
        let before = all.total();

        let down: Vec<Contact> = (0..contacts)
            .map(|id| Contact::new(id, 50.0 * f64::from(id), 0.0))
            .collect();
        let delivered = h.touch(EL, PointerPhase::Cancel, down, 60.0 + hold);
        prop_assert_eq!(delivered, 0);
        h.advance_to(10_000.0);

        prop_assert_eq!(all.total(), before);
        prop_assert_eq!(h.engine.armed_timers(), 0);
        prop_assert_eq!(h.engine.scheduler().pending(), 0);
        prop_assert_eq!(h.engine.active_pointers(EL), 0);
    }

    #[test]
    fn pinch_scale_follows_the_finger_spread(
        mut spreads in prop::collection::vec(5.0..400.0f64, 2..8),
        widening in any::<bool>(),
    ) {
        spreads.sort_by(f64::total_cmp);
        if !widening {
            spreads.reverse();
        }
        let mut h = Harness::new();
        let pinches = h.record(EL, GestureKind::Pinch);

        h.touch_start(EL, 0, 0.0, 0.0, 0.0);
        h.touch_start(EL, 1, spreads[0], 0.0, 0.0);
        for (i, d) in spreads.iter().enumerate().skip(1) {
            h.touch_move(EL, 1, *d, 0.0, 10.0 * i as f64);
        }
        h.touch_end(EL, 1, spreads[spreads.len() - 1], 0.0, 500.0);

        let events = pinches.borrow();
        prop_assert_eq!(events[0].phase, GesturePhase::Start);
        prop_assert_eq!(events[events.len() - 1].phase, GesturePhase::End);
        let scales: Vec<f64> = events.iter().filter_map(|e| e.scale).collect();
        prop_assert_eq!(scales.len(), events.len());
        for pair in scales.windows(2) {
            if widening {
                prop_assert!(pair[1] >= pair[0] - 1e-9, "{:?}", scales);
            } else {
                prop_assert!(pair[1] <= pair[0] + 1e-9, "{:?}", scales);
            }
        }
        let expected = spreads[spreads.len() - 1] / spreads[0];
        prop_assert!((scales[scales.len() - 1] - expected).abs() < 1e-9);
    }
}
