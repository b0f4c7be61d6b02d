// Two-contact pinch geometry. Scale is relative to the distance at the
// moment the pair formed (or re-formed after a third contact left).

use crate::model::Point;
use crate::util::wrap_degrees;

/// Below this the initial distance is clamped, two contacts on the same
/// pixel would otherwise divide by zero.
const MIN_PINCH_DISTANCE: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Baseline {
    distance: f64,
    angle: f64,
    midpoint: Point,
    time: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchSample {
    pub scale: f64,
    pub rotation: f64,
    pub start_midpoint: Point,
    pub midpoint: Point,
    pub start_time: f64,
    pub distance: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PinchTracker {
    baseline: Option<Baseline>,
    suspended: bool,
}

impl PinchTracker {
    pub fn begin(&mut self, a: Point, b: Point, time: f64) -> PinchSample {
        self.suspended = false;
        let base = Baseline {
            distance: a.distance_to(b).max(MIN_PINCH_DISTANCE),
            angle: a.angle_to(b),
            midpoint: a.midpoint(b),
            time,
        };
        self.baseline = Some(base);
        PinchSample {
            scale: 1.0,
            rotation: 0.0,
            start_midpoint: base.midpoint,
            midpoint: base.midpoint,
            start_time: time,
            distance: a.distance_to(b),
        }
    }

    pub fn sample(&self, a: Point, b: Point) -> Option<PinchSample> {
        if self.suspended {
            return None;
        }
        let base = self.baseline?;
        let distance = a.distance_to(b);
        Some(PinchSample {
            scale: distance / base.distance,
            rotation: wrap_degrees(a.angle_to(b) - base.angle),
            start_midpoint: base.midpoint,
            midpoint: a.midpoint(b),
            start_time: base.time,
            distance,
        })
    }

    /// A third contact arrived. Returns whether a pinch was running.
    pub fn suspend(&mut self) -> bool {
        let was_active = self.is_active();
        self.suspended = true;
        self.baseline = None;
        was_active
    }

    /// Contacts dropped below two. Returns whether a pinch was running.
    pub fn end(&mut self) -> bool {
        let was_active = self.is_active();
        self.baseline = None;
        self.suspended = false;
        was_active
    }

    pub fn is_active(&self) -> bool {
        !self.suspended && self.baseline.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_starts_at_one_and_follows_distance() {
        let mut p = PinchTracker::default();
        let s = p.begin(Point::new(100.0, 100.0), Point::new(150.0, 100.0), 0.0);
        assert_eq!(s.scale, 1.0);
        let wider = p
            .sample(Point::new(75.0, 100.0), Point::new(175.0, 100.0))
            .expect("active");
        assert!((wider.scale - 2.0).abs() < 1e-9);
        let narrower = p
            .sample(Point::new(110.0, 100.0), Point::new(135.0, 100.0))
            .expect("active");
        assert!((narrower.scale - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rotation_is_relative_to_start() {
        let mut p = PinchTracker::default();
        p.begin(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.0);
        let s = p.sample(Point::new(0.0, 0.0), Point::new(0.0, 10.0)).expect("active");
        assert!((s.rotation - 90.0).abs() < 1e-9);
    }

    #[test]
    fn suspended_tracker_yields_nothing() {
        let mut p = PinchTracker::default();
        p.begin(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.0);
        assert!(p.suspend());
        assert!(p.sample(Point::new(0.0, 0.0), Point::new(20.0, 0.0)).is_none());
        assert!(!p.end());
    }

    #[test]
    fn coincident_contacts_do_not_divide_by_zero() {
        let mut p = PinchTracker::default();
        p.begin(Point::new(5.0, 5.0), Point::new(5.0, 5.0), 0.0);
        let s = p.sample(Point::new(5.0, 5.0), Point::new(8.0, 9.0)).expect("active");
        assert_eq!(s.scale, 5.0);
    }
}
