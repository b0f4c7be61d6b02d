// One continuous contact, from start to release or cancel.

use super::TimerId;
use crate::model::{ElementId, Point, PointerId};
use crate::util::elapsed;

/// `Idle` is the absence of a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    /// Down, not yet past the distance threshold.
    Pressed,
    /// Past the distance threshold: drag stream, swipe or drag on release.
    Tracking,
    /// Long-press already emitted.
    LongPressed,
    /// Part of a multi-contact pinch; single-pointer recognition is off.
    Pinching,
}

#[derive(Clone, Debug)]
pub struct PointerTrack {
    pub pointer: PointerId,
    pub element: ElementId,
    pub start: Point,
    pub start_time: f64,
    pub last: Point,
    pub last_time: f64,
    pub moved: bool,
    pub state: TrackState,
    pub long_press: Option<TimerId>,
    /// Cleared for a contact that outlived a pinch.
    pub tap_eligible: bool,
    pub dragging: bool,
}

impl PointerTrack {
    pub fn new(pointer: PointerId, element: ElementId, at: Point, time: f64) -> Self {
        Self {
            pointer,
            element,
            start: at,
            start_time: time,
            last: at,
            last_time: time,
            moved: false,
            state: TrackState::Pressed,
            long_press: None,
            tap_eligible: true,
            dragging: false,
        }
    }

    pub fn update(&mut self, at: Point, time: f64) {
        self.last = at;
        self.last_time = time.max(self.last_time);
    }

    pub fn displacement(&self) -> f64 {
        self.start.distance_to(self.last)
    }

    pub fn duration(&self) -> f64 {
        elapsed(self.start_time, self.last_time)
    }

    /// Restarts the track where it is now, as a contact that can still drag
    /// or swipe but no longer tap.
    pub fn rebase(&mut self, time: f64) {
        self.start = self.last;
        self.start_time = time;
        self.last_time = time;
        self.moved = false;
        self.dragging = false;
        self.tap_eligible = false;
        self.long_press = None;
        self.state = TrackState::Pressed;
    }
}
