//! Per-pointer gesture state machine.
//!
//! Each lane (element + options) owns its tracks, its pending tap and its
//! pinch tracker. Pointer updates drive the transitions
//! `Pressed -> Tracking | LongPressed | Pinching`; release classifies, cancel
//! drops the track without emitting anything. Timers arm the two races
//! (press vs long-press, tap vs double-tap) and whichever side happens first
//! disarms the other.

use std::collections::BTreeMap;

use super::normalizer::{PointerPhase, PointerUpdate};
use crate::model::{
    DefaultAction, Direction, ElementId, GestureEvent, GestureKind, GesturePhase, Point, PointerId,
};
use crate::options::GestureOptions;
use crate::state::{
    LaneId, PendingTap, PinchSample, PinchTracker, PointerTrack, Scheduler, TapHistory, TimerId,
    TimerKind, TimerTable, TrackState,
};
use crate::util::{elapsed, velocity};

/// How many subscriptions of each kind a lane serves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Interest {
    counts: [u32; 6],
}

impl Interest {
    pub fn add(&mut self, kind: GestureKind) {
        self.counts[kind.index()] += 1;
    }

    pub fn remove(&mut self, kind: GestureKind) {
        let slot = &mut self.counts[kind.index()];
        *slot = slot.saturating_sub(1);
    }

    pub fn has(&self, kind: GestureKind) -> bool {
        self.counts[kind.index()] > 0
    }
}

/// What a pointer move told us, used to decide on `preventDefault()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Ambiguous,
    Directional(Direction),
    Pinching,
}

#[derive(Clone, Debug)]
pub struct Emission {
    pub lane: LaneId,
    pub event: GestureEvent,
}

pub struct TimerContext<'a> {
    pub table: &'a mut TimerTable,
    pub scheduler: &'a mut dyn Scheduler,
}

impl TimerContext<'_> {
    fn arm(&mut self, kind: TimerKind, deadline: f64) -> TimerId {
        self.table.arm(self.scheduler, kind, deadline)
    }

    fn disarm(&mut self, id: TimerId) {
        self.table.disarm(self.scheduler, id);
    }
}

#[derive(Debug)]
struct Lane {
    id: LaneId,
    element: ElementId,
    options: GestureOptions,
    interest: Interest,
    /// Some subscription on the element wants double-taps, so taps are held.
    pairs_taps: bool,
    tracks: BTreeMap<PointerId, PointerTrack>,
    taps: TapHistory,
    pinch: PinchTracker,
    /// Baseline of a pinch resumed by a cancel, reported with its first move.
    unannounced: Option<PinchSample>,
}

impl Lane {
    fn threshold(&self) -> f64 {
        self.options.distance_threshold
    }

    fn start(
        &mut self,
        u: &PointerUpdate,
        timers: &mut TimerContext<'_>,
        events: &mut Vec<GestureEvent>,
    ) {
        if self.tracks.contains_key(&u.pointer) {
            log::debug!("{:?}: restarting stale track {:?}", self.id, u.pointer);
            self.cancel(u, timers);
        }
        let mut track = PointerTrack::new(u.pointer, self.element, u.position, u.time);
        match self.tracks.len() {
            0 => {
                if self.interest.has(GestureKind::LongPress) {
                    track.long_press = Some(timers.arm(
                        TimerKind::LongPress {
                            lane: self.id,
                            pointer: u.pointer,
                        },
                        u.time + self.options.time_threshold,
                    ));
                }
                self.tracks.insert(u.pointer, track);
            }
            1 => {
                self.tracks.insert(u.pointer, track);
                self.begin_pinch(u.time, &u.default_action, timers, events);
            }
            _ => {
                track.state = TrackState::Pinching;
                let announced = self.unannounced.take().is_none();
                if self.pinch.is_active() && announced {
                    if let Some(sample) = self.current_pinch() {
                        events.push(self.pinch_event(
                            GesturePhase::End,
                            sample,
                            u.time,
                            &u.default_action,
                        ));
                    }
                }
                self.pinch.suspend();
                self.tracks.insert(u.pointer, track);
                log::debug!("{:?}: third contact, pinch suspended", self.id);
            }
        }
    }

    fn begin_pinch(
        &mut self,
        time: f64,
        default_action: &DefaultAction,
        timers: &mut TimerContext<'_>,
        events: &mut Vec<GestureEvent>,
    ) {
        for track in self.tracks.values_mut() {
            if let Some(timer) = track.long_press.take() {
                timers.disarm(timer);
            }
            track.state = TrackState::Pinching;
            track.dragging = false;
        }
        if let Some((a, b)) = self.pair() {
            let sample = self.pinch.begin(a, b, time);
            events.push(self.pinch_event(GesturePhase::Start, sample, time, default_action));
        }
    }

    fn moved(
        &mut self,
        u: &PointerUpdate,
        timers: &mut TimerContext<'_>,
        events: &mut Vec<GestureEvent>,
    ) -> MoveOutcome {
        let (id, element, threshold) = (self.id, self.element, self.threshold());
        let Some(track) = self.tracks.get_mut(&u.pointer) else {
            log::debug!("{id:?}: move for untracked {:?}", u.pointer);
            return MoveOutcome::Ambiguous;
        };
        track.update(u.position, u.time);
        let phase = match track.state {
            TrackState::Pinching => None,
            TrackState::Pressed => {
                if track.displacement() <= threshold {
                    return MoveOutcome::Ambiguous;
                }
                if let Some(timer) = track.long_press.take() {
                    timers.disarm(timer);
                }
                track.moved = true;
                track.dragging = true;
                track.state = TrackState::Tracking;
                Some(GesturePhase::Start)
            }
            TrackState::Tracking => Some(GesturePhase::Update),
            TrackState::LongPressed => {
                if track.dragging {
                    Some(GesturePhase::Update)
                } else if track.displacement() > threshold {
                    track.moved = true;
                    track.dragging = true;
                    Some(GesturePhase::Start)
                } else {
                    return MoveOutcome::Ambiguous;
                }
            }
        };
        match phase {
            Some(phase) => {
                let event = drag_event(track, phase, element, threshold, u.time, &u.default_action);
                events.push(event);
                direction_of(track, threshold)
            }
            None => match self.current_pinch() {
                Some(sample) => {
                    if let Some(start) = self.unannounced.take() {
                        let resumed =
                            self.pinch_event(GesturePhase::Start, start, u.time, &u.default_action);
                        events.push(resumed);
                    }
                    events.push(self.pinch_event(
                        GesturePhase::Update,
                        sample,
                        u.time,
                        &u.default_action,
                    ));
                    MoveOutcome::Pinching
                }
                None => MoveOutcome::Ambiguous,
            },
        }
    }

    fn release(
        &mut self,
        u: &PointerUpdate,
        timers: &mut TimerContext<'_>,
        events: &mut Vec<GestureEvent>,
    ) {
        let (id, element, threshold) = (self.id, self.element, self.threshold());
        let Some(track) = self.tracks.get_mut(&u.pointer) else {
            log::debug!("{id:?}: release for untracked {:?}", u.pointer);
            return;
        };
        track.update(u.position, u.time);
        if let Some(timer) = track.long_press.take() {
            timers.disarm(timer);
        }
        if track.state == TrackState::Pressed && track.displacement() > threshold {
            // Lifted past the threshold with no move reported in between.
            track.moved = true;
            track.dragging = true;
            track.state = TrackState::Tracking;
            let action = &u.default_action;
            events.push(drag_event(track, GesturePhase::Start, element, threshold, u.time, action));
        }
        if track.state == TrackState::Pinching {
            let last_sample = if self.tracks.len() == 2 {
                self.current_pinch()
            } else {
                None
            };
            self.tracks.remove(&u.pointer);
            self.contact_left_pinch(u.time, &u.default_action, true, last_sample, events);
            return;
        }
        let Some(track) = self.tracks.remove(&u.pointer) else {
            return;
        };
        match track.state {
            TrackState::Pressed => self.release_pressed(&track, u, timers, events),
            TrackState::Tracking => {
                let distance = track.displacement();
                let speed = velocity(distance, track.duration());
                let kind = if speed >= self.options.velocity_threshold && distance > threshold {
                    GestureKind::Swipe
                } else {
                    GestureKind::Drag
                };
                log::debug!(
                    "{:?}: {:?} released as {kind} ({distance:.1}px, {speed:.3}px/ms)",
                    self.id,
                    track.pointer
                );
                let end = drag_event(
                    &track,
                    GesturePhase::End,
                    self.element,
                    threshold,
                    u.time,
                    &u.default_action,
                );
                events.push(end.with_kind(kind));
            }
            TrackState::LongPressed => {
                if track.dragging {
                    events.push(drag_event(
                        &track,
                        GesturePhase::End,
                        self.element,
                        threshold,
                        u.time,
                        &u.default_action,
                    ));
                }
            }
            TrackState::Pinching => {}
        }
    }

    fn release_pressed(
        &mut self,
        track: &PointerTrack,
        u: &PointerUpdate,
        timers: &mut TimerContext<'_>,
        events: &mut Vec<GestureEvent>,
    ) {
        if !track.tap_eligible {
            return;
        }
        let threshold = self.threshold();
        let duration = track.duration();
        if duration >= self.options.time_threshold {
            // The dwell timer is late; the press is a long-press all the same.
            if self.interest.has(GestureKind::LongPress) {
                events.push(
                    GestureEvent::between(
                        GestureKind::LongPress,
                        GesturePhase::End,
                        self.element,
                        track.start,
                        track.last,
                        duration,
                        threshold,
                    )
                    .at(u.time)
                    .with_default_action(u.default_action.clone()),
                );
            }
            return;
        }
        let tap = GestureEvent::between(
            GestureKind::Tap,
            GesturePhase::End,
            self.element,
            track.start,
            track.last,
            duration,
            threshold,
        )
        .at(u.time);
        let window = self.options.double_tap_window;
        if let Some(first) = self.taps.take_within(u.time, window) {
            if let Some(timer) = first.timer {
                timers.disarm(timer);
            }
            events.push(
                tap.with_kind(GestureKind::DoubleTap)
                    .with_default_action(u.default_action.clone()),
            );
            return;
        }
        if !self.pairs_taps {
            events.push(tap.with_default_action(u.default_action.clone()));
            return;
        }
        if let Some(stale) = self.taps.take() {
            if let Some(timer) = stale.timer {
                timers.disarm(timer);
            }
            events.push(stale.event);
        }
        let timer = timers.arm(TimerKind::DoubleTapWindow { lane: self.id }, u.time + window);
        self.taps.hold(PendingTap {
            event: tap,
            released_at: u.time,
            timer: Some(timer),
        });
    }

    fn cancel(&mut self, u: &PointerUpdate, timers: &mut TimerContext<'_>) {
        let Some(track) = self.tracks.remove(&u.pointer) else {
            log::debug!("{:?}: cancel for untracked {:?}", self.id, u.pointer);
            return;
        };
        if let Some(timer) = track.long_press {
            timers.disarm(timer);
        }
        if track.state == TrackState::Pinching {
            let mut silent = Vec::new();
            self.contact_left_pinch(u.time, &DefaultAction::none(), false, None, &mut silent);
        }
    }

    /// Bookkeeping after a pinching contact left. Cancelled contacts pass
    /// `emit = false` and nothing is reported now; a pinch the two remaining
    /// contacts resume reports its `Start` with its first update.
    fn contact_left_pinch(
        &mut self,
        time: f64,
        default_action: &DefaultAction,
        emit: bool,
        last_sample: Option<PinchSample>,
        events: &mut Vec<GestureEvent>,
    ) {
        match self.tracks.len() {
            0 => {
                self.pinch.end();
                self.unannounced = None;
            }
            1 => {
                let was_active = self.pinch.end();
                let was_announced = self.unannounced.take().is_none();
                if let Some(sample) = last_sample.filter(|_| emit && was_active && was_announced) {
                    events.push(self.pinch_event(GesturePhase::End, sample, time, default_action));
                }
                if let Some(rest) = self.tracks.values_mut().next() {
                    rest.rebase(time);
                }
            }
            2 => {
                if let Some((a, b)) = self.pair() {
                    let sample = self.pinch.begin(a, b, time);
                    if emit {
                        let start =
                            self.pinch_event(GesturePhase::Start, sample, time, default_action);
                        events.push(start);
                    } else {
                        self.unannounced = Some(sample);
                    }
                }
            }
            _ => {}
        }
    }

    fn pair(&self) -> Option<(Point, Point)> {
        let mut it = self.tracks.values();
        let a = it.next()?.last;
        let b = it.next()?.last;
        Some((a, b))
    }

    fn current_pinch(&self) -> Option<PinchSample> {
        if self.tracks.len() != 2 {
            return None;
        }
        let (a, b) = self.pair()?;
        self.pinch.sample(a, b)
    }

    fn pinch_event(
        &self,
        phase: GesturePhase,
        sample: PinchSample,
        now: f64,
        default_action: &DefaultAction,
    ) -> GestureEvent {
        GestureEvent::between(
            GestureKind::Pinch,
            phase,
            self.element,
            sample.start_midpoint,
            sample.midpoint,
            elapsed(sample.start_time, now),
            self.threshold(),
        )
        .with_pinch(sample.scale, sample.rotation, self.tracks.len())
        .at(now)
        .with_default_action(default_action.clone())
    }
}

fn drag_event(
    track: &PointerTrack,
    phase: GesturePhase,
    element: ElementId,
    threshold: f64,
    now: f64,
    default_action: &DefaultAction,
) -> GestureEvent {
    GestureEvent::between(
        GestureKind::Drag,
        phase,
        element,
        track.start,
        track.last,
        track.duration(),
        threshold,
    )
    .at(now)
    .with_default_action(default_action.clone())
}

fn direction_of(track: &PointerTrack, threshold: f64) -> MoveOutcome {
    if track.displacement() > threshold {
        MoveOutcome::Directional(Direction::from_delta(
            track.last.x - track.start.x,
            track.last.y - track.start.y,
        ))
    } else {
        MoveOutcome::Ambiguous
    }
}

#[derive(Debug, Default)]
pub struct GestureRecognizer {
    lanes: BTreeMap<LaneId, Lane>,
}

impl GestureRecognizer {
    pub fn open_lane(&mut self, lane: LaneId, element: ElementId, options: GestureOptions) {
        self.lanes.entry(lane).or_insert_with(|| Lane {
            id: lane,
            element,
            options,
            interest: Interest::default(),
            pairs_taps: false,
            tracks: BTreeMap::new(),
            taps: TapHistory::default(),
            pinch: PinchTracker::default(),
            unannounced: None,
        });
    }

    /// Drops the lane with its tracks and pending tap; nothing is emitted.
    pub fn close_lane(&mut self, lane: LaneId, timers: &mut TimerContext<'_>) {
        if self.lanes.remove(&lane).is_some() {
            let cancelled = timers.table.disarm_lane(timers.scheduler, lane);
            log::debug!("{lane:?} closed, {cancelled} timer(s) cancelled");
        }
    }

    pub fn interest_mut(&mut self, lane: LaneId) -> Option<&mut Interest> {
        self.lanes.get_mut(&lane).map(|l| &mut l.interest)
    }

    pub fn interest(&self, lane: LaneId) -> Option<&Interest> {
        self.lanes.get(&lane).map(|l| &l.interest)
    }

    /// Whether taps on this lane wait out the double-tap window. Set for
    /// every lane of an element as soon as any of them has double-tap
    /// interest, so no lane reports a tap that another lane pairs.
    pub fn set_pairs_taps(&mut self, lane: LaneId, pairs: bool) {
        if let Some(l) = self.lanes.get_mut(&lane) {
            l.pairs_taps = pairs;
        }
    }

    pub fn lane_element(&self, lane: LaneId) -> Option<ElementId> {
        self.lanes.get(&lane).map(|l| l.element)
    }

    pub fn active_tracks(&self, lane: LaneId) -> usize {
        self.lanes.get(&lane).map_or(0, |l| l.tracks.len())
    }

    pub fn has_pending_tap(&self, lane: LaneId) -> bool {
        self.lanes.get(&lane).is_some_and(|l| l.taps.is_pending())
    }

    pub fn track_state(&self, lane: LaneId, pointer: PointerId) -> Option<TrackState> {
        self.lanes
            .get(&lane)
            .and_then(|l| l.tracks.get(&pointer))
            .map(|t| t.state)
    }

    pub fn pointer_update(
        &mut self,
        lane: LaneId,
        update: &PointerUpdate,
        timers: &mut TimerContext<'_>,
        out: &mut Vec<Emission>,
    ) -> MoveOutcome {
        let Some(state) = self.lanes.get_mut(&lane) else {
            return MoveOutcome::Ambiguous;
        };
        let mut events = Vec::new();
        let outcome = match update.phase {
            PointerPhase::Start => {
                state.start(update, timers, &mut events);
                MoveOutcome::Ambiguous
            }
            PointerPhase::Move => state.moved(update, timers, &mut events),
            PointerPhase::End => {
                state.release(update, timers, &mut events);
                MoveOutcome::Ambiguous
            }
            PointerPhase::Cancel => {
                state.cancel(update, timers);
                MoveOutcome::Ambiguous
            }
        };
        out.extend(events.into_iter().map(|event| Emission { lane, event }));
        outcome
    }

    pub fn timer_fired(&mut self, kind: TimerKind, now: f64, out: &mut Vec<Emission>) {
        let lane_id = kind.lane();
        let Some(lane) = self.lanes.get_mut(&lane_id) else {
            return;
        };
        match kind {
            TimerKind::LongPress { pointer, .. } => {
                let threshold = lane.threshold();
                let element = lane.element;
                let Some(track) = lane.tracks.get_mut(&pointer) else {
                    return;
                };
                if track.state != TrackState::Pressed {
                    return;
                }
                track.long_press = None;
                track.state = TrackState::LongPressed;
                let event = GestureEvent::between(
                    GestureKind::LongPress,
                    GesturePhase::End,
                    element,
                    track.start,
                    track.last,
                    elapsed(track.start_time, now),
                    threshold,
                )
                .at(now);
                out.push(Emission {
                    lane: lane_id,
                    event,
                });
            }
            TimerKind::DoubleTapWindow { .. } => {
                if let Some(pending) = lane.taps.take() {
                    out.push(Emission {
                        lane: lane_id,
                        event: pending.event,
                    });
                }
            }
        }
    }
}
