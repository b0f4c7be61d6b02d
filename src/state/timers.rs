// Timer bookkeeping. Every armed timer is recorded against the lane (and for
// long-press, the pointer) that owns it, so teardown can cancel them all.

use std::collections::HashMap;

use super::LaneId;
use crate::model::PointerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    LongPress { lane: LaneId, pointer: PointerId },
    DoubleTapWindow { lane: LaneId },
}

impl TimerKind {
    pub fn lane(&self) -> LaneId {
        match *self {
            TimerKind::LongPress { lane, .. } | TimerKind::DoubleTapWindow { lane } => lane,
        }
    }
}

/// Host timer primitive. `deadline` is on the same clock as event timestamps.
pub trait Scheduler {
    fn schedule(&mut self, timer: TimerId, deadline: f64);
    fn cancel(&mut self, timer: TimerId);
}

#[derive(Debug, Default)]
pub struct TimerTable {
    next: u64,
    armed: HashMap<TimerId, TimerKind>,
}

impl TimerTable {
    pub fn arm(
        &mut self,
        scheduler: &mut dyn Scheduler,
        kind: TimerKind,
        deadline: f64,
    ) -> TimerId {
        self.next += 1;
        let id = TimerId(self.next);
        self.armed.insert(id, kind);
        scheduler.schedule(id, deadline);
        id
    }

    pub fn disarm(&mut self, scheduler: &mut dyn Scheduler, id: TimerId) -> bool {
        if self.armed.remove(&id).is_some() {
            scheduler.cancel(id);
            true
        } else {
            false
        }
    }

    /// Claims a timer that just fired. `None` means it was already cancelled.
    pub fn take(&mut self, id: TimerId) -> Option<TimerKind> {
        self.armed.remove(&id)
    }

    pub fn kind(&self, id: TimerId) -> Option<TimerKind> {
        self.armed.get(&id).copied()
    }

    pub fn disarm_lane(&mut self, scheduler: &mut dyn Scheduler, lane: LaneId) -> usize {
        let ids: Vec<TimerId> = self
            .armed
            .iter()
            .filter(|(_, kind)| kind.lane() == lane)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.disarm(scheduler, *id);
        }
        ids.len()
    }

    pub fn disarm_all(&mut self, scheduler: &mut dyn Scheduler) {
        for (id, _) in self.armed.drain() {
            scheduler.cancel(id);
        }
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        scheduled: Vec<(TimerId, f64)>,
        cancelled: Vec<TimerId>,
    }

    impl Scheduler for Log {
        fn schedule(&mut self, timer: TimerId, deadline: f64) {
            self.scheduled.push((timer, deadline));
        }
        fn cancel(&mut self, timer: TimerId) {
            self.cancelled.push(timer);
        }
    }

    #[test]
    fn take_after_disarm_is_none() {
        let mut log = Log::default();
        let mut table = TimerTable::default();
        let id = table.arm(&mut log, TimerKind::DoubleTapWindow { lane: LaneId(1) }, 300.0);
        assert_eq!(log.scheduled, vec![(id, 300.0)]);
        assert!(table.disarm(&mut log, id));
        assert!(!table.disarm(&mut log, id));
        assert_eq!(table.take(id), None);
        assert_eq!(log.cancelled, vec![id]);
    }

    #[test]
    fn disarm_lane_leaves_other_lanes() {
        let mut log = Log::default();
        let mut table = TimerTable::default();
        table.arm(
            &mut log,
            TimerKind::LongPress {
                lane: LaneId(1),
                pointer: PointerId::Touch(0),
            },
            500.0,
        );
        table.arm(&mut log, TimerKind::DoubleTapWindow { lane: LaneId(1) }, 300.0);
        let keep = table.arm(&mut log, TimerKind::DoubleTapWindow { lane: LaneId(2) }, 300.0);
        assert_eq!(table.disarm_lane(&mut log, LaneId(1)), 2);
        assert_eq!(table.len(), 1);
        assert!(table.kind(keep).is_some());
    }
}
