// Tap held back while the double-tap window is open.

use super::TimerId;
use crate::model::GestureEvent;

#[derive(Clone, Debug)]
pub struct PendingTap {
    pub event: GestureEvent,
    pub released_at: f64,
    pub timer: Option<TimerId>,
}

#[derive(Clone, Debug, Default)]
pub struct TapHistory {
    pending: Option<PendingTap>,
}

impl TapHistory {
    /// Takes the pending tap if it was released within `window` ms of `now`.
    pub fn take_within(&mut self, now: f64, window: f64) -> Option<PendingTap> {
        match &self.pending {
            Some(p) if now - p.released_at <= window => self.pending.take(),
            _ => None,
        }
    }

    pub fn hold(&mut self, tap: PendingTap) -> Option<PendingTap> {
        self.pending.replace(tap)
    }

    pub fn take(&mut self) -> Option<PendingTap> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
