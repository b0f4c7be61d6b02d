pub mod pinch;
pub mod taps;
pub mod timers;
pub mod track;

pub use pinch::{PinchSample, PinchTracker};
pub use taps::{PendingTap, TapHistory};
pub use timers::{Scheduler, TimerId, TimerKind, TimerTable};
pub use track::{PointerTrack, TrackState};

/// A group of subscriptions on one element sharing identical options, and
/// therefore one recognizer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(pub u32);
