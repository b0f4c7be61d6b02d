//! Core gesture types shared by the engine and the browser layer.
//! Elements are referred to by `ElementId`; the browser layer owns the mapping
//! back to DOM nodes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Identity of one contact. The mouse is a single pointer; touches carry the
/// platform's `Touch.identifier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PointerId {
    Mouse,
    Touch(i32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Angle of the segment self -> other, in degrees.
    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureKind {
    Tap,
    DoubleTap,
    LongPress,
    Swipe,
    Drag,
    Pinch,
}

impl GestureKind {
    pub const ALL: [GestureKind; 6] = [
        GestureKind::Tap,
        GestureKind::DoubleTap,
        GestureKind::LongPress,
        GestureKind::Swipe,
        GestureKind::Drag,
        GestureKind::Pinch,
    ];

    pub fn index(self) -> usize {
        match self {
            GestureKind::Tap => 0,
            GestureKind::DoubleTap => 1,
            GestureKind::LongPress => 2,
            GestureKind::Swipe => 3,
            GestureKind::Drag => 4,
            GestureKind::Pinch => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GestureKind::Tap => "tap",
            GestureKind::DoubleTap => "double-tap",
            GestureKind::LongPress => "long-press",
            GestureKind::Swipe => "swipe",
            GestureKind::Drag => "drag",
            GestureKind::Pinch => "pinch",
        }
    }

    /// Drag and pinch stream Start/Update/End; everything else is emitted once.
    pub fn is_stream(self) -> bool {
        matches!(self, GestureKind::Drag | GestureKind::Pinch)
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Dominant axis wins; an exact diagonal counts as vertical.
    pub fn from_delta(dx: f64, dy: f64) -> Direction {
        if dx.abs() > dy.abs() {
            if dx > 0.0 { Direction::Right } else { Direction::Left }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GesturePhase {
    Start,
    Update,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwipeFilter {
    Any,
    Only(Direction),
}

impl From<Direction> for SwipeFilter {
    fn from(dir: Direction) -> Self {
        SwipeFilter::Only(dir)
    }
}

/// What a subscription wants to hear about: a gesture kind, narrowed to one
/// direction for swipes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GestureFilter {
    pub kind: GestureKind,
    pub direction: Option<Direction>,
}

impl GestureFilter {
    pub fn kind(kind: GestureKind) -> Self {
        Self {
            kind,
            direction: None,
        }
    }

    pub fn swipe(filter: SwipeFilter) -> Self {
        let direction = match filter {
            SwipeFilter::Any => None,
            SwipeFilter::Only(dir) => Some(dir),
        };
        Self {
            kind: GestureKind::Swipe,
            direction,
        }
    }

    pub fn matches(&self, event: &GestureEvent) -> bool {
        if event.kind != self.kind {
            return false;
        }
        match self.direction {
            None => true,
            Some(dir) => event.direction == Some(dir),
        }
    }
}

impl From<GestureKind> for GestureFilter {
    fn from(kind: GestureKind) -> Self {
        GestureFilter::kind(kind)
    }
}

/// Handle on the native event's default action. Events produced by timers
/// carry none, and `prevent` is then a no-op.
#[derive(Clone, Default)]
pub struct DefaultAction(Option<Rc<dyn Fn()>>);

impl DefaultAction {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(prevent: impl Fn() + 'static) -> Self {
        Self(Some(Rc::new(prevent)))
    }

    pub fn prevent(&self) {
        if let Some(f) = &self.0 {
            f();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for DefaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DefaultAction")
            .field(&self.is_attached())
            .finish()
    }
}

/// A recognized gesture, handed to listeners by reference.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureEvent {
    #[serde(rename = "type")]
    pub kind: GestureKind,
    pub phase: GesturePhase,
    pub target: ElementId,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    pub direction: Option<Direction>,
    pub distance: f64,
    /// px/ms
    pub velocity: f64,
    /// ms
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Degrees relative to the angle between the two contacts at pinch start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    pub pointer_count: usize,
    pub timestamp: f64,
    #[serde(skip)]
    pub(crate) default_action: DefaultAction,
}

impl GestureEvent {
    /// Builds an event for the motion `start -> end`. `direction` is only set
    /// when the distance exceeds `distance_threshold`.
    pub fn between(
        kind: GestureKind,
        phase: GesturePhase,
        target: ElementId,
        start: Point,
        end: Point,
        duration: f64,
        distance_threshold: f64,
    ) -> Self {
        let delta_x = end.x - start.x;
        let delta_y = end.y - start.y;
        let distance = start.distance_to(end);
        let direction =
            (distance > distance_threshold).then(|| Direction::from_delta(delta_x, delta_y));
        Self {
            kind,
            phase,
            target,
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            delta_x,
            delta_y,
            direction,
            distance,
            velocity: crate::util::velocity(distance, duration),
            duration,
            scale: None,
            rotation: None,
            pointer_count: 1,
            timestamp: 0.0,
            default_action: DefaultAction::none(),
        }
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_default_action(mut self, action: DefaultAction) -> Self {
        self.default_action = action;
        self
    }

    pub fn with_pinch(mut self, scale: f64, rotation: f64, pointer_count: usize) -> Self {
        self.scale = Some(scale);
        self.rotation = Some(rotation);
        self.pointer_count = pointer_count;
        self
    }

    pub fn with_kind(mut self, kind: GestureKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_x, self.end_y)
    }

    /// Forwards to the native event's `preventDefault()` when there is one.
    pub fn prevent_default(&self) {
        self.default_action.prevent();
    }

    pub fn can_prevent_default(&self) -> bool {
        self.default_action.is_attached()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn direction_follows_dominant_axis() {
        assert_eq!(Direction::from_delta(30.0, 5.0), Direction::Right);
        assert_eq!(Direction::from_delta(-30.0, 5.0), Direction::Left);
        assert_eq!(Direction::from_delta(0.0, -200.0), Direction::Up);
        assert_eq!(Direction::from_delta(3.0, 40.0), Direction::Down);
    }

    #[test]
    fn direction_only_past_threshold() {
        let short = GestureEvent::between(
            GestureKind::Drag,
            GesturePhase::Update,
            ElementId(1),
            Point::new(0.0, 0.0),
            Point::new(6.0, 0.0),
            10.0,
            10.0,
        );
        assert_eq!(short.direction, None);
        let long = GestureEvent::between(
            GestureKind::Drag,
            GesturePhase::Update,
            ElementId(1),
            Point::new(0.0, 0.0),
            Point::new(-16.0, 2.0),
            10.0,
            10.0,
        );
        assert_eq!(long.direction, Some(Direction::Left));
        assert!((long.velocity - long.distance / 10.0).abs() < 1e-9);
    }

    #[test]
    fn prevent_default_forwards_when_attached() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let ev = GestureEvent::between(
            GestureKind::Tap,
            GesturePhase::End,
            ElementId(3),
            Point::default(),
            Point::default(),
            20.0,
            10.0,
        )
        .with_default_action(DefaultAction::new(move || h.set(h.get() + 1)));
        ev.prevent_default();
        assert_eq!(hits.get(), 1);
        let bare = ev.clone().with_default_action(DefaultAction::none());
        bare.prevent_default();
        assert_eq!(hits.get(), 1);
        assert!(!bare.can_prevent_default());
    }

    #[test]
    fn event_json_uses_type_key() {
        let ev = GestureEvent::between(
            GestureKind::DoubleTap,
            GesturePhase::End,
            ElementId(9),
            Point::new(1.0, 2.0),
            Point::new(1.0, 2.0),
            50.0,
            10.0,
        );
        let json = ev.to_json();
        assert!(json.contains("\"type\":\"double-tap\""));
        assert!(json.contains("\"startX\":1.0"));
        assert!(!json.contains("scale"));
    }

    #[test]
    fn swipe_filter_narrows_direction() {
        let up = GestureEvent::between(
            GestureKind::Swipe,
            GesturePhase::End,
            ElementId(1),
            Point::new(100.0, 300.0),
            Point::new(100.0, 100.0),
            150.0,
            10.0,
        );
        assert!(GestureFilter::swipe(SwipeFilter::Any).matches(&up));
        assert!(GestureFilter::swipe(Direction::Up.into()).matches(&up));
        assert!(!GestureFilter::swipe(Direction::Left.into()).matches(&up));
        assert!(!GestureFilter::kind(GestureKind::Drag).matches(&up));
    }
}
