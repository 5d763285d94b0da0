//! Normalized pointer/touch samples.
//!
//! Hosts fill one [`InputFrame`] per tick from whatever device layer they
//! use, and forward bound input actions as [`GestureEvent`]s. Both arrive at
//! the controller through the same tick, so polled and event-driven input
//! share one set of gesture rules.

use glam::Vec2;

/// State of one button during a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSample {
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

impl ButtonSample {
    pub fn held() -> Self {
        Self {
            pressed: true,
            ..Self::default()
        }
    }

    pub fn down() -> Self {
        Self {
            pressed: true,
            just_pressed: true,
            just_released: false,
        }
    }

    pub fn up() -> Self {
        Self {
            pressed: false,
            just_pressed: false,
            just_released: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseSample {
    /// Screen position in pixels, origin top-left.
    pub position: Vec2,
    pub left: ButtonSample,
    /// Scroll accumulated this tick; `y > 0` scrolls up.
    pub scroll: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
    pub phase: TouchPhase,
}

impl TouchPoint {
    /// Finger still in contact with the screen.
    #[inline]
    pub fn in_progress(&self) -> bool {
        matches!(
            self.phase,
            TouchPhase::Began | TouchPhase::Moved | TouchPhase::Stationary
        )
    }
}

/// Device state sampled once per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    /// Seconds since the tour started.
    pub time: f32,
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
    pub mouse: Option<MouseSample>,
    /// Touches in the order the device reports them; the first is primary.
    pub touches: Vec<TouchPoint>,
}

impl InputFrame {
    pub fn new(time: f32, dt: f32, viewport: Vec2) -> Self {
        Self {
            time,
            dt,
            viewport,
            ..Self::default()
        }
    }

    pub fn with_mouse(mut self, mouse: MouseSample) -> Self {
        self.mouse = Some(mouse);
        self
    }

    pub fn with_touch(mut self, touch: TouchPoint) -> Self {
        self.touches.push(touch);
        self
    }

    /// Positions of the two fingers when exactly two are in contact.
    pub fn pinch_points(&self) -> Option<(Vec2, Vec2)> {
        let mut active = self.touches.iter().filter(|t| t.in_progress());
        match (active.next(), active.next(), active.next()) {
            (Some(a), Some(b), None) => Some((a.position, b.position)),
            _ => None,
        }
    }

    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// Whether any pointer (left mouse button or a finger) is held down.
    pub fn pointer_pressed(&self) -> bool {
        self.mouse.is_some_and(|m| m.left.pressed) || self.touches.iter().any(|t| t.in_progress())
    }

    pub fn scroll(&self) -> f32 {
        self.mouse.map_or(0.0, |m| m.scroll.y)
    }
}

/// Bound input actions forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Directional movement axis, each component in [-1, 1].
    Move(Vec2),
    /// Pointer travel in pixels since the previous look event; `y` grows
    /// downward like screen positions.
    Look(Vec2),
    /// Look button pressed or released.
    LookPress(bool),
    /// The system took the pointer away (a cancelled touch). Ends the drag
    /// and drops the press without a tap.
    Cancel,
    /// Zoom axis; positive narrows the field of view.
    Zoom(f32),
    /// Pointer position in pixels.
    Point(Vec2),
}
