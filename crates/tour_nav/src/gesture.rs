//! Transient gesture state and the rules that classify pointer input.
//!
//! Per tick the controller decides between four mutually exclusive intents:
//! pinch-zoom, look-drag, tap-to-move and discrete grid steps. Pinch always
//! wins; entering it drops any drag, pending look delta and press.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::grid::{GridCell, GridPlane};
use crate::scene::LayerMask;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Minimum seconds between two grid steps.
    pub input_repeat_delay: f32,
    /// Movement axes shorter than this are ignored.
    pub move_deadzone: f32,
    /// Degrees per pixel per second of look drag.
    pub look_sensitivity: f32,
    pub invert_y: bool,
    /// Look and zoom rates are divided by this on touch devices.
    pub mobile_sensitivity_divider: f32,
    /// Degrees of fov per wheel notch per second.
    pub mouse_wheel_zoom_speed: f32,
    /// Degrees of fov per pixel of pinch spread.
    pub pinch_zoom_speed: f32,
    pub enable_tap_move: bool,
    pub tap_hit_mask: LayerMask,
    pub tap_max_distance: f32,
    /// Longest press (seconds) still counted as a tap.
    pub tap_max_time: f32,
    /// Farthest pointer travel (pixels) still counted as a tap.
    pub tap_max_move_pixels: f32,
    /// Resolve a tap to the nearest indexed cell rather than the cell under
    /// the hit point.
    pub tap_snap_to_nearest: bool,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            input_repeat_delay: 0.18,
            move_deadzone: 0.2,
            look_sensitivity: 120.0,
            invert_y: false,
            mobile_sensitivity_divider: 15.0,
            mouse_wheel_zoom_speed: 12.0,
            pinch_zoom_speed: 0.06,
            enable_tap_move: true,
            tap_hit_mask: LayerMask::ALL,
            tap_max_distance: 250.0,
            tap_max_time: 0.22,
            tap_max_move_pixels: 12.0,
            tap_snap_to_nearest: true,
        }
    }
}

impl GestureSettings {
    /// Shared by the event-driven and the polled tap paths.
    #[inline]
    pub fn is_tap(&self, held: f32, travel: f32) -> bool {
        held <= self.tap_max_time && travel <= self.tap_max_move_pixels
    }
}

/// Coarse classification of the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    /// Button or finger down; may still become a tap.
    PressPending,
    /// Look-rotating while the pointer is held.
    Dragging,
    /// Two fingers down; zoom only.
    Pinching,
}

/// A press that may turn into a tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressState {
    pub time: f32,
    pub position: Vec2,
    /// Farthest distance the pointer has been from `position`.
    pub travel: f32,
}

impl PressState {
    pub fn new(time: f32, position: Vec2) -> Self {
        Self {
            time,
            position,
            travel: 0.0,
        }
    }

    pub fn track(&mut self, pointer: Vec2) {
        self.travel = self.travel.max(pointer.distance(self.position));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureState {
    pub(crate) move_input: Vec2,
    pub(crate) look_delta: Vec2,
    pub(crate) dragging: bool,
    pub(crate) pinching: bool,
    pub(crate) press: Option<PressState>,
    pub(crate) pointer: Option<Vec2>,
    pub(crate) last_pinch_distance: Option<f32>,
}

impl GestureState {
    pub fn phase(&self) -> GesturePhase {
        if self.pinching {
            GesturePhase::Pinching
        } else if self.dragging {
            GesturePhase::Dragging
        } else if self.press.is_some() {
            GesturePhase::PressPending
        } else {
            GesturePhase::Idle
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_pinching(&self) -> bool {
        self.pinching
    }

    pub fn look_delta(&self) -> Vec2 {
        self.look_delta
    }

    pub fn press(&self) -> Option<&PressState> {
        self.press.as_ref()
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn move_input(&self) -> Vec2 {
        self.move_input
    }

    /// Whether the current press has already travelled too far to be a tap.
    pub fn moved_too_much(&self, max_pixels: f32) -> bool {
        self.press.is_some_and(|p| p.travel > max_pixels)
    }

    pub(crate) fn enter_pinch(&mut self) {
        self.pinching = true;
        self.dragging = false;
        self.look_delta = Vec2::ZERO;
        self.press = None;
    }

    pub(crate) fn track_pointer(&mut self) {
        if let (Some(press), Some(pointer)) = (self.press.as_mut(), self.pointer) {
            press.track(pointer);
        }
    }

    /// Forgets everything about the gesture in flight. The movement axis is
    /// kept since it mirrors a held key, not a pointer.
    pub(crate) fn reset_transient(&mut self) {
        self.dragging = false;
        self.pinching = false;
        self.look_delta = Vec2::ZERO;
        self.press = None;
        self.last_pinch_distance = None;
    }
}

/// Converts a movement axis into one cardinal grid step relative to where
/// the camera faces. Returns [`GridCell::ZERO`] inside the dead zone.
pub fn cardinal_step(input: Vec2, forward: Vec3, right: Vec3, plane: GridPlane, deadzone: f32) -> GridCell {
    if input.length_squared() < deadzone * deadzone {
        return GridCell::ZERO;
    }

    let up = plane.normal();
    let flatten = |v: Vec3| (v - up * v.dot(up)).normalize_or_zero();
    let desired = plane.planar(flatten(forward) * input.y + flatten(right) * input.x);
    if desired == Vec2::ZERO {
        return GridCell::ZERO;
    }

    if desired.x.abs() > desired.y.abs() {
        if desired.x > 0.0 {
            GridCell::RIGHT
        } else {
            GridCell::LEFT
        }
    } else if desired.y > 0.0 {
        GridCell::UP
    } else {
        GridCell::DOWN
    }
}
