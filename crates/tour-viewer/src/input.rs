//! Translates winit window events into the tour's per-frame input.
//!
//! Bound actions (move axis, look drag, look press, pointer) are queued as
//! [`GestureEvent`]s; raw device state (button edges, wheel, touches) is
//! sampled into an [`InputFrame`] once per frame.

use glam::Vec2;
use std::collections::BTreeMap;
use tour_nav::{ButtonSample, GestureEvent, InputFrame, MouseSample, TouchPhase, TouchPoint};
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Pixels per wheel notch reported by touchpads.
const PIXELS_PER_LINE: f32 = 120.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Held {
    left: bool,
    right: bool,
    forward: bool,
    back: bool,
}

impl Held {
    fn axis(self) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.forward as i8 - self.back as i8) as f32;
        Vec2::new(x, y)
    }
}

#[derive(Debug, Default)]
pub struct WinitInput {
    held: Held,
    events: Vec<GestureEvent>,

    cursor: Option<Vec2>,
    button: ButtonSample,
    scroll: f32,
    /// Ordered by first contact so the primary finger stays first.
    touches: BTreeMap<u64, TouchPoint>,
    next_order: u64,
}

impl WinitInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the event was an input event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    return self.key(code, event.state == ElementState::Pressed);
                }
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.left_button(*state == ElementState::Pressed);
                    return true;
                }
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.wheel(lines);
                true
            }
            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    winit::event::TouchPhase::Started => TouchPhase::Began,
                    winit::event::TouchPhase::Moved => TouchPhase::Moved,
                    winit::event::TouchPhase::Ended => TouchPhase::Ended,
                    winit::event::TouchPhase::Cancelled => TouchPhase::Canceled,
                };
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                self.touch(touch.id, phase, position);
                true
            }
            _ => false,
        }
    }

    /// WASD and arrow keys drive the movement axis.
    pub fn key(&mut self, code: KeyCode, pressed: bool) -> bool {
        let before = self.held;
        match code {
            KeyCode::KeyA | KeyCode::ArrowLeft => self.held.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.held.right = pressed,
            KeyCode::KeyW | KeyCode::ArrowUp => self.held.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.held.back = pressed,
            _ => return false,
        }
        if self.held != before {
            self.events.push(GestureEvent::Move(self.held.axis()));
        }
        true
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        if let (Some(last), true) = (self.cursor, self.button.pressed) {
            self.events.push(GestureEvent::Look(position - last));
        }
        self.cursor = Some(position);
        self.events.push(GestureEvent::Point(position));
    }

    pub fn left_button(&mut self, pressed: bool) {
        if pressed == self.button.pressed {
            return;
        }
        self.button.pressed = pressed;
        if pressed {
            self.button.just_pressed = true;
        } else {
            self.button.just_released = true;
        }
        self.events.push(GestureEvent::LookPress(pressed));
    }

    pub fn wheel(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// A lone finger also drives pointer, look press and look drag.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, position: Vec2) {
        let existing = self
            .touches
            .iter()
            .find(|(_, t)| t.id == id)
            .map(|(order, t)| (*order, *t));
        let alone = !self
            .touches
            .values()
            .any(|t| t.id != id && t.in_progress());

        if alone {
            match phase {
                TouchPhase::Began => {
                    self.events.push(GestureEvent::Point(position));
                    self.events.push(GestureEvent::LookPress(true));
                }
                TouchPhase::Moved => {
                    if let Some((_, last)) = existing {
                        self.events.push(GestureEvent::Look(position - last.position));
                    }
                    self.events.push(GestureEvent::Point(position));
                }
                TouchPhase::Ended => self.events.push(GestureEvent::LookPress(false)),
                TouchPhase::Canceled => self.events.push(GestureEvent::Cancel),
                TouchPhase::Stationary => {}
            }
        }

        let (order, phase) = match existing {
            // Began and moved within one frame still reads as begun.
            Some((order, last)) if last.phase == TouchPhase::Began && phase == TouchPhase::Moved => {
                (order, TouchPhase::Began)
            }
            Some((order, _)) => (order, phase),
            None => {
                self.next_order += 1;
                (self.next_order, phase)
            }
        };
        self.touches.insert(order, TouchPoint { id, position, phase });
    }

    /// Queued actions, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GestureEvent> {
        self.events.drain(..)
    }

    /// Samples device state for one tick and clears per-frame edges.
    pub fn take_frame(&mut self, time: f32, dt: f32, viewport: Vec2) -> InputFrame {
        let mouse = self.cursor.map(|position| MouseSample {
            position,
            left: self.button,
            scroll: Vec2::new(0.0, self.scroll),
        });
        let mut frame = InputFrame::new(time, dt, viewport);
        frame.mouse = mouse;
        frame.touches = self.touches.values().copied().collect();

        self.button.just_pressed = false;
        self.button.just_released = false;
        self.scroll = 0.0;
        self.touches.retain(|_, t| t.in_progress());
        for touch in self.touches.values_mut() {
            touch.phase = TouchPhase::Stationary;
        }
        frame
    }

    /// Forgets held buttons and fingers, e.g. after focus loss.
    pub fn reset(&mut self) {
        self.held = Held::default();
        self.button = ButtonSample::default();
        self.touches.clear();
        self.events.clear();
        self.scroll = 0.0;
        self.events.push(GestureEvent::Move(Vec2::ZERO));
    }
}
