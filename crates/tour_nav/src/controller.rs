//! The per-frame driver tying input, grid, views and camera together.
//!
//! The host calls [`TourController::update`] then
//! [`TourController::late_update`] once per frame. Bound actions arrive
//! through the `on_*` methods at any time in between and are applied at the
//! start of the next update.

use glam::{Vec2, Vec3};

use crate::camera::{CameraMotion, CameraPose};
use crate::device::DeviceClass;
use crate::error::{Result, TourError};
use crate::gesture::{cardinal_step, GesturePhase, GestureState, PressState};
use crate::grid::{GridCell, GridIndex, GridLayout};
use crate::hover::{HoverProbe, HoverTarget, SurfaceMarker};
use crate::input::{GestureEvent, InputFrame, TouchPhase};
use crate::node::{NodeId, Viewpoints};
use crate::pulse::TransitionPulse;
use crate::scene::Raycaster;
use crate::settings::TourSettings;
use crate::views::ViewSwitcher;

/// Wheel deltas smaller than this are treated as noise.
const SCROLL_EPSILON: f32 = 0.01;
/// Squared look delta below which a drag tick does nothing.
const LOOK_EPSILON_SQ: f32 = 1e-4;

/// Scene parts handed to the controller at start.
#[derive(Debug, Default)]
pub struct TourParts {
    pub grid: Option<GridLayout>,
    pub camera: Option<CameraPose>,
    pub viewpoints: Viewpoints,
    pub pulse: Option<TransitionPulse>,
    pub marker: Option<SurfaceMarker>,
    pub device: DeviceClass,
}

#[derive(Debug)]
pub struct TourController<R> {
    settings: TourSettings,
    raycaster: R,
    device: DeviceClass,

    grid: GridIndex,
    nodes: Viewpoints,
    views: ViewSwitcher,
    pulse: Option<TransitionPulse>,
    camera: CameraMotion,
    hover: HoverProbe,
    hover_target: HoverTarget,

    gesture: GestureState,
    queued: Vec<GestureEvent>,
    /// A press was released through the action channel this tick; the
    /// polled button edges describe the same click.
    released_by_action: bool,
    current_cell: GridCell,
    next_move_time: f32,
    viewport: Vec2,
    enabled: bool,

    look_multiplier: f32,
    zoom_multiplier: f32,
}

impl<R: Raycaster> TourController<R> {
    /// Indexes the viewpoints, places the camera and shows the start node.
    ///
    /// Fails without a grid layout or a camera, or when `settings` do not
    /// validate. The failure is logged; the host should keep the tour
    /// disabled.
    pub fn start(settings: TourSettings, parts: TourParts, raycaster: R) -> Result<Self> {
        if let Err(err) = settings.validate() {
            log::error!("Tour settings rejected: {err}");
            return Err(err);
        }
        let layout = parts.grid.ok_or(TourError::MissingReference("grid layout"));
        let pose = parts.camera.ok_or(TourError::MissingReference("camera"));
        let (layout, pose) = match (layout, pose) {
            (Ok(layout), Ok(pose)) => (layout, pose),
            (Err(err), _) | (_, Err(err)) => {
                log::error!("Tour controller disabled: {err}");
                return Err(err);
            }
        };

        if !(layout.cell_size > 0.0) {
            let err = TourError::InvalidSetting {
                name: "grid.cell_size",
                reason: format!("{} must be positive", layout.cell_size),
            };
            log::error!("Tour controller disabled: {err}");
            return Err(err);
        }

        let mut grid = GridIndex::new(layout);
        let indexed = grid.rebuild(&parts.viewpoints);

        let (look_multiplier, zoom_multiplier) = if parts.device.is_mobile() {
            let m = 1.0 / settings.gesture.mobile_sensitivity_divider;
            (m, m)
        } else {
            (1.0, 1.0)
        };

        let camera = CameraMotion::new(settings.camera.clone(), pose, layout.plane);
        let hover = HoverProbe::new(settings.hover.clone(), parts.marker);
        let views = ViewSwitcher::new(settings.deactivation_delay());

        let mut controller = Self {
            raycaster,
            device: parts.device,
            grid,
            nodes: parts.viewpoints,
            views,
            pulse: parts.pulse,
            camera,
            hover,
            hover_target: HoverTarget::Nothing,
            gesture: GestureState::default(),
            queued: Vec::new(),
            released_by_action: false,
            current_cell: GridCell::ZERO,
            next_move_time: 0.0,
            viewport: Vec2::ZERO,
            enabled: true,
            look_multiplier,
            zoom_multiplier,
            settings,
        };

        let position = controller.camera.position();
        let cell = if controller.settings.snap_to_closest_node_on_start {
            let height = controller.cell_height(position);
            controller
                .grid
                .closest_cell(position, height)
                .unwrap_or_else(|| controller.grid.world_to_cell(position))
        } else {
            controller.grid.world_to_cell(position)
        };
        controller.move_to_cell(cell);
        if controller.settings.snap_to_closest_node_on_start {
            let target = controller.cell_target(cell);
            controller.camera.teleport(target);
        }

        log::info!(
            "Tour started at cell {} with {} indexed viewpoints ({:?})",
            cell,
            indexed,
            controller.device
        );
        Ok(controller)
    }

    pub fn settings(&self) -> &TourSettings {
        &self.settings
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn camera(&self) -> &CameraMotion {
        &self.camera
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn viewpoints(&self) -> &Viewpoints {
        &self.nodes
    }

    pub fn raycaster(&self) -> &R {
        &self.raycaster
    }

    pub fn hover(&self) -> &HoverProbe {
        &self.hover
    }

    /// Result of the last hover probe.
    pub fn hover_target(&self) -> HoverTarget {
        self.hover_target
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn phase(&self) -> GesturePhase {
        self.gesture.phase()
    }

    #[inline]
    pub fn current_cell(&self) -> GridCell {
        self.current_cell
    }

    #[inline]
    pub fn current_node(&self) -> Option<NodeId> {
        self.views.current()
    }

    pub fn pulse_value(&self) -> Option<f32> {
        self.pulse.as_ref().map(TransitionPulse::value)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn on_move(&mut self, axis: Vec2) {
        self.queued.push(GestureEvent::Move(axis));
    }

    pub fn on_look(&mut self, delta: Vec2) {
        self.queued.push(GestureEvent::Look(delta));
    }

    pub fn on_look_press(&mut self, pressed: bool) {
        self.queued.push(GestureEvent::LookPress(pressed));
    }

    pub fn on_zoom(&mut self, value: f32) {
        self.queued.push(GestureEvent::Zoom(value));
    }

    pub fn on_point(&mut self, screen: Vec2) {
        self.queued.push(GestureEvent::Point(screen));
    }

    pub fn push_event(&mut self, event: GestureEvent) {
        self.queued.push(event);
    }

    pub fn on_focus(&mut self, has_focus: bool) {
        if !has_focus {
            self.reset_pointer_state();
        }
    }

    pub fn on_pause(&mut self, paused: bool) {
        if paused {
            self.reset_pointer_state();
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.reset_pointer_state();
        }
        self.enabled = enabled;
    }

    /// Plays the transition pulse without changing viewpoint.
    pub fn pulse(&mut self) {
        if let Some(pulse) = self.pulse.as_mut() {
            pulse.trigger();
        }
    }

    /// Re-indexes after viewpoints were added or moved.
    pub fn rebuild_grid(&mut self) -> usize {
        self.grid.rebuild(&self.nodes)
    }

    pub fn viewpoints_mut(&mut self) -> &mut Viewpoints {
        &mut self.nodes
    }

    fn reset_pointer_state(&mut self) {
        self.gesture.reset_transient();
        self.queued.retain(|e| matches!(e, GestureEvent::Move(_)));
    }

    pub fn update(&mut self, frame: &InputFrame) {
        if !self.enabled {
            return;
        }
        self.viewport = frame.viewport;

        self.views.tick(frame.dt, &mut self.nodes);
        if let Some(pulse) = self.pulse.as_mut() {
            pulse.tick(frame.dt);
        }

        let pinch = frame.pinch_points();
        self.gesture.pinching = pinch.is_some();
        self.drain_events(frame);

        let scroll = frame.scroll();
        if scroll.abs() > SCROLL_EPSILON {
            let speed = self.settings.gesture.mouse_wheel_zoom_speed;
            self.camera.zoom(-scroll * speed * self.zoom_multiplier * frame.dt);
        }

        if let Some((a, b)) = pinch {
            let distance = a.distance(b);
            if let Some(last) = self.gesture.last_pinch_distance {
                let speed = self.settings.gesture.pinch_zoom_speed;
                self.camera.zoom(-(distance - last) * speed * self.zoom_multiplier);
            }
            self.gesture.last_pinch_distance = Some(distance);
            self.gesture.enter_pinch();
            return;
        }
        self.gesture.last_pinch_distance = None;

        self.step_grid(frame.time);
        self.apply_look(frame);
        self.gesture.track_pointer();
        self.poll_taps(frame);
    }

    /// Moves the camera toward the current cell and refreshes hover.
    pub fn late_update(&mut self, frame: &InputFrame) {
        if !self.enabled {
            return;
        }
        let target = self.cell_target(self.current_cell);
        self.camera.follow(target, frame.dt);

        if self.gesture.pinching {
            return;
        }
        self.hover_target = self.hover.probe(
            &self.camera,
            self.viewport,
            &self.raycaster,
            &mut self.nodes,
            self.device,
        );
    }

    /// Switches to `cell`. Grid steps, taps and start all land here.
    pub fn move_to_cell(&mut self, cell: GridCell) -> Option<NodeId> {
        self.current_cell = cell;
        self.views
            .switch_to(cell, &self.grid, &mut self.nodes, self.pulse.as_mut())
    }

    /// Casts through `screen` and moves to the cell that was hit.
    pub fn try_tap_move(&mut self, screen: Vec2) -> bool {
        let gesture = &self.settings.gesture;
        if !gesture.enable_tap_move || self.gesture.pinching {
            return false;
        }

        let ray = self.camera.screen_ray(screen, self.viewport);
        let Some(hit) = self
            .raycaster
            .cast(ray, gesture.tap_max_distance, gesture.tap_hit_mask)
        else {
            log::trace!("Tap at {screen} hit nothing");
            return false;
        };

        let cell = if gesture.tap_snap_to_nearest {
            let height = self.cell_height(hit.point);
            self.grid
                .closest_cell(hit.point, height)
                .unwrap_or_else(|| self.grid.world_to_cell(hit.point))
        } else {
            self.grid.world_to_cell(hit.point)
        };

        if !self.grid.has_node(cell) {
            log::trace!("Tap landed on empty cell {cell}");
            return false;
        }
        log::debug!("Tap move to cell {cell}");
        self.move_to_cell(cell);
        true
    }

    fn drain_events(&mut self, frame: &InputFrame) {
        self.released_by_action = false;
        for event in std::mem::take(&mut self.queued) {
            match event {
                GestureEvent::Move(axis) => self.gesture.move_input = axis,
                GestureEvent::Look(delta) => self.gesture.look_delta += delta,
                GestureEvent::LookPress(_) if self.gesture.pinching => {}
                GestureEvent::LookPress(true) => {
                    let position = self.gesture.pointer.unwrap_or(self.viewport * 0.5);
                    self.gesture.press = Some(PressState::new(frame.time, position));
                    self.gesture.dragging = true;
                }
                GestureEvent::LookPress(false) => {
                    self.gesture.dragging = false;
                    self.gesture.look_delta = Vec2::ZERO;
                    self.gesture.track_pointer();
                    self.released_by_action = true;
                    if let Some(press) = self.gesture.press.take() {
                        self.release(press, frame.time);
                    }
                }
                GestureEvent::Cancel => {
                    self.gesture.dragging = false;
                    self.gesture.look_delta = Vec2::ZERO;
                    self.gesture.press = None;
                }
                GestureEvent::Zoom(value) => {
                    let speed = self.settings.gesture.mouse_wheel_zoom_speed;
                    self.camera.zoom(-value * speed * self.zoom_multiplier * frame.dt);
                }
                GestureEvent::Point(screen) => {
                    self.gesture.pointer = Some(screen);
                    self.gesture.track_pointer();
                    self.hover.on_point(screen);
                }
            }
        }
    }

    fn step_grid(&mut self, time: f32) {
        if time < self.next_move_time {
            return;
        }
        let step = cardinal_step(
            self.gesture.move_input,
            self.camera.forward(),
            self.camera.right(),
            self.grid.layout().plane,
            self.settings.gesture.move_deadzone,
        );
        if step == GridCell::ZERO {
            return;
        }

        let target = self.current_cell + step;
        if self.grid.has_node(target) {
            self.move_to_cell(target);
            self.next_move_time = time + self.settings.gesture.input_repeat_delay;
        }
    }

    fn apply_look(&mut self, frame: &InputFrame) {
        if !self.gesture.dragging {
            return;
        }
        if !frame.pointer_pressed() {
            self.gesture.dragging = false;
            self.gesture.look_delta = Vec2::ZERO;
            return;
        }

        let delta = self.gesture.look_delta;
        if delta.length_squared() < LOOK_EPSILON_SQ {
            return;
        }
        let gesture = &self.settings.gesture;
        let scale = gesture.look_sensitivity * self.look_multiplier * frame.dt;
        // Screen y grows downward, so dragging up lowers pitch (looks up).
        let pitch = if gesture.invert_y { -delta.y } else { delta.y };
        self.camera.rotate(delta.x * scale, pitch * scale);
        self.gesture.look_delta = Vec2::ZERO;
    }

    fn poll_taps(&mut self, frame: &InputFrame) {
        if !self.settings.gesture.enable_tap_move || self.released_by_action {
            return;
        }

        if let Some(mouse) = frame.mouse {
            if mouse.left.just_pressed {
                self.gesture.pointer = Some(mouse.position);
                self.gesture.press = Some(PressState::new(frame.time, mouse.position));
            }
            if mouse.left.just_released {
                self.gesture.pointer = Some(mouse.position);
                self.gesture.track_pointer();
                if let Some(press) = self.gesture.press.take() {
                    self.release(press, frame.time);
                }
            }
        }

        if let Some(touch) = frame.primary_touch().copied() {
            self.gesture.pointer = Some(touch.position);
            match touch.phase {
                TouchPhase::Began => {
                    self.gesture.press = Some(PressState::new(frame.time, touch.position));
                }
                TouchPhase::Ended => {
                    self.gesture.track_pointer();
                    if let Some(press) = self.gesture.press.take() {
                        self.release(press, frame.time);
                    }
                }
                TouchPhase::Canceled => self.gesture.press = None,
                TouchPhase::Moved | TouchPhase::Stationary => self.gesture.track_pointer(),
            }
        }
    }

    fn release(&mut self, press: PressState, time: f32) {
        let held = time - press.time;
        if self.settings.gesture.is_tap(held, press.travel) {
            self.try_tap_move(press.position);
        } else {
            log::trace!("Press held {held:.2}s over {:.1}px; not a tap", press.travel);
        }
    }

    fn cell_height(&self, point: Vec3) -> f32 {
        if self.camera.settings().keep_camera_height {
            self.camera.height()
        } else {
            self.grid.layout().plane.height(point)
        }
    }

    fn cell_target(&self, cell: GridCell) -> Vec3 {
        self.grid.cell_to_world_center(cell, self.camera.height())
    }
}
