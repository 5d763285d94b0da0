use crate::{
    config::{Config, EnvDeviceProbe},
    input::WinitInput,
    scene::{SceneFile, SceneModel},
};
use anyhow::{Context, Result};
use glam::Vec2;
use std::{cell::Cell, rc::Rc, time::Instant};
use tour_nav::{HoverTarget, PulseSettings, TourController, TransitionPulse};
use winit::{event::WindowEvent, window::Window};

/// Longest frame step fed to the tour; keeps a stalled window from
/// teleporting the camera on resume.
const MAX_FRAME_DT: f32 = 0.1;

/// Receives the blur parameter. Nothing is rendered, so the last value is
/// kept for the status line.
fn pulse_sink(settings: &PulseSettings) -> (TransitionPulse, Rc<Cell<f32>>) {
    let last = Rc::new(Cell::new(settings.min_sigma));
    let shared = last.clone();
    let pulse = TransitionPulse::new(
        settings.clone(),
        Box::new(move |name: &str, value: f32| {
            log::trace!("{name} = {value:.4}");
            shared.set(value);
        }),
    );
    (pulse, last)
}

pub struct App {
    pub tour: TourController<SceneModel>,
    pub input: WinitInput,
    sigma: Rc<Cell<f32>>,
    started: Instant,
    last_frame: Instant,
    viewport: Vec2,
}

impl App {
    pub fn new(config: &Config, window: &Window) -> Result<Self> {
        let scene = SceneFile::load(&config.scene)?;
        let device = config.device.resolve(&EnvDeviceProbe);
        let (pulse, sigma) = pulse_sink(&scene.settings.pulse);

        let (settings, parts, model) = scene.into_parts(device, Some(pulse));
        window.set_cursor_visible(settings.show_cursor);

        let tour = TourController::start(settings, parts, model)
            .with_context(|| format!("starting tour from {}", config.scene.display()))?;

        let size = window.inner_size();
        let now = Instant::now();
        Ok(Self {
            tour,
            input: WinitInput::new(),
            sigma,
            started: now,
            last_frame: now,
            viewport: Vec2::new(size.width as f32, size.height as f32),
        })
    }

    /// Returns true when the event was consumed.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(size) => {
                self.viewport = Vec2::new(size.width as f32, size.height as f32);
                false
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.input.reset();
                }
                self.tour.on_focus(*focused);
                false
            }
            WindowEvent::Occluded(occluded) => {
                self.tour.on_pause(*occluded);
                false
            }
            _ => self.input.handle_event(event),
        }
    }

    /// Runs one update / late-update pass.
    pub fn frame(&mut self, window: &Window) {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;
        let time = now.duration_since(self.started).as_secs_f32();

        for event in self.input.drain_events() {
            self.tour.push_event(event);
        }
        let frame = self.input.take_frame(time, dt, self.viewport);
        self.tour.update(&frame);
        self.tour.late_update(&frame);

        window.set_title(&self.status_line());
    }

    pub fn status_line(&self) -> String {
        status_line(&self.tour, self.sigma.get())
    }
}

fn status_line(tour: &TourController<SceneModel>, sigma: f32) -> String {
    let node = tour
        .current_node()
        .and_then(|id| tour.viewpoints().get(id))
        .map_or("-", |n| n.name());
    let hover = match tour.hover_target() {
        HoverTarget::Nothing => "nothing".to_owned(),
        HoverTarget::Node(id) => tour
            .viewpoints()
            .get(id)
            .map_or_else(|| format!("{id:?}"), |n| n.name().to_owned()),
        HoverTarget::Surface { point, blocking } => {
            let tag = if blocking { " (blocked)" } else { "" };
            format!("[{:.1}, {:.1}, {:.1}]{tag}", point.x, point.y, point.z)
        }
    };
    format!(
        "Tour | {} {} | fov {:.0} | {:?} | hover {} | sigma {:.2}",
        node,
        tour.current_cell(),
        tour.camera().fov_deg(),
        tour.phase(),
        hover,
        sigma
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tour_nav::DeviceClass;

    const SCENE: &str = r#"{
        "grid": {},
        "camera": { "position": [0.0, 1.6, 0.0] },
        "viewpoints": [
            { "name": "atrium", "position": [0.0, 0.0, 0.0] },
            { "name": "gallery", "position": [5.0, 0.0, 0.0] }
        ]
    }"#;

    #[test]
    fn status_names_the_current_viewpoint() {
        let scene: SceneFile = serde_json::from_str(SCENE).unwrap();
        let (pulse, sigma) = pulse_sink(&scene.settings.pulse);
        let (settings, parts, model) = scene.into_parts(DeviceClass::Desktop, Some(pulse));
        let mut tour = TourController::start(settings, parts, model).unwrap();

        let line = status_line(&tour, sigma.get());
        assert!(line.starts_with("Tour | atrium (0, 0) | fov 60"), "{line}");

        tour.move_to_cell(tour_nav::GridCell::new(1, 0));
        let line = status_line(&tour, sigma.get());
        assert!(line.contains("gallery (1, 0)"), "{line}");
        assert!(line.contains("hover nothing"), "{line}");
    }
}
