use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use tour_nav::{
    ButtonSample, CameraPose, GesturePhase, GridCell, GridLayout, HoverTarget, InputFrame,
    LayerMask, MouseSample, NodeId, PulseSettings, Ray, RayHit, Raycaster, TouchPhase, TouchPoint,
    TourController, TourParts, TourSettings, TransitionPulse, ViewpointNode, Viewpoints,
};

const DT: f32 = 1.0 / 60.0;
const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

/// Ground plane at `y = 0`.
#[derive(Debug)]
struct Ground;

impl Raycaster for Ground {
    fn cast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        if ray.direction.y >= 0.0 || !mask.contains(0) {
            return None;
        }
        let distance = -ray.origin.y / ray.direction.y;
        (distance <= max_distance).then(|| RayHit {
            point: ray.at(distance),
            normal: Vec3::Y,
            distance,
            layer: 0,
            node: None,
        })
    }
}

fn lattice(width: i32, depth: i32) -> Viewpoints {
    (0..depth)
        .flat_map(|z| (0..width).map(move |x| (x, z)))
        .map(|(x, z)| {
            ViewpointNode::new(
                format!("pano_{x}_{z}"),
                Vec3::new(x as f32 * 5.0, 0.0, z as f32 * 5.0),
            )
        })
        .collect()
}

fn start(pose: CameraPose, pulse: Option<TransitionPulse>) -> TourController<Ground> {
    let parts = TourParts {
        grid: Some(GridLayout::default()),
        camera: Some(pose),
        viewpoints: lattice(3, 3),
        pulse,
        ..TourParts::default()
    };
    TourController::start(TourSettings::default(), parts, Ground).expect("tour starts")
}

fn frame(time: f32) -> InputFrame {
    InputFrame::new(time, DT, VIEWPORT)
}

fn tick(tour: &mut TourController<Ground>, f: &InputFrame) {
    tour.update(f);
    tour.late_update(f);
}

fn active(tour: &TourController<Ground>) -> Vec<NodeId> {
    tour.viewpoints().active().collect()
}

#[test]
fn origin_start_then_step_right() {
    let mut tour = start(CameraPose::default(), None);
    assert_eq!(tour.current_cell(), GridCell::ZERO);

    tour.on_move(Vec2::new(0.9, 0.2));
    tour.update(&frame(0.5));
    assert_eq!(tour.current_cell(), GridCell::new(1, 0));
    assert_eq!(
        tour.grid().cell_to_world_center(tour.current_cell(), tour.camera().height()),
        Vec3::new(5.0, 0.0, 0.0)
    );
}

#[test]
fn lattice_projection_round_trips() {
    let layout = GridLayout::default();
    for i in -40..40 {
        for j in -40..40 {
            let p = Vec3::new(i as f32 * 0.83, 2.5, j as f32 * 1.37);
            let cell = layout.world_to_cell(p);
            let center = layout.cell_to_world_center(cell, p.y);

            assert_eq!(center.x, (p.x / 5.0).round_ties_even() * 5.0);
            assert_eq!(center.z, (p.z / 5.0).round_ties_even() * 5.0);
            assert_eq!(layout.world_to_cell(center), cell);
        }
    }
}

fn tap_tour() -> TourController<Ground> {
    start(
        CameraPose {
            position: Vec3::new(0.0, 1.6, 0.0),
            pitch_deg: 20.0,
            ..CameraPose::default()
        },
        None,
    )
}

fn press_release(tour: &mut TourController<Ground>, release_at: f32) {
    let press_at = VIEWPORT * 0.5;
    let released_at = press_at + Vec2::new(3.0, 0.0);

    tour.update(&frame(0.0).with_mouse(MouseSample {
        position: press_at,
        left: ButtonSample::down(),
        scroll: Vec2::ZERO,
    }));
    tour.on_point(released_at);
    tour.update(&frame(release_at * 0.5).with_mouse(MouseSample {
        position: released_at,
        left: ButtonSample::held(),
        scroll: Vec2::ZERO,
    }));
    tour.update(&frame(release_at).with_mouse(MouseSample {
        position: released_at,
        left: ButtonSample::up(),
        scroll: Vec2::ZERO,
    }));
}

#[test]
fn short_press_with_small_travel_taps() {
    let mut tour = tap_tour();
    press_release(&mut tour, 0.1);
    assert_eq!(tour.current_cell(), GridCell::new(0, 1));
}

#[test]
fn long_press_does_not_tap() {
    let mut tour = tap_tour();
    press_release(&mut tour, 0.3);
    assert_eq!(tour.current_cell(), GridCell::ZERO);
}

#[test]
fn touch_tap_moves_too() {
    let mut tour = tap_tour();
    let finger = |phase| TouchPoint {
        id: 7,
        position: VIEWPORT * 0.5,
        phase,
    };
    tour.update(&frame(0.0).with_touch(finger(TouchPhase::Began)));
    tour.update(&frame(0.05).with_touch(finger(TouchPhase::Stationary)));
    tour.update(&frame(0.1).with_touch(finger(TouchPhase::Ended)));
    assert_eq!(tour.current_cell(), GridCell::new(0, 1));
}

#[test]
fn dragged_press_does_not_tap() {
    let mut tour = tap_tour();
    tour.update(&frame(0.0).with_mouse(MouseSample {
        position: VIEWPORT * 0.5,
        left: ButtonSample::down(),
        scroll: Vec2::ZERO,
    }));
    tour.on_point(VIEWPORT * 0.5 + Vec2::new(40.0, 0.0));
    tour.update(&frame(0.05).with_mouse(MouseSample {
        position: VIEWPORT * 0.5 + Vec2::new(40.0, 0.0),
        left: ButtonSample::held(),
        scroll: Vec2::ZERO,
    }));
    // Back at the start position; the earlier excursion still counts.
    tour.update(&frame(0.1).with_mouse(MouseSample {
        position: VIEWPORT * 0.5,
        left: ButtonSample::up(),
        scroll: Vec2::ZERO,
    }));
    assert_eq!(tour.current_cell(), GridCell::ZERO);
}

#[test]
fn pinch_always_cancels_drag_on_the_same_tick() {
    let mut tour = tap_tour();
    tour.on_look_press(true);
    tour.on_look(Vec2::new(30.0, 10.0));
    tour.update(&frame(0.0).with_mouse(MouseSample {
        position: Vec2::new(10.0, 10.0),
        left: ButtonSample::held(),
        scroll: Vec2::ZERO,
    }));
    assert_eq!(tour.phase(), GesturePhase::Dragging);

    tour.on_look(Vec2::new(30.0, 10.0));
    let pinch = frame(0.1)
        .with_touch(TouchPoint {
            id: 1,
            position: Vec2::new(100.0, 100.0),
            phase: TouchPhase::Began,
        })
        .with_touch(TouchPoint {
            id: 2,
            position: Vec2::new(200.0, 100.0),
            phase: TouchPhase::Began,
        });
    tour.update(&pinch);

    assert!(!tour.gesture().is_dragging());
    assert_eq!(tour.gesture().look_delta(), Vec2::ZERO);
    assert_eq!(tour.phase(), GesturePhase::Pinching);
}

#[test]
fn rapid_moves_never_strand_an_old_node() {
    let mut tour = start(CameraPose::default(), None);
    let delay = tour.settings().deactivation_delay();
    assert!(delay > DT * 2.0);

    tour.move_to_cell(GridCell::new(1, 0));
    tick(&mut tour, &frame(0.0));
    tour.move_to_cell(GridCell::new(2, 0));

    // Cell (0,0) went away with the superseded retirement; (1,0) overlaps.
    assert_eq!(active(&tour), vec![NodeId(1), NodeId(2)]);

    let mut t = 0.0;
    while t < delay * 2.0 {
        t += DT;
        tick(&mut tour, &frame(t));
    }
    assert_eq!(active(&tour), vec![NodeId(2)]);
}

#[test]
fn zoom_is_clamped_for_huge_inputs() {
    let mut tour = start(CameraPose::default(), None);
    for value in [1e6, -1e6, 3.0, -3.0, f32::MAX, -f32::MAX] {
        tour.on_zoom(value);
        tour.update(&frame(1.0));
        let fov = tour.camera().fov_deg();
        assert!((50.0..=120.0).contains(&fov), "{value} -> {fov}");
    }
}

#[test]
fn retriggered_pulse_completes_once() {
    let settings = PulseSettings::default();
    let written = Rc::new(RefCell::new(Vec::new()));
    let sink = written.clone();
    let pulse = TransitionPulse::new(
        settings.clone(),
        Box::new(move |_: &str, v: f32| sink.borrow_mut().push(v)),
    );
    let mut tour = start(CameraPose::default(), Some(pulse));

    // Two switches inside the pulse's rise time.
    tour.move_to_cell(GridCell::new(1, 0));
    tick(&mut tour, &frame(0.02));
    tick(&mut tour, &frame(0.04));
    tour.move_to_cell(GridCell::new(2, 0));
    let restart = written.borrow().len();
    assert_eq!(tour.pulse_value(), Some(settings.min_sigma));

    let mut t = 0.04;
    for _ in 0..60 {
        t += DT;
        tick(&mut tour, &frame(t));
    }

    let values = written.borrow();
    let after = &values[restart..];
    let peaks = after
        .windows(2)
        .filter(|w| w[0] < settings.peak_sigma && w[1] == settings.peak_sigma)
        .count();
    assert_eq!(peaks, 1);
    assert_eq!(after.last().copied(), Some(settings.min_sigma));
    assert_eq!(tour.pulse_value(), Some(settings.min_sigma));
}

#[test]
fn missing_camera_refuses_to_start() {
    let parts = TourParts {
        grid: Some(GridLayout::default()),
        viewpoints: lattice(2, 2),
        ..TourParts::default()
    };
    assert!(TourController::start(TourSettings::default(), parts, Ground).is_err());
}

#[test]
fn hover_holds_still_while_pinching() {
    let mut tour = start(
        CameraPose {
            position: Vec3::new(0.0, 1.6, 0.0),
            pitch_deg: 20.0,
            ..CameraPose::default()
        },
        None,
    );
    let pinch = |time: f32| {
        frame(time)
            .with_touch(TouchPoint {
                id: 1,
                position: Vec2::new(300.0, 300.0),
                phase: TouchPhase::Moved,
            })
            .with_touch(TouchPoint {
                id: 2,
                position: Vec2::new(500.0, 300.0),
                phase: TouchPhase::Stationary,
            })
    };

    tick(&mut tour, &frame(0.0));
    let before = tour.hover_target();
    assert!(matches!(before, HoverTarget::Surface { blocking: false, .. }));

    // The pointer moves during the pinch, but nothing is probed.
    tour.on_point(Vec2::new(400.0, 550.0));
    tick(&mut tour, &pinch(0.1));
    tick(&mut tour, &pinch(0.2));
    assert_eq!(tour.phase(), GesturePhase::Pinching);
    assert_eq!(tour.hover_target(), before);

    tick(&mut tour, &frame(0.3));
    assert_ne!(tour.hover_target(), before);
    assert!(matches!(tour.hover_target(), HoverTarget::Surface { .. }));
}
