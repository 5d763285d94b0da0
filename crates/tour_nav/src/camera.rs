//! Camera rig: damped position, yaw/pitch orientation and field of view.
//!
//! Orientation follows the usual Y-up convention with +Z forward at zero yaw;
//! positive yaw turns right, positive pitch looks down.

use glam::{EulerRot, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::grid::GridPlane;
use crate::scene::Ray;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Approximate seconds to settle on a new cell.
    pub move_smooth_time: f32,
    /// Hold the start height instead of following the rig's live height.
    pub keep_camera_height: bool,
    pub min_pitch_deg: f32,
    pub max_pitch_deg: f32,
    pub min_fov_deg: f32,
    pub max_fov_deg: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_smooth_time: 0.15,
            keep_camera_height: true,
            min_pitch_deg: -45.0,
            max_pitch_deg: 70.0,
            min_fov_deg: 50.0,
            max_fov_deg: 120.0,
        }
    }
}

/// Where the rig starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPose {
    pub position: Vec3,
    pub yaw_deg: f32,
    /// Values above 180 are read as negative angles (350 = -10).
    pub pitch_deg: f32,
    pub fov_deg: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            fov_deg: 60.0,
        }
    }
}

/// Critically damped spring step toward `target`.
///
/// Never overshoots: when a step would cross the target the result lands on
/// it and the velocity is zeroed.
pub fn smooth_damp(current: Vec3, target: Vec3, velocity: &mut Vec3, smooth_time: f32, dt: f32) -> Vec3 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let output = target + (change + temp) * decay;

    if (target - current).dot(output - target) > 0.0 {
        *velocity = Vec3::ZERO;
        return target;
    }
    output
}

#[derive(Debug, Clone)]
pub struct CameraMotion {
    settings: CameraSettings,
    plane: GridPlane,

    position: Vec3,
    velocity: Vec3,
    /// Off-plane coordinate captured at start.
    fixed_height: f32,

    yaw_deg: f32,
    pitch_deg: f32,
    fov_deg: f32,
}

impl CameraMotion {
    pub fn new(settings: CameraSettings, pose: CameraPose, plane: GridPlane) -> Self {
        let pitch_deg = if pose.pitch_deg > 180.0 {
            pose.pitch_deg - 360.0
        } else {
            pose.pitch_deg
        };
        let fov_deg = pose
            .fov_deg
            .clamp(settings.min_fov_deg, settings.max_fov_deg);

        Self {
            fixed_height: plane.height(pose.position),
            settings,
            plane,
            position: pose.position,
            velocity: Vec3::ZERO,
            yaw_deg: pose.yaw_deg,
            pitch_deg,
            fov_deg,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn yaw_deg(&self) -> f32 {
        self.yaw_deg
    }

    #[inline]
    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    #[inline]
    pub fn fov_deg(&self) -> f32 {
        self.fov_deg
    }

    /// Height used when placing the rig on a cell center.
    pub fn height(&self) -> f32 {
        if self.settings.keep_camera_height {
            self.fixed_height
        } else {
            self.plane.height(self.position)
        }
    }

    /// Jumps to `position` and stops any motion in progress.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
    }

    /// Advances the rig one tick toward `target`.
    pub fn follow(&mut self, target: Vec3, dt: f32) {
        self.position = smooth_damp(
            self.position,
            target,
            &mut self.velocity,
            self.settings.move_smooth_time,
            dt,
        );
    }

    /// Adds to yaw and pitch (degrees); pitch is clamped.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw_deg += yaw_delta;
        self.pitch_deg = (self.pitch_deg + pitch_delta)
            .clamp(self.settings.min_pitch_deg, self.settings.max_pitch_deg);
    }

    /// Adds `delta` degrees to the field of view and clamps it.
    pub fn zoom(&mut self, delta: f32) -> f32 {
        self.fov_deg = (self.fov_deg + delta).clamp(self.settings.min_fov_deg, self.settings.max_fov_deg);
        self.fov_deg
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw_deg.to_radians(),
            self.pitch_deg.to_radians(),
            0.0,
        )
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation() * Vec3::Y
    }

    /// Ray through the middle of the viewport.
    pub fn center_ray(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }

    /// Ray through a pixel (origin top-left) of a `viewport`-sized screen.
    pub fn screen_ray(&self, screen: Vec2, viewport: Vec2) -> Ray {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return self.center_ray();
        }

        let ndc = Vec2::new(
            2.0 * screen.x / viewport.x - 1.0,
            1.0 - 2.0 * screen.y / viewport.y,
        );
        let tan_half = (self.fov_deg.to_radians() * 0.5).tan();
        let aspect = viewport.x / viewport.y;

        let rotation = self.rotation();
        let direction = rotation * Vec3::Z
            + rotation * Vec3::X * (ndc.x * tan_half * aspect)
            + rotation * Vec3::Y * (ndc.y * tan_half);
        Ray::new(self.position, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig(pose: CameraPose) -> CameraMotion {
        CameraMotion::new(CameraSettings::default(), pose, GridPlane::Xz)
    }

    #[test]
    fn smooth_damp_settles_without_overshoot() {
        let target = Vec3::new(5.0, 0.0, 0.0);
        let mut position = Vec3::ZERO;
        let mut velocity = Vec3::ZERO;

        for _ in 0..120 {
            position = smooth_damp(position, target, &mut velocity, 0.15, 1.0 / 60.0);
            assert!(position.x <= target.x);
        }
        assert!(position.abs_diff_eq(target, 1e-3));
    }

    #[test]
    fn smooth_damp_zero_dt_holds_position() {
        let mut velocity = Vec3::ZERO;
        let p = smooth_damp(Vec3::ONE, Vec3::ZERO, &mut velocity, 0.15, 0.0);
        assert_eq!(p, Vec3::ONE);
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn start_pose_normalizes_pitch_and_clamps_fov() {
        let camera = rig(CameraPose {
            pitch_deg: 350.0,
            fov_deg: 170.0,
            ..CameraPose::default()
        });
        assert_eq!(camera.pitch_deg(), -10.0);
        assert_eq!(camera.fov_deg(), 120.0);
    }

    #[test]
    fn zoom_clamps_for_any_delta() {
        let mut camera = rig(CameraPose::default());
        for delta in [1e9, -1e9, 37.0, -500.0, f32::MAX, f32::MIN] {
            let fov = camera.zoom(delta);
            assert!((50.0..=120.0).contains(&fov), "{delta} -> {fov}");
        }
    }

    #[test]
    fn pitch_is_clamped_yaw_is_not() {
        let mut camera = rig(CameraPose::default());
        camera.rotate(400.0, 500.0);
        assert_eq!(camera.pitch_deg(), 70.0);
        assert_eq!(camera.yaw_deg(), 400.0);
        camera.rotate(0.0, -500.0);
        assert_eq!(camera.pitch_deg(), -45.0);
    }

    #[test]
    fn basis_follows_yaw_and_pitch() {
        let camera = rig(CameraPose {
            yaw_deg: 90.0,
            ..CameraPose::default()
        });
        assert!(camera.forward().abs_diff_eq(Vec3::X, 1e-5));
        assert!(camera.right().abs_diff_eq(-Vec3::Z, 1e-5));

        let looking_down = rig(CameraPose {
            pitch_deg: 30.0,
            ..CameraPose::default()
        });
        assert!(looking_down.forward().y < 0.0);
    }

    #[test]
    fn screen_rays_fan_out_from_center() {
        let camera = rig(CameraPose::default());
        let viewport = Vec2::new(800.0, 600.0);

        let center = camera.screen_ray(viewport * 0.5, viewport);
        assert!(center.direction.abs_diff_eq(Vec3::Z, 1e-5));

        let right_edge = camera.screen_ray(Vec2::new(800.0, 300.0), viewport);
        assert!(right_edge.direction.x > 0.0);
        let top = camera.screen_ray(Vec2::new(400.0, 0.0), viewport);
        assert!(top.direction.y > 0.0);

        let degenerate = camera.screen_ray(Vec2::new(10.0, 10.0), Vec2::ZERO);
        assert_eq!(degenerate, camera.center_ray());
    }

    #[test]
    fn live_height_tracks_rig() {
        let settings = CameraSettings {
            keep_camera_height: false,
            ..CameraSettings::default()
        };
        let mut camera = CameraMotion::new(
            settings,
            CameraPose {
                position: Vec3::new(0.0, 1.6, 0.0),
                ..CameraPose::default()
            },
            GridPlane::Xz,
        );
        camera.teleport(Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(camera.height(), 3.0);

        let fixed = rig(CameraPose {
            position: Vec3::new(0.0, 1.6, 0.0),
            ..CameraPose::default()
        });
        assert_eq!(fixed.height(), 1.6);
    }
}
