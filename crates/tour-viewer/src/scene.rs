//! Authored scene description and an analytic raycaster over it.
//!
//! Viewpoints are pickable spheres; walls and floors are axis-aligned boxes
//! on a collision layer.

use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;
use std::{fs, path::Path};
use tour_nav::{
    CameraPose, DeviceClass, GridLayout, LayerMask, MaterialId, NodeId, Ray, RayHit, Raycaster,
    SurfaceMarker, TourParts, TourSettings, TransitionPulse, ViewpointNode, Viewpoints,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ViewpointSpec {
    pub name: String,
    pub position: Vec3,
    #[serde(default = "default_pick_radius")]
    pub radius: f32,
    #[serde(default)]
    pub layer: u32,
    #[serde(default)]
    pub materials: Vec<MaterialId>,
}

fn default_pick_radius() -> f32 {
    0.4
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceSpec {
    pub name: String,
    pub min: Vec3,
    pub max: Vec3,
    #[serde(default)]
    pub layer: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerSpec {
    #[serde(default = "default_marker_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub materials: Vec<MaterialId>,
}

fn default_marker_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneFile {
    /// Both are required for the tour to start; they stay optional here so a
    /// missing block is reported by the controller, not the parser.
    pub grid: Option<GridLayout>,
    pub camera: Option<CameraPose>,
    #[serde(default)]
    pub viewpoints: Vec<ViewpointSpec>,
    #[serde(default)]
    pub surfaces: Vec<SurfaceSpec>,
    #[serde(default)]
    pub marker: Option<MarkerSpec>,
    #[serde(default)]
    pub settings: TourSettings,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        let scene: SceneFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing scene {}", path.display()))?;

        log::info!(
            "Loaded scene {}: {} viewpoints, {} surfaces.",
            path.display(),
            scene.viewpoints.len(),
            scene.surfaces.len()
        );
        Ok(scene)
    }

    /// Splits the description into controller inputs and the collision model.
    pub fn into_parts(
        self,
        device: DeviceClass,
        pulse: Option<TransitionPulse>,
    ) -> (TourSettings, TourParts, SceneModel) {
        let viewpoints: Viewpoints = self
            .viewpoints
            .iter()
            .map(|spec| {
                ViewpointNode::new(spec.name.clone(), spec.position)
                    .with_materials(spec.materials.clone())
            })
            .collect();

        let model = SceneModel {
            spheres: self
                .viewpoints
                .iter()
                .enumerate()
                .map(|(i, spec)| PickSphere {
                    node: NodeId(i),
                    center: spec.position,
                    radius: spec.radius,
                    layer: spec.layer,
                })
                .collect(),
            boxes: self.surfaces,
        };

        let parts = TourParts {
            grid: self.grid,
            camera: self.camera,
            viewpoints,
            pulse,
            marker: self
                .marker
                .map(|m| SurfaceMarker::new(m.scale, m.materials)),
            device,
        };
        (self.settings, parts, model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PickSphere {
    node: NodeId,
    center: Vec3,
    radius: f32,
    layer: u32,
}

/// Static collision geometry of a loaded scene.
#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    spheres: Vec<PickSphere>,
    boxes: Vec<SurfaceSpec>,
}

impl SceneModel {
    pub fn surface_count(&self) -> usize {
        self.boxes.len()
    }
}

impl Raycaster for SceneModel {
    fn cast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let spheres = self
            .spheres
            .iter()
            .filter(|s| mask.contains(s.layer))
            .filter_map(|s| hit_sphere(&ray, s));
        let boxes = self
            .boxes
            .iter()
            .filter(|b| mask.contains(b.layer))
            .filter_map(|b| hit_box(&ray, b));

        spheres
            .chain(boxes)
            .filter(|hit| hit.distance <= max_distance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Front-face hit only; a sphere around the ray origin is ignored so the
/// viewpoint the camera stands in never blocks its own view.
fn hit_sphere(ray: &Ray, sphere: &PickSphere) -> Option<RayHit> {
    let oc = ray.origin - sphere.center;
    let c = oc.length_squared() - sphere.radius * sphere.radius;
    if c <= 0.0 {
        return None;
    }
    let b = oc.dot(ray.direction);
    let disc = b * b - c;
    if b > 0.0 || disc < 0.0 {
        return None;
    }

    let distance = -b - disc.sqrt();
    let point = ray.at(distance);
    Some(RayHit {
        point,
        normal: (point - sphere.center).normalize_or_zero(),
        distance,
        layer: sphere.layer,
        node: Some(sphere.node),
    })
}

/// Slab test against an axis-aligned box, entering faces only.
fn hit_box(ray: &Ray, surface: &SurfaceSpec) -> Option<RayHit> {
    let mut t_enter = 0.0_f32;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        let (lo, hi) = (surface.min[axis], surface.max[axis]);

        if dir.abs() < 1e-8 {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let (t0, t1) = ((lo - origin) / dir, (hi - origin) / dir);
        let (near, far) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
        if near > t_enter {
            t_enter = near;
            normal = Vec3::ZERO;
            normal[axis] = -dir.signum();
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    // Origin inside the box.
    if normal == Vec3::ZERO {
        return None;
    }
    Some(RayHit {
        point: ray.at(t_enter),
        normal,
        distance: t_enter,
        layer: surface.layer,
        node: None,
    })
}
