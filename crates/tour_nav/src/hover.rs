//! Pointer hover: highlights the viewpoint under the pointer, or places a
//! marker on the surface it points at.
//!
//! Node highlight and surface marker never show together; a hovered node
//! always takes priority.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::CameraMotion;
use crate::device::DeviceClass;
use crate::node::{MaterialId, NodeId, Viewpoints};
use crate::scene::{LayerMask, Raycaster};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverSettings {
    pub hit_mask: LayerMask,
    /// Layers that show the marker in its "blocked" material.
    pub block_mask: LayerMask,
    pub max_distance: f32,
    /// Lift along the surface normal so the marker does not z-fight.
    pub surface_offset: f32,
    /// Cast through the viewport center until a pointer position arrives.
    pub use_screen_center: bool,
    pub node_hover_material: Option<MaterialId>,
    pub hide_marker_on_node_hover: bool,
    pub block_hover_material: Option<MaterialId>,
    /// On touch devices, face the marker toward the camera at a fixed scale.
    pub mobile_screen_pointer: bool,
    /// On touch devices, never show hover state at all.
    pub mobile_disable_pointer: bool,
    pub mobile_pointer_scale: Vec3,
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            hit_mask: LayerMask::ALL,
            block_mask: LayerMask::NONE,
            max_distance: 200.0,
            surface_offset: 0.02,
            use_screen_center: true,
            node_hover_material: None,
            hide_marker_on_node_hover: true,
            block_hover_material: None,
            mobile_screen_pointer: true,
            mobile_disable_pointer: false,
            mobile_pointer_scale: Vec3::splat(2.0),
        }
    }
}

/// Positional marker drawn where the pointer meets a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMarker {
    visible: bool,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    original_scale: Vec3,
    materials: Vec<MaterialId>,
    original: Option<Vec<MaterialId>>,
}

impl SurfaceMarker {
    pub fn new(scale: Vec3, materials: Vec<MaterialId>) -> Self {
        Self {
            visible: false,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale,
            original_scale: scale,
            original: (!materials.is_empty()).then(|| materials.clone()),
            materials,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn materials(&self) -> &[MaterialId] {
        &self.materials
    }

    fn apply_material(&mut self, material: Option<MaterialId>) {
        if let Some(material) = material {
            let slots = self.materials.len().max(1);
            self.materials = vec![material; slots];
        }
    }

    fn restore_material(&mut self) {
        if let Some(original) = &self.original {
            self.materials.clone_from(original);
        }
    }
}

/// What the last probe found under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverTarget {
    Nothing,
    Node(NodeId),
    Surface { point: Vec3, blocking: bool },
}

#[derive(Debug, Clone)]
pub struct HoverProbe {
    settings: HoverSettings,
    marker: Option<SurfaceMarker>,
    hovered: Option<NodeId>,
    on_block: bool,
    screen_point: Vec2,
    use_screen_center: bool,
}

impl HoverProbe {
    pub fn new(settings: HoverSettings, marker: Option<SurfaceMarker>) -> Self {
        Self {
            use_screen_center: settings.use_screen_center,
            settings,
            marker,
            hovered: None,
            on_block: false,
            screen_point: Vec2::ZERO,
        }
    }

    pub fn settings(&self) -> &HoverSettings {
        &self.settings
    }

    pub fn marker(&self) -> Option<&SurfaceMarker> {
        self.marker.as_ref()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn on_block(&self) -> bool {
        self.on_block
    }

    /// Pointer moved; cast through it from now on.
    pub fn on_point(&mut self, screen: Vec2) {
        self.screen_point = screen;
        self.use_screen_center = false;
    }

    /// Moves the probe point without changing the ray source.
    pub fn set_screen_point(&mut self, screen: Vec2) {
        self.screen_point = screen;
    }

    /// Casts once and updates highlight and marker state.
    pub fn probe<R: Raycaster + ?Sized>(
        &mut self,
        camera: &CameraMotion,
        viewport: Vec2,
        raycaster: &R,
        nodes: &mut Viewpoints,
        device: DeviceClass,
    ) -> HoverTarget {
        let mobile = device.is_mobile();
        if mobile && self.settings.mobile_disable_pointer {
            self.clear(nodes);
            return HoverTarget::Nothing;
        }

        let ray = if self.use_screen_center {
            camera.center_ray()
        } else {
            camera.screen_ray(self.screen_point, viewport)
        };

        let Some(hit) = raycaster.cast(ray, self.settings.max_distance, self.settings.hit_mask)
        else {
            self.clear(nodes);
            return HoverTarget::Nothing;
        };

        if let (Some(node), Some(material)) = (hit.node, self.settings.node_hover_material) {
            if self.hovered != Some(node) {
                self.restore_hovered(nodes);
                if let Some(n) = nodes.get_mut(node) {
                    n.set_hover_override(material);
                }
                self.hovered = Some(node);
            }

            self.on_block = false;
            if let Some(marker) = self.marker.as_mut() {
                if self.settings.hide_marker_on_node_hover {
                    marker.visible = false;
                }
                marker.restore_material();
            }
            return HoverTarget::Node(node);
        }

        self.restore_hovered(nodes);

        let blocking = self.settings.block_mask.contains(hit.layer);
        let target = HoverTarget::Surface {
            point: hit.point,
            blocking,
        };
        let Some(marker) = self.marker.as_mut() else {
            return target;
        };

        marker.visible = true;
        marker.position = hit.point + hit.normal * self.settings.surface_offset;
        if mobile && self.settings.mobile_screen_pointer {
            marker.scale = self.settings.mobile_pointer_scale;
            marker.rotation = camera.rotation();
        } else {
            marker.scale = marker.original_scale;
            marker.rotation = Quat::from_rotation_arc(Vec3::Y, hit.normal);
        }

        if blocking {
            self.on_block = true;
            marker.apply_material(self.settings.block_hover_material);
        } else if self.on_block {
            self.on_block = false;
            marker.restore_material();
        }
        target
    }

    /// Drops the node highlight, restores the marker and hides it.
    pub fn clear(&mut self, nodes: &mut Viewpoints) {
        self.restore_hovered(nodes);
        self.on_block = false;
        if let Some(marker) = self.marker.as_mut() {
            marker.restore_material();
            marker.visible = false;
        }
    }

    fn restore_hovered(&mut self, nodes: &mut Viewpoints) {
        if let Some(node) = self.hovered.take().and_then(|id| nodes.get_mut(id)) {
            node.restore_original();
        }
    }
}
