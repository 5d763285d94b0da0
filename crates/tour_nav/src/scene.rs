//! Scene queries consumed from the host engine.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Bit set of collision layers (0..32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    pub const fn layer(layer: u32) -> Self {
        Self(1 << layer)
    }

    #[inline]
    pub fn contains(self, layer: u32) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Closest intersection reported by a [`Raycaster`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Unit surface normal at `point`.
    pub normal: Vec3,
    pub distance: f32,
    /// Collision layer of the object that was hit.
    pub layer: u32,
    /// Set when the collider belongs to a viewpoint node.
    pub node: Option<NodeId>,
}

/// Ray intersection against the host scene. Trigger volumes are ignored.
pub trait Raycaster {
    fn cast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit>;
}

impl<R: Raycaster + ?Sized> Raycaster for &R {
    fn cast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        (**self).cast(ray, max_distance, mask)
    }
}

impl<R: Raycaster + ?Sized> Raycaster for Box<R> {
    fn cast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        (**self).cast(ray, max_distance, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_membership() {
        let mask = LayerMask(LayerMask::layer(0).0 | LayerMask::layer(9).0);
        assert!(mask.contains(0));
        assert!(mask.contains(9));
        assert!(!mask.contains(3));
        assert!(!LayerMask::ALL.contains(40));
        assert!(!LayerMask::NONE.contains(0));
    }

    #[test]
    fn ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(ray.direction, Vec3::Z);
        assert_eq!(ray.at(2.5), Vec3::new(0.0, 0.0, 2.5));
    }
}
