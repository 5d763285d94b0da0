//! Integer grid addressing for authored viewpoints.
//!
//! World positions are projected onto one of two fixed planes and rounded to
//! the nearest multiple of the cell size. The axis normal to the plane is
//! never stored: callers supply it when converting a cell back to a world
//! position, since camera height is managed independently of the grid.

use std::collections::HashMap;
use std::ops::Add;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::node::{NodeId, Viewpoints};

/// Integer address of one viewpoint slot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const ZERO: Self = Self::new(0, 0);
    pub const RIGHT: Self = Self::new(1, 0);
    pub const LEFT: Self = Self::new(-1, 0);
    pub const UP: Self = Self::new(0, 1);
    pub const DOWN: Self = Self::new(0, -1);

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Saturates at the edges of the `i32` range.
impl Add for GridCell {
    type Output = GridCell;

    fn add(self, rhs: GridCell) -> GridCell {
        GridCell::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which world plane the grid lies in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridPlane {
    /// Cells span world X and Z; Y is height.
    #[default]
    Xz,
    /// Cells span world X and Y; Z is height.
    Xy,
}

impl GridPlane {
    /// World axis perpendicular to the grid.
    #[inline]
    pub fn normal(self) -> Vec3 {
        match self {
            GridPlane::Xz => Vec3::Y,
            GridPlane::Xy => Vec3::Z,
        }
    }

    /// In-plane coordinates of a world vector.
    #[inline]
    pub fn planar(self, v: Vec3) -> Vec2 {
        match self {
            GridPlane::Xz => Vec2::new(v.x, v.z),
            GridPlane::Xy => Vec2::new(v.x, v.y),
        }
    }

    /// Off-plane ("height") component of a world vector.
    #[inline]
    pub fn height(self, v: Vec3) -> f32 {
        match self {
            GridPlane::Xz => v.y,
            GridPlane::Xy => v.z,
        }
    }

    #[inline]
    fn compose(self, planar: Vec2, height: f32) -> Vec3 {
        match self {
            GridPlane::Xz => Vec3::new(planar.x, height, planar.y),
            GridPlane::Xy => Vec3::new(planar.x, planar.y, height),
        }
    }
}

/// Placement of the grid in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Edge length of one cell in world units.
    pub cell_size: f32,
    /// World position of cell (0, 0).
    pub origin: Vec3,
    pub plane: GridPlane,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_size: 5.0,
            origin: Vec3::ZERO,
            plane: GridPlane::Xz,
        }
    }
}

impl GridLayout {
    /// Projects a world position to the nearest cell. Halfway points round to
    /// the even cell.
    pub fn world_to_cell(&self, world: Vec3) -> GridCell {
        let local = self.plane.planar(world - self.origin) / self.cell_size;
        GridCell::new(
            local.x.round_ties_even() as i32,
            local.y.round_ties_even() as i32,
        )
    }

    /// Center of `cell` in world space, with the off-plane axis set to `height`.
    pub fn cell_to_world_center(&self, cell: GridCell, height: f32) -> Vec3 {
        let planar = self.plane.planar(self.origin)
            + Vec2::new(cell.x as f32, cell.y as f32) * self.cell_size;
        self.plane.compose(planar, height)
    }
}

/// Cell to node lookup, rebuilt from the viewpoint set on demand.
#[derive(Debug, Clone, Default)]
pub struct GridIndex {
    layout: GridLayout,
    nodes: HashMap<GridCell, NodeId>,
}

impl GridIndex {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            nodes: HashMap::new(),
        }
    }

    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Re-scans every node, active or not. The first node claiming a cell
    /// keeps it; later claimants are dropped without error.
    ///
    /// Returns the number of indexed cells.
    pub fn rebuild(&mut self, viewpoints: &Viewpoints) -> usize {
        self.nodes.clear();

        for (id, node) in viewpoints.iter() {
            let cell = self.layout.world_to_cell(node.position());
            match self.nodes.get(&cell) {
                Some(owner) => log::debug!(
                    "Viewpoint '{}' shares cell {} with node {:?}; keeping the first.",
                    node.name(),
                    cell,
                    owner
                ),
                None => {
                    self.nodes.insert(cell, id);
                }
            }
        }

        log::debug!(
            "Grid index rebuilt: {} cells from {} viewpoints.",
            self.nodes.len(),
            viewpoints.len()
        );
        self.nodes.len()
    }

    #[inline]
    pub fn world_to_cell(&self, world: Vec3) -> GridCell {
        self.layout.world_to_cell(world)
    }

    #[inline]
    pub fn cell_to_world_center(&self, cell: GridCell, height: f32) -> Vec3 {
        self.layout.cell_to_world_center(cell, height)
    }

    #[inline]
    pub fn has_node(&self, cell: GridCell) -> bool {
        self.nodes.contains_key(&cell)
    }

    #[inline]
    pub fn try_get_node(&self, cell: GridCell) -> Option<NodeId> {
        self.nodes.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.nodes.keys().copied()
    }

    /// Indexed cell whose center (placed at `height`) lies closest to `point`.
    /// Equal distances resolve to the smaller cell so the result does not
    /// depend on hash order.
    pub fn closest_cell(&self, point: Vec3, height: f32) -> Option<GridCell> {
        self.nodes
            .keys()
            .map(|&cell| {
                let d = self.cell_to_world_center(cell, height).distance_squared(point);
                (cell, d)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(cell, _)| cell)
    }
}
