//! Authored viewpoints and their visual state.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Handle to a node inside a [`Viewpoints`] set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub usize);

/// Opaque material handle owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// One authored camera vantage point.
///
/// The node's viewpoint content (the panorama shell, hotspots, ...) is shown
/// only while the node is active. Nodes start inactive; the view switcher is
/// the only thing that toggles them.
#[derive(Debug, Clone)]
pub struct ViewpointNode {
    name: String,
    position: Vec3,
    /// Visibility of the attached content; `None` when nothing is attached.
    content: Option<bool>,
    materials: Vec<MaterialId>,
    /// Material set captured when the node was built.
    original: Option<Vec<MaterialId>>,
    hover: Option<MaterialId>,
}

impl ViewpointNode {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            content: Some(false),
            materials: Vec::new(),
            original: None,
            hover: None,
        }
    }

    /// Sets the renderer's material slots and caches them as the original set.
    pub fn with_materials(mut self, materials: Vec<MaterialId>) -> Self {
        self.original = (!materials.is_empty()).then(|| materials.clone());
        self.materials = materials;
        self
    }

    /// Detaches the viewpoint content; activation becomes a no-op.
    pub fn without_content(mut self) -> Self {
        self.content = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Shows or hides the viewpoint content. Idempotent.
    pub fn set_active(&mut self, active: bool) {
        if let Some(visible) = self.content.as_mut() {
            if *visible != active {
                log::trace!("Viewpoint '{}' active={}", self.name, active);
            }
            *visible = active;
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.content.unwrap_or(false)
    }

    /// Replaces every material slot with `material`.
    pub fn set_hover_override(&mut self, material: MaterialId) {
        let slots = self.materials.len().max(1);
        self.materials = vec![material; slots];
        self.hover = Some(material);
    }

    /// Returns the material slots to the cached original set. Does nothing
    /// when no original set was cached.
    pub fn restore_original(&mut self) {
        if let Some(original) = &self.original {
            self.materials.clone_from(original);
            self.hover = None;
        }
    }

    pub fn hover_override(&self) -> Option<MaterialId> {
        self.hover
    }

    pub fn materials(&self) -> &[MaterialId] {
        &self.materials
    }
}

/// Every viewpoint in the loaded scene, active or not.
#[derive(Debug, Clone, Default)]
pub struct Viewpoints {
    nodes: Vec<ViewpointNode>,
}

impl Viewpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: ViewpointNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&ViewpointNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ViewpointNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (NodeId, &ViewpointNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Nodes whose content is currently shown.
    pub fn active(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(|(_, n)| n.is_active()).map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl FromIterator<ViewpointNode> for Viewpoints {
    fn from_iter<I: IntoIterator<Item = ViewpointNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
