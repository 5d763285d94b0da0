//! Which viewpoint is shown, and the overlap when switching between them.
//!
//! A switch activates the new node at once and retires the previous one
//! after a short delay so both are visible for a moment. Only one delayed
//! retirement exists at a time; a newer switch supersedes it.

use crate::grid::{GridCell, GridIndex};
use crate::node::{NodeId, Viewpoints};
use crate::pulse::TransitionPulse;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingDeactivation {
    node: NodeId,
    remaining: f32,
}

#[derive(Debug, Clone)]
pub struct ViewSwitcher {
    delay: f32,
    current: Option<NodeId>,
    pending: Option<PendingDeactivation>,
}

impl ViewSwitcher {
    /// `delay` is the overlap in seconds before the previous node is hidden.
    pub fn new(delay: f32) -> Self {
        Self {
            delay,
            current: None,
            pending: None,
        }
    }

    #[inline]
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Node waiting to be hidden, if any.
    #[inline]
    pub fn pending(&self) -> Option<NodeId> {
        self.pending.map(|p| p.node)
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Makes the node at `cell` the shown viewpoint.
    ///
    /// A superseded pending retirement is carried out immediately unless its
    /// node is the one being shown again. Without a node at `cell` everything
    /// is hidden and there is no current node.
    pub fn switch_to(
        &mut self,
        cell: GridCell,
        grid: &GridIndex,
        nodes: &mut Viewpoints,
        pulse: Option<&mut TransitionPulse>,
    ) -> Option<NodeId> {
        let superseded = self.pending.take().map(|p| p.node);
        let previous = self.current;

        let Some(next) = grid.try_get_node(cell) else {
            for node in superseded.into_iter().chain(previous) {
                deactivate(nodes, node);
            }
            if previous.is_some() {
                log::debug!("Cell {} has no viewpoint; leaving the authored grid.", cell);
            }
            self.current = None;
            return None;
        };

        if let Some(stale) = superseded.filter(|&n| n != next) {
            deactivate(nodes, stale);
        }

        if let Some(node) = nodes.get_mut(next) {
            node.set_active(true);
            log::debug!("Viewpoint '{}' active at cell {}", node.name(), cell);
        }
        self.current = Some(next);

        if let Some(pulse) = pulse {
            pulse.trigger();
        }

        if let Some(prev) = previous.filter(|&p| p != next) {
            if self.delay > 0.0 {
                self.pending = Some(PendingDeactivation {
                    node: prev,
                    remaining: self.delay,
                });
            } else {
                deactivate(nodes, prev);
            }
        }

        Some(next)
    }

    /// Counts down the pending retirement.
    pub fn tick(&mut self, dt: f32, nodes: &mut Viewpoints) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        pending.remaining -= dt;
        if pending.remaining > 0.0 {
            return;
        }

        let node = pending.node;
        self.pending = None;
        if Some(node) != self.current {
            deactivate(nodes, node);
        }
    }

    /// Hides everything this switcher has shown.
    pub fn clear(&mut self, nodes: &mut Viewpoints) {
        if let Some(pending) = self.pending.take() {
            deactivate(nodes, pending.node);
        }
        if let Some(current) = self.current.take() {
            deactivate(nodes, current);
        }
    }
}

fn deactivate(nodes: &mut Viewpoints, id: NodeId) {
    if let Some(node) = nodes.get_mut(id) {
        node.set_active(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridLayout;
    use crate::node::ViewpointNode;
    use crate::pulse::{PulseSettings, TransitionPulse};
    use glam::Vec3;

    const A: GridCell = GridCell::new(0, 0);
    const B: GridCell = GridCell::new(1, 0);
    const C: GridCell = GridCell::new(2, 0);

    fn row() -> (GridIndex, Viewpoints) {
        let nodes: Viewpoints = (0..3)
            .map(|x| ViewpointNode::new(format!("n{x}"), Vec3::new(x as f32 * 5.0, 0.0, 0.0)))
            .collect();
        let mut grid = GridIndex::new(GridLayout::default());
        grid.rebuild(&nodes);
        (grid, nodes)
    }

    fn active(nodes: &Viewpoints) -> Vec<usize> {
        nodes.active().map(|id| id.0).collect()
    }

    #[test]
    fn previous_node_overlaps_then_hides() {
        let (grid, mut nodes) = row();
        let mut views = ViewSwitcher::new(0.08);

        views.switch_to(A, &grid, &mut nodes, None);
        views.switch_to(B, &grid, &mut nodes, None);
        assert_eq!(active(&nodes), vec![0, 1]);
        assert_eq!(views.pending(), Some(NodeId(0)));

        views.tick(0.05, &mut nodes);
        assert_eq!(active(&nodes), vec![0, 1]);
        views.tick(0.05, &mut nodes);
        assert_eq!(active(&nodes), vec![1]);
        assert_eq!(views.pending(), None);
    }

    #[test]
    fn superseded_retirement_runs_immediately() {
        let (grid, mut nodes) = row();
        let mut views = ViewSwitcher::new(0.08);

        views.switch_to(A, &grid, &mut nodes, None);
        views.switch_to(B, &grid, &mut nodes, None);
        views.tick(0.02, &mut nodes);
        views.switch_to(C, &grid, &mut nodes, None);

        // A (two switches back) is hidden now; B overlaps with C.
        assert_eq!(active(&nodes), vec![1, 2]);
        assert_eq!(views.pending(), Some(NodeId(1)));

        views.tick(0.1, &mut nodes);
        assert_eq!(active(&nodes), vec![2]);
    }

    #[test]
    fn round_trip_keeps_returning_node() {
        let (grid, mut nodes) = row();
        let mut views = ViewSwitcher::new(0.08);

        views.switch_to(A, &grid, &mut nodes, None);
        views.switch_to(B, &grid, &mut nodes, None);
        views.switch_to(A, &grid, &mut nodes, None);
        assert_eq!(views.current(), Some(NodeId(0)));

        views.tick(0.1, &mut nodes);
        assert_eq!(active(&nodes), vec![0]);
    }

    #[test]
    fn reselecting_current_cell_schedules_nothing() {
        let (grid, mut nodes) = row();
        let mut views = ViewSwitcher::new(0.08);
        views.switch_to(B, &grid, &mut nodes, None);
        views.switch_to(B, &grid, &mut nodes, None);
        assert_eq!(views.pending(), None);
        assert_eq!(active(&nodes), vec![1]);
    }

    #[test]
    fn leaving_the_grid_hides_everything() {
        let (grid, mut nodes) = row();
        let mut views = ViewSwitcher::new(0.08);

        views.switch_to(A, &grid, &mut nodes, None);
        views.switch_to(B, &grid, &mut nodes, None);
        let landed = views.switch_to(GridCell::new(9, 9), &grid, &mut nodes, None);

        assert_eq!(landed, None);
        assert_eq!(views.current(), None);
        assert!(active(&nodes).is_empty());
    }

    #[test]
    fn zero_delay_hides_previous_at_once() {
        let (grid, mut nodes) = row();
        let mut views = ViewSwitcher::new(0.0);
        views.switch_to(A, &grid, &mut nodes, None);
        views.switch_to(B, &grid, &mut nodes, None);
        assert_eq!(active(&nodes), vec![1]);
        assert_eq!(views.pending(), None);
    }

    #[test]
    fn successful_switch_triggers_pulse() {
        let (grid, mut nodes) = row();
        let mut views = ViewSwitcher::new(0.08);
        let mut pulse = TransitionPulse::new(PulseSettings::default(), Box::new(|_: &str, _: f32| {}));

        views.switch_to(GridCell::new(5, 5), &grid, &mut nodes, Some(&mut pulse));
        assert!(!pulse.is_running());

        views.switch_to(A, &grid, &mut nodes, Some(&mut pulse));
        assert!(pulse.is_running());
    }
}
