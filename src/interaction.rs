use std::collections::HashSet;

use eframe::egui::Vec2;

use crate::physics::Simulation;

/// Alpha target held while at least one node is being dragged, so the rest
/// of the layout keeps responding instead of cooling down.
pub const DRAG_ALPHA_TARGET: f32 = 0.3;

/// Per-node `Free -> Dragging -> Free` state machine over a simulation.
#[derive(Debug, Default)]
pub struct DragController {
    dragging: HashSet<String>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self, node_id: &str) -> bool {
        self.dragging.contains(node_id)
    }

    pub fn active_drags(&self) -> usize {
        self.dragging.len()
    }

    /// Pins the node where it currently is. Ignored for unknown nodes and for
    /// a node already being dragged.
    pub fn on_drag_start(&mut self, simulation: &mut Simulation, node_id: &str) -> bool {
        if self.is_dragging(node_id) {
            return false;
        }
        let Some(position) = simulation.position(node_id) else {
            return false;
        };

        let first = self.dragging.is_empty();
        self.dragging.insert(node_id.to_owned());
        simulation.pin(node_id, position);
        if first {
            simulation.set_alpha_target(DRAG_ALPHA_TARGET);
            simulation.restart();
        }
        tracing::debug!(node = node_id, "drag started");
        true
    }

    /// Moves the pin. Last writer wins; moves for nodes not being dragged are
    /// ignored.
    pub fn on_drag_move(&mut self, simulation: &mut Simulation, node_id: &str, position: Vec2) -> bool {
        if !self.is_dragging(node_id) {
            return false;
        }
        simulation.pin(node_id, position)
    }

    pub fn on_drag_end(&mut self, simulation: &mut Simulation, node_id: &str) -> bool {
        if !self.dragging.remove(node_id) {
            return false;
        }
        simulation.unpin(node_id);
        if self.dragging.is_empty() {
            simulation.set_alpha_target(0.0);
        }
        tracing::debug!(node = node_id, "drag ended");
        true
    }

    /// Releases every drag, e.g. when the pointer leaves the window.
    pub fn cancel_all(&mut self, simulation: &mut Simulation) {
        let active = self.dragging.drain().collect::<Vec<_>>();
        for node_id in &active {
            simulation.unpin(node_id);
        }
        if !active.is_empty() {
            simulation.set_alpha_target(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::{Edge, Node, NodeKind};
    use crate::physics::{SimulationConfig, SimulationState};

    fn simulation() -> Simulation {
        let nodes = ["a", "b", "c"]
            .into_iter()
            .map(|id| Node {
                id: id.to_owned(),
                kind: NodeKind::User,
                weight: 2,
                label: id.to_owned(),
                commit_reference: None,
            })
            .collect::<Vec<_>>();
        let edges = vec![Edge {
            source: "a".to_owned(),
            target: "b".to_owned(),
            weight: 2,
        }];
        let config = SimulationConfig {
            max_duration_secs: None,
            ..SimulationConfig::default()
        };
        Simulation::new(&nodes, &edges, &[], config).expect("valid graph")
    }

    #[test]
    fn drag_pins_follows_and_releases() {
        let mut sim = simulation();
        sim.run_until_settled();
        let mut drag = DragController::new();

        let start = sim.position("a").expect("a");
        assert!(drag.on_drag_start(&mut sim, "a"));
        assert_eq!(sim.state(), SimulationState::Running);
        assert_eq!(sim.alpha_target(), DRAG_ALPHA_TARGET);
        assert_eq!(sim.body("a").and_then(|body| body.pin), Some(start));

        let target = vec2(400.0, 40.0);
        assert!(drag.on_drag_move(&mut sim, "a", target));
        for _ in 0..5 {
            sim.step();
            assert_eq!(sim.position("a"), Some(target));
        }

        assert!(drag.on_drag_end(&mut sim, "a"));
        assert_eq!(sim.body("a").and_then(|body| body.pin), None);
        assert_eq!(sim.alpha_target(), 0.0);
        assert_eq!(sim.run_until_settled(), SimulationState::Converged);
    }

    #[test]
    fn repeated_start_is_idempotent() {
        let mut sim = simulation();
        let mut drag = DragController::new();
        assert!(drag.on_drag_start(&mut sim, "a"));
        assert!(!drag.on_drag_start(&mut sim, "a"));
        assert_eq!(drag.active_drags(), 1);
        assert!(drag.is_dragging("a"));
        assert!(!drag.is_dragging("b"));
    }

    #[test]
    fn concurrent_drags_are_independent() {
        let mut sim = simulation();
        let mut drag = DragController::new();
        drag.on_drag_start(&mut sim, "a");
        drag.on_drag_start(&mut sim, "c");
        drag.on_drag_move(&mut sim, "c", vec2(1.0, 2.0));

        assert!(drag.on_drag_end(&mut sim, "a"));
        assert!(!drag.is_dragging("a"));
        assert!(drag.is_dragging("c"));
        assert_eq!(sim.alpha_target(), DRAG_ALPHA_TARGET);
        assert_eq!(sim.body("c").and_then(|body| body.pin), Some(vec2(1.0, 2.0)));

        assert!(drag.on_drag_end(&mut sim, "c"));
        assert_eq!(sim.alpha_target(), 0.0);
    }

    #[test]
    fn events_for_unknown_or_idle_nodes_are_ignored() {
        let mut sim = simulation();
        let mut drag = DragController::new();
        assert!(!drag.on_drag_start(&mut sim, "ghost"));
        assert!(!drag.on_drag_move(&mut sim, "b", vec2(0.0, 0.0)));
        assert!(!drag.on_drag_end(&mut sim, "b"));
        assert_eq!(sim.body("b").and_then(|body| body.pin), None);
    }

    #[test]
    fn cancel_all_releases_pins() {
        let mut sim = simulation();
        let mut drag = DragController::new();
        drag.on_drag_start(&mut sim, "a");
        drag.on_drag_start(&mut sim, "b");
        drag.cancel_all(&mut sim);
        assert_eq!(drag.active_drags(), 0);
        assert!(sim.bodies().iter().all(|body| body.pin.is_none()));
        assert_eq!(sim.alpha_target(), 0.0);
    }
}
