//! Force-directed layout engine.
//!
//! The engine owns every position and velocity. A host scheduler (an
//! animation frame, a timer, or a test loop) advances it with [`Simulation::step`];
//! each step computes all force contributions against the positions at the
//! start of the step, then commits the new positions at once and publishes a
//! [`Snapshot`] to subscribers.

mod config;
mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{Vec2, vec2};

use crate::error::{DegenerateGeometry, SimulationError};
use crate::graph::{Edge, Graph, Node};
use crate::util::stable_pair;

pub use config::{ForceConfig, RepulsionMode, SimulationConfig};
use forces::{
    ChargeParams, Link, apply_axis, apply_charge_barnes_hut, apply_charge_exact, apply_collisions,
    apply_links,
};
use quadtree::QuadTree;

/// Radius used for nodes the caller gave no radius for.
pub const DEFAULT_RADIUS: f32 = 3.0;

const SEED_SPACING: f32 = 10.0;
const SEED_JITTER: f32 = 2.0;
const MAX_RESEED_ATTEMPTS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    Running,
    /// Alpha fell below `alpha_min`.
    Converged,
    /// The step or wall-clock budget ran out first. A normal ending, not an error.
    TimedOut,
    Cancelled,
}

impl SimulationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::TimedOut | Self::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Converged => "converged",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Per-node physics state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
    /// Collision radius: visual radius plus the configured margin.
    pub radius: f32,
}

/// Positions after a committed step, in node order.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    pub alpha: f32,
    pub state: SimulationState,
    pub ids: Arc<[String]>,
    pub positions: Vec<Vec2>,
}

impl Snapshot {
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec2)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.positions.iter().copied())
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.iter()
            .find_map(|(candidate, position)| (candidate == id).then_some(position))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationStats {
    pub state: SimulationState,
    pub step: usize,
    pub alpha: f32,
    pub alpha_target: f32,
    pub elapsed: Duration,
}

type Subscriber = Box<dyn FnMut(&Snapshot)>;

struct PhysicsScratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
}

pub struct Simulation {
    ids: Arc<[String]>,
    index_by_id: HashMap<String, usize>,
    bodies: Vec<Body>,
    visual_radii: Vec<f32>,
    degrees: Vec<usize>,
    edge_pairs: Vec<(usize, usize)>,
    links: Vec<Link>,
    config: SimulationConfig,
    alpha: f32,
    alpha_target: f32,
    state: SimulationState,
    steps: usize,
    started_at: Option<Instant>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    scratch: PhysicsScratch,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("nodes", &self.bodies.len())
            .field("links", &self.links.len())
            .field("state", &self.state)
            .field("alpha", &self.alpha)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// `radii` are visual radii in node order; missing entries fall back to
    /// [`DEFAULT_RADIUS`]. Every edge endpoint must name a node.
    pub fn new(
        nodes: &[Node],
        edges: &[Edge],
        radii: &[f32],
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let config = config.sanitized();

        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(SimulationError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }

        let mut edge_pairs = Vec::with_capacity(edges.len());
        let mut degrees = vec![0usize; nodes.len()];
        for edge in edges {
            let source = lookup(&index_by_id, &edge.source)?;
            let target = lookup(&index_by_id, &edge.target)?;
            degrees[source] += 1;
            degrees[target] += 1;
            edge_pairs.push((source, target));
        }

        let visual_radii = (0..nodes.len())
            .map(|index| {
                radii
                    .get(index)
                    .copied()
                    .filter(|radius| radius.is_finite() && *radius >= 0.0)
                    .unwrap_or(DEFAULT_RADIUS)
            })
            .collect::<Vec<_>>();

        let ids: Arc<[String]> = nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>()
            .into();

        let mut simulation = Self {
            ids,
            index_by_id,
            bodies: Vec::new(),
            visual_radii,
            degrees,
            edge_pairs,
            links: Vec::new(),
            alpha: config.alpha,
            alpha_target: config.alpha_target,
            config,
            state: SimulationState::Idle,
            steps: 0,
            started_at: None,
            subscribers: Vec::new(),
            next_subscription: 0,
            scratch: PhysicsScratch {
                positions: Vec::with_capacity(nodes.len()),
                radii: Vec::with_capacity(nodes.len()),
                deltas: Vec::with_capacity(nodes.len()),
            },
        };
        simulation.seed_bodies();
        simulation.rebuild_links();

        tracing::debug!(
            nodes = simulation.bodies.len(),
            links = simulation.links.len(),
            "simulation initialized"
        );
        Ok(simulation)
    }

    pub fn for_graph(
        graph: &Graph,
        radii: &[f32],
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        Self::new(graph.nodes(), graph.edges(), radii, config)
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn body(&self, id: &str) -> Option<&Body> {
        self.index_of(id).map(|index| &self.bodies[index])
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.body(id).map(|body| body.position)
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            state: self.state,
            step: self.steps,
            alpha: self.alpha,
            alpha_target: self.alpha_target,
            elapsed: self.elapsed(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.steps,
            alpha: self.alpha,
            state: self.state,
            ids: Arc::clone(&self.ids),
            positions: self.bodies.iter().map(|body| body.position).collect(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(candidate, _)| *candidate != id);
        self.subscribers.len() != before
    }

    /// Idle → Running. Has no effect in any other state.
    pub fn start(&mut self) {
        if self.state == SimulationState::Idle {
            self.begin_run();
        }
    }

    /// Explicit restart from any state, cancelled included. Resets the step
    /// and wall-clock budget. A run that already ended, or has cooled below
    /// `alpha_min`, is reheated to at least `reheat_alpha`.
    pub fn restart(&mut self) {
        if self.state.is_terminal() || self.alpha < self.config.alpha_min {
            self.alpha = self.alpha.max(self.config.reheat_alpha);
        }
        self.begin_run();
    }

    /// Sets alpha and restarts.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
        self.begin_run();
    }

    pub fn set_alpha_target(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target.clamp(0.0, 1.0);
    }

    /// Cancels the run. Idempotent; once this returns no subscriber is called
    /// again until an explicit [`Simulation::restart`].
    pub fn stop(&mut self) {
        if self.state != SimulationState::Cancelled {
            tracing::debug!(step = self.steps, "simulation cancelled");
        }
        self.state = SimulationState::Cancelled;
    }

    /// Fixes a node at `position`. The node keeps exerting forces but is no
    /// longer moved by them. A settled layout is revived so others respond.
    pub fn pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let body = &mut self.bodies[index];
        body.pin = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
        self.revive();
        true
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.bodies[index].pin.take().is_none() {
            return false;
        }
        self.revive();
        true
    }

    /// Replaces force parameters in place and reheats; positions are kept.
    pub fn configure(&mut self, update: impl FnOnce(&mut ForceConfig)) {
        update(&mut self.config.forces);
        self.config.forces = self.config.forces.sanitized();
        self.refresh_collision_radii();
        self.rebuild_links();
        self.revive();
    }

    /// Replaces visual radii (e.g. after a styling change) and reheats.
    pub fn set_radii(&mut self, radii: &[f32]) {
        for (index, radius) in self.visual_radii.iter_mut().enumerate() {
            *radius = radii
                .get(index)
                .copied()
                .filter(|radius| radius.is_finite() && *radius >= 0.0)
                .unwrap_or(DEFAULT_RADIUS);
        }
        self.refresh_collision_radii();
        self.rebuild_links();
        self.revive();
    }

    /// Advances one tick. Does nothing once the run has ended; an idle
    /// simulation starts on its first step.
    pub fn step(&mut self) -> SimulationState {
        match self.state {
            SimulationState::Idle => self.begin_run(),
            SimulationState::Running => {}
            SimulationState::Converged
            | SimulationState::TimedOut
            | SimulationState::Cancelled => return self.state,
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.accumulate_forces();
        self.commit_positions();
        self.steps += 1;
        self.check_termination();

        let terminal = self.state.is_terminal();
        if terminal || self.steps % self.config.publish_every == 0 {
            self.publish();
        }
        self.state
    }

    /// Steps until the run ends. Bounded by `max_steps` even with a
    /// non-zero alpha target.
    pub fn run_until_settled(&mut self) -> SimulationState {
        self.start();
        while self.state == SimulationState::Running {
            self.step();
        }
        self.state
    }

    fn begin_run(&mut self) {
        self.state = SimulationState::Running;
        self.steps = 0;
        self.started_at = Some(Instant::now());
    }

    fn revive(&mut self) {
        if matches!(
            self.state,
            SimulationState::Converged | SimulationState::TimedOut
        ) {
            self.alpha = self.alpha.max(self.config.reheat_alpha);
            self.begin_run();
        } else if self.state == SimulationState::Running {
            self.alpha = self.alpha.max(self.config.alpha_min * 2.0);
        }
    }

    fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    fn accumulate_forces(&mut self) {
        let node_count = self.bodies.len();
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch
            .positions
            .extend(self.bodies.iter().map(|body| body.position));
        scratch.radii.clear();
        scratch
            .radii
            .extend(self.bodies.iter().map(|body| body.radius));
        scratch.deltas.clear();
        scratch.deltas.resize(node_count, Vec2::ZERO);

        let positions = &scratch.positions;
        let radii = &scratch.radii;
        let deltas = &mut scratch.deltas;
        let forces = self.config.forces;
        let alpha = self.alpha;

        let needs_tree = !forces.uses_exact_repulsion(node_count) || forces.collision_strength > 0.0;
        let tree = if needs_tree && node_count > 1 {
            QuadTree::build(positions, radii)
        } else {
            None
        };

        if forces.charge_strength != 0.0 && node_count > 1 {
            let distance_max = forces.charge_distance_max.unwrap_or(f32::INFINITY);
            let params = ChargeParams {
                strength: forces.charge_strength * alpha,
                distance_min_sq: forces.charge_distance_min * forces.charge_distance_min,
                distance_max_sq: distance_max * distance_max,
                theta: forces.barnes_hut_theta,
            };
            match (&tree, forces.uses_exact_repulsion(node_count)) {
                (Some(tree), false) => apply_charge_barnes_hut(tree, positions, params, deltas),
                _ => apply_charge_exact(positions, params, deltas),
            }
        }

        if forces.link_strength > 0.0 {
            apply_links(&self.links, positions, forces.link_strength, alpha, deltas);
        }

        if forces.collision_strength > 0.0
            && let Some(tree) = &tree
        {
            apply_collisions(tree, positions, radii, forces.collision_strength, deltas);
        }

        if forces.axis_strength > 0.0 {
            apply_axis(
                positions,
                self.config.axis_target(),
                forces.axis_strength * alpha,
                deltas,
            );
        }
    }

    fn commit_positions(&mut self) {
        let retain = 1.0 - self.config.velocity_decay;
        let positions = &self.scratch.positions;

        let centering = if self.config.forces.center_strength > 0.0 && !positions.is_empty() {
            let centroid =
                positions.iter().fold(Vec2::ZERO, |sum, position| sum + *position)
                    / positions.len() as f32;
            (self.config.center() - centroid) * self.config.forces.center_strength
        } else {
            Vec2::ZERO
        };

        for (body, delta) in self.bodies.iter_mut().zip(&self.scratch.deltas) {
            if let Some(pin) = body.pin {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }

            body.velocity = (body.velocity + *delta) * retain;
            body.position += body.velocity + centering;
        }
    }

    fn check_termination(&mut self) {
        if self.alpha < self.config.alpha_min {
            self.state = SimulationState::Converged;
            tracing::info!(steps = self.steps, alpha = self.alpha, "layout converged");
            return;
        }

        let out_of_steps = self.steps >= self.config.max_steps;
        let out_of_time = self
            .config
            .max_duration_secs
            .and_then(|secs| Duration::try_from_secs_f32(secs).ok())
            .is_some_and(|limit| self.elapsed() >= limit);
        if out_of_steps || out_of_time {
            self.state = SimulationState::TimedOut;
            tracing::info!(
                steps = self.steps,
                alpha = self.alpha,
                elapsed_ms = self.elapsed().as_millis() as u64,
                "layout stopped before converging"
            );
        }
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }

    fn seed_bodies(&mut self) {
        let center = self.config.center();
        let margin = self.config.forces.collision_margin;
        self.bodies = self
            .ids
            .iter()
            .zip(&self.visual_radii)
            .enumerate()
            .map(|(index, (id, radius))| Body {
                position: center + seed_offset(index, id),
                velocity: Vec2::ZERO,
                pin: None,
                radius: radius + margin,
            })
            .collect();

        for attempt in 1..=MAX_RESEED_ATTEMPTS {
            let Err(degenerate) = find_coincident(&self.bodies) else {
                return;
            };
            tracing::warn!(
                coincident = degenerate.coincident,
                attempt,
                "re-seeding coincident nodes"
            );
            self.reseed_coincident(attempt);
        }
    }

    fn reseed_coincident(&mut self, attempt: usize) {
        let mut seen: HashMap<(u32, u32), usize> = HashMap::new();
        for index in 0..self.bodies.len() {
            if self.bodies[index].pin.is_some() {
                continue;
            }
            let key = position_key(self.bodies[index].position);
            if seen.insert(key, index).is_some() {
                let (jx, jy) = stable_pair(&format!("{}#{attempt}", self.ids[index]));
                let spread = SEED_JITTER * (attempt as f32 + 1.0);
                self.bodies[index].position += vec2(jx, jy) * spread + vec2(spread, 0.0) * 0.5;
            }
        }
    }

    fn refresh_collision_radii(&mut self) {
        let margin = self.config.forces.collision_margin;
        for (body, radius) in self.bodies.iter_mut().zip(&self.visual_radii) {
            body.radius = radius + margin;
        }
    }

    fn rebuild_links(&mut self) {
        let link_distance = self.config.forces.link_distance;
        self.links = self
            .edge_pairs
            .iter()
            .map(|&(source, target)| {
                let source_degree = self.degrees[source] as f32;
                let target_degree = self.degrees[target] as f32;
                Link {
                    source,
                    target,
                    rest_length: link_distance + self.visual_radii[source] + self.visual_radii[target],
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();
    }
}

fn lookup(index_by_id: &HashMap<String, usize>, id: &str) -> Result<usize, SimulationError> {
    index_by_id
        .get(id)
        .copied()
        .ok_or_else(|| SimulationError::UnknownNode { id: id.to_owned() })
}

/// Phyllotaxis spiral plus a small per-id jitter: deterministic, and distinct
/// for distinct indices.
fn seed_offset(index: usize, id: &str) -> Vec2 {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let radius = SEED_SPACING * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    let (jx, jy) = stable_pair(id);
    vec2(angle.cos(), angle.sin()) * radius + vec2(jx, jy) * SEED_JITTER
}

fn position_key(position: Vec2) -> (u32, u32) {
    (position.x.to_bits(), position.y.to_bits())
}

fn find_coincident(bodies: &[Body]) -> Result<(), DegenerateGeometry> {
    let mut seen = HashMap::with_capacity(bodies.len());
    let mut coincident = 0usize;
    for body in bodies.iter().filter(|body| body.pin.is_none()) {
        if seen.insert(position_key(body.position), ()).is_some() {
            coincident += 1;
        }
    }
    if coincident == 0 {
        Ok(())
    } else {
        Err(DegenerateGeometry { coincident })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::graph::NodeKind;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_owned(),
            kind: NodeKind::Repository,
            weight: 1,
            label: id.to_owned(),
            commit_reference: None,
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.to_owned(),
            target: target.to_owned(),
            weight: 1,
        }
    }

    fn star(leaves: usize) -> (Vec<Node>, Vec<Edge>) {
        let mut nodes = vec![node("hub")];
        let mut edges = Vec::new();
        for leaf in 0..leaves {
            let id = format!("leaf-{leaf}");
            edges.push(edge("hub", &id));
            nodes.push(node(&id));
        }
        (nodes, edges)
    }

    fn test_config() -> SimulationConfig {
        SimulationConfig {
            max_duration_secs: None,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn unknown_edge_endpoint_is_fatal() {
        let nodes = [node("a")];
        let edges = [edge("a", "ghost")];
        let error = Simulation::new(&nodes, &edges, &[], test_config()).expect_err("dangling");
        assert_eq!(
            error,
            SimulationError::UnknownNode {
                id: "ghost".to_owned()
            }
        );
    }

    #[test]
    fn duplicate_node_is_fatal() {
        let nodes = [node("a"), node("a")];
        assert!(matches!(
            Simulation::new(&nodes, &[], &[], test_config()),
            Err(SimulationError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn seeds_are_distinct() {
        let (nodes, edges) = star(200);
        let sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        assert!(find_coincident(sim.bodies()).is_ok());
    }

    #[test]
    fn reseeding_separates_coincident_bodies() {
        let (nodes, edges) = star(5);
        let mut sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        for body in &mut sim.bodies {
            body.position = vec2(1.0, 1.0);
        }
        assert_eq!(
            find_coincident(&sim.bodies),
            Err(DegenerateGeometry { coincident: 5 })
        );
        for attempt in 1..=MAX_RESEED_ATTEMPTS {
            if find_coincident(&sim.bodies).is_ok() {
                break;
            }
            sim.reseed_coincident(attempt);
        }
        assert!(find_coincident(&sim.bodies).is_ok());
    }

    #[test]
    fn alpha_decreases_monotonically_and_converges() {
        let (nodes, edges) = star(12);
        let mut sim = Simulation::new(&nodes, &edges, &[4.0; 13], test_config()).expect("valid graph");
        let mut previous = sim.alpha();
        let mut steps = 0;
        while sim.step() == SimulationState::Running {
            assert!(sim.alpha() < previous);
            previous = sim.alpha();
            steps += 1;
            assert!(steps < 1_000, "no convergence");
        }
        assert_eq!(sim.state(), SimulationState::Converged);
    }

    #[test]
    fn non_zero_alpha_target_times_out_on_step_budget() {
        let (nodes, edges) = star(3);
        let config = SimulationConfig {
            max_steps: 50,
            alpha_target: 0.3,
            ..test_config()
        };
        let mut sim = Simulation::new(&nodes, &edges, &[], config).expect("valid graph");
        assert_eq!(sim.run_until_settled(), SimulationState::TimedOut);
        assert_eq!(sim.stats().step, 50);
    }

    #[test]
    fn wall_clock_budget_is_enforced() {
        let (nodes, edges) = star(3);
        let config = SimulationConfig {
            max_duration_secs: Some(f32::MIN_POSITIVE),
            alpha_target: 0.5,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(&nodes, &edges, &[], config).expect("valid graph");
        sim.start();
        assert_eq!(sim.step(), SimulationState::TimedOut);
    }

    #[test]
    fn pinned_position_is_reported_exactly() {
        let (nodes, edges) = star(8);
        let mut sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        let pin = vec2(123.456, -78.9);
        assert!(sim.pin("hub", pin));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sim.subscribe(move |snapshot| {
            sink.borrow_mut().push(snapshot.position_of("hub"));
        });

        for _ in 0..40 {
            sim.step();
            assert_eq!(sim.position("hub"), Some(pin));
        }
        assert!(seen.borrow().iter().all(|position| *position == Some(pin)));
        assert_eq!(seen.borrow().len(), 40);
    }

    #[test]
    fn pinned_node_still_pushes_others() {
        let nodes = [node("a"), node("b")];
        let config = SimulationConfig {
            forces: ForceConfig {
                center_strength: 0.0,
                axis_strength: 0.0,
                collision_strength: 0.0,
                ..ForceConfig::default()
            },
            ..test_config()
        };
        let mut sim = Simulation::new(&nodes, &[], &[], config).expect("valid graph");
        sim.pin("a", vec2(0.0, 0.0));
        sim.bodies[1].position = vec2(5.0, 0.0);
        sim.step();
        assert!(sim.position("b").expect("b").x > 5.0);
        assert_eq!(sim.position("a"), Some(vec2(0.0, 0.0)));
    }

    #[test]
    fn stop_is_idempotent_and_silences_subscribers() {
        let (nodes, edges) = star(4);
        let mut sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        let calls = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&calls);
        sim.subscribe(move |_| *counter.borrow_mut() += 1);

        sim.step();
        sim.stop();
        sim.stop();
        for _ in 0..10 {
            assert_eq!(sim.step(), SimulationState::Cancelled);
        }
        assert_eq!(*calls.borrow(), 1);

        sim.pin("hub", vec2(1.0, 1.0));
        assert_eq!(sim.state(), SimulationState::Cancelled);

        sim.restart();
        sim.step();
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn pin_revives_converged_layout() {
        let (nodes, edges) = star(4);
        let mut sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        assert_eq!(sim.run_until_settled(), SimulationState::Converged);

        sim.pin("leaf-0", vec2(0.0, 0.0));
        assert_eq!(sim.state(), SimulationState::Running);
        assert!(sim.alpha() >= sim.config().reheat_alpha);
        assert_eq!(sim.stats().step, 0);

        sim.run_until_settled();
        assert!(sim.unpin("leaf-0"));
        assert_eq!(sim.state(), SimulationState::Running);
        assert!(!sim.unpin("leaf-0"));
    }

    #[test]
    fn restart_reheats_a_settled_layout() {
        let (nodes, edges) = star(2);
        let mut sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        assert_eq!(sim.run_until_settled(), SimulationState::Converged);
        assert!(sim.alpha() < sim.config().alpha_min);

        sim.restart();
        assert_eq!(sim.state(), SimulationState::Running);
        assert!(sim.alpha() >= sim.config().reheat_alpha);

        let mut running_steps = 0;
        while sim.step() == SimulationState::Running {
            running_steps += 1;
        }
        assert!(running_steps > 10, "settled again after {running_steps} steps");
        assert_eq!(sim.state(), SimulationState::Converged);
    }

    #[test]
    fn restart_keeps_alpha_of_a_warm_run() {
        let (nodes, edges) = star(2);
        let mut sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        for _ in 0..5 {
            sim.step();
        }
        let alpha = sim.alpha();
        sim.restart();
        assert_eq!(sim.alpha(), alpha);
        assert_eq!(sim.stats().step, 0);
    }

    #[test]
    fn unsubscribe_removes_callback() {
        let (nodes, edges) = star(2);
        let mut sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        let calls = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&calls);
        let id = sim.subscribe(move |_| *counter.borrow_mut() += 1);
        sim.step();
        assert!(sim.unsubscribe(id));
        assert!(!sim.unsubscribe(id));
        sim.step();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn publish_every_throttles_but_terminal_step_publishes() {
        let (nodes, edges) = star(2);
        let config = SimulationConfig {
            publish_every: 7,
            max_steps: 10,
            alpha_target: 0.5,
            ..test_config()
        };
        let mut sim = Simulation::new(&nodes, &edges, &[], config).expect("valid graph");
        let steps = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&steps);
        sim.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.step));
        sim.run_until_settled();
        assert_eq!(*steps.borrow(), vec![7, 10]);
    }

    #[test]
    fn layout_separates_connected_nodes_from_unrelated_ones() {
        let (mut nodes, mut edges) = star(6);
        nodes.push(node("island-a"));
        nodes.push(node("island-b"));
        edges.push(edge("island-a", "island-b"));
        let mut sim = Simulation::new(&nodes, &edges, &[5.0; 9], test_config()).expect("valid graph");
        sim.run_until_settled();

        let hub = sim.position("hub").expect("hub");
        for leaf in 0..6 {
            let position = sim.position(&format!("leaf-{leaf}")).expect("leaf");
            let distance = (position - hub).length();
            assert!(distance > 5.0 && distance < 120.0, "leaf {leaf} at {distance}");
        }
        assert!(
            sim.bodies()
                .iter()
                .all(|body| body.position.x.is_finite() && body.position.y.is_finite())
        );
    }

    #[test]
    fn layout_stays_centered() {
        let (nodes, edges) = star(10);
        let config = test_config().with_canvas(400.0, 300.0);
        let mut sim = Simulation::new(&nodes, &edges, &[], config).expect("valid graph");
        sim.run_until_settled();
        let centroid = sim
            .bodies()
            .iter()
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / sim.bodies().len() as f32;
        assert!((centroid - vec2(200.0, 150.0)).length() < 5.0, "centroid {centroid:?}");
    }

    #[test]
    fn barnes_hut_mode_converges_too() {
        let (nodes, edges) = star(60);
        let config = SimulationConfig {
            forces: ForceConfig {
                repulsion: RepulsionMode::BarnesHut,
                ..ForceConfig::default()
            },
            ..test_config()
        };
        let mut sim = Simulation::new(&nodes, &edges, &[], config).expect("valid graph");
        assert_eq!(sim.run_until_settled(), SimulationState::Converged);
    }

    #[test]
    fn configure_updates_rest_lengths_and_reheats() {
        let (nodes, edges) = star(2);
        let mut sim = Simulation::new(&nodes, &edges, &[2.0; 3], test_config()).expect("valid graph");
        sim.run_until_settled();
        sim.configure(|forces| forces.link_distance = 80.0);
        assert_eq!(sim.links[0].rest_length, 84.0);
        assert_eq!(sim.state(), SimulationState::Running);

        sim.set_radii(&[10.0, 10.0, 10.0]);
        assert_eq!(sim.links[0].rest_length, 100.0);
        assert_eq!(sim.bodies()[0].radius, 11.0);
    }

    #[test]
    fn link_bias_favors_better_connected_endpoint() {
        let (nodes, edges) = star(3);
        let sim = Simulation::new(&nodes, &edges, &[], test_config()).expect("valid graph");
        assert_eq!(sim.links[0].bias, 0.75);
    }
}
