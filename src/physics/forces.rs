//! Force kernels. Each reads the step's position snapshot and adds velocity
//! contributions into a delta buffer; none of them touches positions.

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::{Cell, QuadTree};

const COINCIDENT_EPSILON_SQ: f32 = 1e-12;
const COINCIDENT_NUDGE: f32 = 1e-3;

/// Unit direction used when two bodies coincide. Antisymmetric in its
/// arguments so the pair is pushed apart rather than together.
pub(super) fn separation_direction(from: usize, to: usize) -> Vec2 {
    let (low, high, sign) = if from <= to {
        (from, to, 1.0)
    } else {
        (to, from, -1.0)
    };
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin()) * sign
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ChargeParams {
    /// Charge strength already scaled by alpha.
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta: f32,
}

/// Velocity change of a body at `point` caused by `mass` units of charge at
/// `source`. Magnitude falls off with `1 / distance`.
fn charge_between(point: Vec2, source: Vec2, mass: f32, params: ChargeParams, fallback: Vec2) -> Vec2 {
    let mut delta = source - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq < COINCIDENT_EPSILON_SQ {
        delta = -fallback * COINCIDENT_NUDGE;
        distance_sq = delta.length_sq();
    }
    if distance_sq >= params.distance_max_sq {
        return Vec2::ZERO;
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    delta * (params.strength * mass / distance_sq)
}

/// Exact pairwise evaluation, `O(n^2)`.
pub(super) fn apply_charge_exact(positions: &[Vec2], params: ChargeParams, deltas: &mut [Vec2]) {
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let force = charge_between(
                positions[i],
                positions[j],
                1.0,
                params,
                separation_direction(i, j),
            );
            deltas[i] += force;
            deltas[j] -= force;
        }
    }
}

/// Barnes-Hut evaluation, `O(n log n)`: far cells act as one charge at their
/// center of mass.
pub(super) fn apply_charge_barnes_hut(
    tree: &QuadTree,
    positions: &[Vec2],
    params: ChargeParams,
    deltas: &mut [Vec2],
) {
    for (index, delta) in deltas.iter_mut().enumerate() {
        accumulate_charge_for_node(tree, tree.root(), index, positions, params, delta);
    }
}

fn accumulate_charge_for_node(
    tree: &QuadTree,
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    delta: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other_index in tree.members(cell) {
            if other_index == index {
                continue;
            }
            *delta += charge_between(
                point,
                positions[other_index],
                1.0,
                params,
                separation_direction(index, other_index),
            );
        }
        return;
    }

    let distance = (cell.center_of_mass - point).length().max(1e-4);
    let can_approximate = !cell.square.contains(point)
        && (cell.square.side / distance) < params.theta
        && cell.mass > 1.0;

    if can_approximate {
        *delta += charge_between(
            point,
            cell.center_of_mass,
            cell.mass,
            params,
            separation_direction(index, usize::MAX),
        );
        return;
    }

    for child in tree.children(cell) {
        accumulate_charge_for_node(tree, child, index, positions, params, delta);
    }
}

/// Resolved edge: endpoint indices plus the constants the spring needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) rest_length: f32,
    /// Share of the correction taken by the target; the better-connected
    /// endpoint moves less.
    pub(super) bias: f32,
}

pub(super) fn apply_links(
    links: &[Link],
    positions: &[Vec2],
    strength: f32,
    alpha: f32,
    deltas: &mut [Vec2],
) {
    for link in links {
        if link.source == link.target {
            continue;
        }

        let mut offset = positions[link.target] - positions[link.source];
        let mut distance = offset.length();
        if distance * distance < COINCIDENT_EPSILON_SQ {
            offset = separation_direction(link.source, link.target) * COINCIDENT_NUDGE;
            distance = COINCIDENT_NUDGE;
        }

        let stretch = (distance - link.rest_length) / distance * alpha * strength;
        let correction = offset * stretch;
        deltas[link.target] -= correction * link.bias;
        deltas[link.source] += correction * (1.0 - link.bias);
    }
}

/// Pushes apart every pair closer than the sum of their radii. Two cells are
/// skipped wholesale when their gap exceeds the sum of their largest radii.
pub(super) fn apply_collisions(
    tree: &QuadTree,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let mut pass = CollisionPass {
        tree,
        positions,
        radii,
        strength,
        deltas,
    };
    pass.within(tree.root());
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let contact = radii[from] + radii[to];
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= contact * contact {
        return;
    }

    let (direction, distance) = if distance_sq > COINCIDENT_EPSILON_SQ {
        let distance = distance_sq.sqrt();
        (delta / distance, distance)
    } else {
        (separation_direction(to, from), 0.0)
    };

    let overlap = (contact - distance) * strength;
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    deltas[from] += direction * overlap * share;
    deltas[to] -= direction * overlap * (1.0 - share);
}

struct CollisionPass<'a> {
    tree: &'a QuadTree,
    positions: &'a [Vec2],
    radii: &'a [f32],
    strength: f32,
    deltas: &'a mut [Vec2],
}

impl CollisionPass<'_> {
    fn resolve(&mut self, from: usize, to: usize) {
        resolve_overlap(from, to, self.positions, self.radii, self.strength, self.deltas);
    }

    /// Pairs with both bodies inside `cell`.
    fn within(&mut self, cell: &Cell) {
        let tree = self.tree;
        if cell.is_leaf() {
            let members = tree.members(cell);
            for (offset, &from) in members.iter().enumerate() {
                for &to in &members[offset + 1..] {
                    self.resolve(from, to);
                }
            }
            return;
        }

        for first in 0..4 {
            let Some(a) = tree.child(cell, first) else {
                continue;
            };
            self.within(a);
            for second in (first + 1)..4 {
                if let Some(b) = tree.child(cell, second) {
                    self.between(a, b);
                }
            }
        }
    }

    /// Pairs with one body in `a` and the other in `b`; the cells are disjoint.
    fn between(&mut self, a: &Cell, b: &Cell) {
        let reach = a.max_radius + b.max_radius;
        if a.square.gap_sq(b.square) >= reach * reach {
            return;
        }

        let tree = self.tree;
        match (a.is_leaf(), b.is_leaf()) {
            (true, true) => {
                for &from in tree.members(a) {
                    for &to in tree.members(b) {
                        self.resolve(from, to);
                    }
                }
            }
            (false, true) => tree.children(a).for_each(|child| self.between(child, b)),
            (true, false) => tree.children(b).for_each(|child| self.between(a, child)),
            (false, false) if a.square.side >= b.square.side => {
                tree.children(a).for_each(|child| self.between(child, b));
            }
            (false, false) => tree.children(b).for_each(|child| self.between(a, child)),
        }
    }
}

/// Independent pulls toward a fixed x and a fixed y.
pub(super) fn apply_axis(positions: &[Vec2], target: Vec2, strength: f32, deltas: &mut [Vec2]) {
    for (position, delta) in positions.iter().zip(deltas.iter_mut()) {
        *delta += (target - *position) * strength;
    }
}
