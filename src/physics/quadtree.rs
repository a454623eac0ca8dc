//! Arena quadtree over one step's position snapshot.
//!
//! Cells live in a flat `Vec` and refer to their children by index. Bodies are
//! permuted so that every cell owns a contiguous run of `order`; a cell's
//! members are simply `order[first..last]`. Each cell also carries what the
//! force kernels prune on: body count and center of mass for charge, and the
//! largest collision radius below it for contacts.

use std::ops::Range;

use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;
/// Padding around the outermost bodies so none sits on the root's edge.
const ROOT_PADDING: f32 = 1.0;

/// Axis-aligned square: lower corner plus side length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Square {
    pub(super) min: Vec2,
    pub(super) side: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (lo, hi) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), point| (lo.min(*point), hi.max(*point)),
        );
        if !(lo.x.is_finite() && lo.y.is_finite() && hi.x.is_finite() && hi.y.is_finite()) {
            return None;
        }

        let span = (hi - lo).max_elem().max(1.0);
        Some(Self {
            min: lo - Vec2::splat(ROOT_PADDING),
            side: span + 2.0 * ROOT_PADDING,
        })
    }

    fn max(self) -> Vec2 {
        self.min + Vec2::splat(self.side)
    }

    fn middle(self) -> Vec2 {
        self.min + Vec2::splat(self.side * 0.5)
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let max = self.max();
        (self.min.x..=max.x).contains(&point.x) && (self.min.y..=max.y).contains(&point.y)
    }

    /// Quadrants are numbered `x_bit | y_bit << 1`, low halves first.
    fn quadrant_of(self, point: Vec2) -> usize {
        let middle = self.middle();
        usize::from(point.x >= middle.x) | (usize::from(point.y >= middle.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        let step = vec2((quadrant & 1) as f32, (quadrant >> 1) as f32);
        Self {
            min: self.min + step * half,
            side: half,
        }
    }

    /// Squared distance between the closest points of two squares; zero
    /// when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let gap = (self.min.max(other.min) - self.max().min(other.max())).max(Vec2::ZERO);
        gap.length_sq()
    }
}

#[derive(Clone, Debug)]
pub(super) struct Cell {
    pub(super) square: Square,
    /// Bodies below this cell, each counting as one unit of charge.
    pub(super) mass: f32,
    pub(super) center_of_mass: Vec2,
    /// Largest collision radius of any body below this cell.
    pub(super) max_radius: f32,
    members: Range<usize>,
    children: [Option<usize>; 4],
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

#[derive(Clone, Debug)]
pub(super) struct QuadTree {
    cells: Vec<Cell>,
    order: Vec<usize>,
}

impl QuadTree {
    /// `None` when there are no bodies or any position is not finite.
    /// `radii` is indexed like `positions`; missing entries count as zero.
    pub(super) fn build(positions: &[Vec2], radii: &[f32]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let mut tree = Self {
            cells: Vec::with_capacity(positions.len() / 2 + 1),
            order: (0..positions.len()).collect(),
        };
        tree.split(square, 0..positions.len(), positions, radii, 0);
        Some(tree)
    }

    pub(super) fn root(&self) -> &Cell {
        &self.cells[0]
    }

    pub(super) fn children<'a>(&'a self, cell: &'a Cell) -> impl Iterator<Item = &'a Cell> + 'a {
        cell.children.iter().flatten().map(|&child| &self.cells[child])
    }

    pub(super) fn child(&self, cell: &Cell, quadrant: usize) -> Option<&Cell> {
        cell.children[quadrant].map(|child| &self.cells[child])
    }

    /// Body indices below `cell`.
    pub(super) fn members(&self, cell: &Cell) -> &[usize] {
        &self.order[cell.members.clone()]
    }

    fn split(
        &mut self,
        square: Square,
        members: Range<usize>,
        positions: &[Vec2],
        radii: &[f32],
        depth: usize,
    ) -> usize {
        let bodies = &mut self.order[members.clone()];
        let mass = bodies.len() as f32;
        let center_of_mass =
            bodies.iter().fold(Vec2::ZERO, |sum, &index| sum + positions[index]) / mass.max(1.0);
        let max_radius = bodies
            .iter()
            .map(|&index| radii.get(index).copied().unwrap_or(0.0))
            .fold(0.0_f32, f32::max);

        let mut counts = [0usize; 4];
        for &index in bodies.iter() {
            counts[square.quadrant_of(positions[index])] += 1;
        }
        let occupied = counts.iter().filter(|count| **count > 0).count();
        // A single occupied quadrant means the bodies coincide at this scale.
        let subdivide = depth < MAX_DEPTH && bodies.len() > LEAF_CAPACITY && occupied > 1;
        if subdivide {
            bodies.sort_by_key(|&index| square.quadrant_of(positions[index]));
        }

        let id = self.cells.len();
        self.cells.push(Cell {
            square,
            mass,
            center_of_mass,
            max_radius,
            members: members.clone(),
            children: [None; 4],
        });
        if !subdivide {
            return id;
        }

        let mut start = members.start;
        for (quadrant, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let child = self.split(
                square.quadrant(quadrant),
                start..start + count,
                positions,
                radii,
                depth + 1,
            );
            self.cells[id].children[quadrant] = Some(child);
            start += count;
        }
        id
    }
}
