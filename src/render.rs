//! Renderer seam. The core hands plain views to a [`Renderer`]; it never
//! draws anything itself.

use std::collections::HashSet;

use eframe::egui::Vec2;

use crate::graph::{Graph, NodeKind};
use crate::physics::Snapshot;
use crate::style::GraphStyle;
use crate::util::sanitize_id;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeView<'a> {
    pub id: &'a str,
    /// Selector-safe key, stable across frames.
    pub key: &'a str,
    pub kind: NodeKind,
    pub label: &'a str,
    pub weight: u64,
    pub position: Vec2,
    pub radius: f32,
    /// Fill to draw with; already swapped for the highlight colour when
    /// `highlighted` is set.
    pub fill: &'a str,
    pub stroke: &'a str,
    pub highlighted: bool,
    pub dimmed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub opacity: f32,
    pub stroke: &'a str,
    pub highlighted: bool,
}

pub trait Renderer {
    fn render(&mut self, nodes: &[NodeView<'_>], edges: &[EdgeView<'_>]);
}

/// What the host wants emphasised in a frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct Emphasis<'a> {
    /// Hovered node; it and its neighbours are highlighted.
    pub focus: Option<&'a str>,
    /// Search hits; every other node is dimmed. `None` dims nothing.
    pub matches: Option<&'a HashSet<String>>,
}

/// A graph with its computed styles, ready to be joined with snapshots.
#[derive(Clone, Debug)]
pub struct Scene {
    graph: Graph,
    style: GraphStyle,
    keys: Vec<String>,
}

impl Scene {
    pub fn new(graph: Graph, style: GraphStyle) -> Self {
        let keys = graph.nodes().iter().map(|node| sanitize_id(&node.id)).collect();
        Self { graph, style, keys }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn style(&self) -> &GraphStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: GraphStyle) {
        self.style = style;
    }

    pub fn views<'a>(
        &'a self,
        snapshot: &Snapshot,
        emphasis: Emphasis<'_>,
    ) -> (Vec<NodeView<'a>>, Vec<EdgeView<'a>>) {
        let positions = self.positions(snapshot);
        let highlighted = emphasis
            .focus
            .filter(|focus| self.graph.node(focus).is_some())
            .map(|focus| {
                let mut set = self
                    .graph
                    .neighbor_index()
                    .neighbors(focus)
                    .iter()
                    .map(String::as_str)
                    .collect::<HashSet<_>>();
                if let Some(node) = self.graph.node(focus) {
                    set.insert(node.id.as_str());
                }
                set
            })
            .unwrap_or_default();

        let nodes = self
            .graph
            .nodes()
            .iter()
            .zip(&self.style.nodes)
            .zip(&self.keys)
            .zip(&positions)
            .map(|(((node, style), key), position)| {
                let is_highlighted = highlighted.contains(node.id.as_str());
                NodeView {
                    id: &node.id,
                    key: key.as_str(),
                    kind: node.kind,
                    label: &node.label,
                    weight: node.weight,
                    position: *position,
                    radius: style.radius,
                    fill: if is_highlighted {
                        style.highlight.as_str()
                    } else {
                        style.fill.as_str()
                    },
                    stroke: &style.stroke,
                    highlighted: is_highlighted,
                    dimmed: emphasis
                        .matches
                        .is_some_and(|matches| !matches.contains(&node.id)),
                }
            })
            .collect();

        let focus = emphasis.focus;
        let edges = self
            .graph
            .edges()
            .iter()
            .zip(&self.style.edges)
            .filter_map(|(edge, style)| {
                let from = positions[self.graph.index_of(&edge.source)?];
                let to = positions[self.graph.index_of(&edge.target)?];
                Some(EdgeView {
                    source: &edge.source,
                    target: &edge.target,
                    from,
                    to,
                    width: style.width,
                    opacity: style.opacity,
                    stroke: &style.stroke,
                    highlighted: focus
                        .is_some_and(|focus| focus == edge.source || focus == edge.target),
                })
            })
            .collect();

        (nodes, edges)
    }

    pub fn render(&self, renderer: &mut dyn Renderer, snapshot: &Snapshot, emphasis: Emphasis<'_>) {
        let (nodes, edges) = self.views(snapshot, emphasis);
        renderer.render(&nodes, &edges);
    }

    /// Positions in graph node order. Snapshots from a simulation built on
    /// this graph line up by index; anything else is matched by id.
    fn positions(&self, snapshot: &Snapshot) -> Vec<Vec2> {
        let aligned = snapshot.ids.len() == self.graph.node_count()
            && snapshot
                .ids
                .iter()
                .zip(self.graph.nodes())
                .all(|(id, node)| *id == node.id);
        if aligned {
            return snapshot.positions.clone();
        }

        self.graph
            .nodes()
            .iter()
            .map(|node| snapshot.position_of(&node.id).unwrap_or(Vec2::ZERO))
            .collect()
    }
}
