//! Visual attributes derived from commit counts.

use serde::{Deserialize, Serialize};

use crate::graph::{Edge, Graph, Node, NodeKind};
use crate::scale::LogPowerScale;

/// Inclusive output range of one scaled attribute. `max` is what the
/// population maximum maps to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub max: f64,
    pub min: f64,
}

impl Range {
    pub const fn new(max: f64, min: f64) -> Self {
        Self { max, min }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub repository_radius: Range,
    pub user_radius: Range,
    /// Radius of nodes without any commits.
    pub empty_radius: f64,
    pub edge_width: Range,
    pub edge_opacity: Range,
    pub repository_fill: String,
    pub user_fill: String,
    pub repository_highlight: String,
    pub user_highlight: String,
    pub node_stroke: String,
    pub edge_stroke: String,
    /// Cap outliers at the upper quartile fence before scaling.
    pub suppress_strays: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            repository_radius: Range::new(15.0, 4.0),
            user_radius: Range::new(6.0, 3.0),
            empty_radius: 3.0,
            edge_width: Range::new(4.0, 2.0),
            edge_opacity: Range::new(1.0, 0.3),
            repository_fill: "#00BCD4".to_owned(),
            user_fill: "#FF9800".to_owned(),
            repository_highlight: "#3de8ff".to_owned(),
            user_highlight: "#ffca7a".to_owned(),
            node_stroke: "#333".to_owned(),
            edge_stroke: "#000".to_owned(),
            suppress_strays: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
    pub radius: f32,
    pub fill: String,
    pub highlight: String,
    pub stroke: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
    pub width: f32,
    pub opacity: f32,
    pub stroke: String,
}

/// Styles for a whole graph, in node and edge order.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphStyle {
    pub nodes: Vec<NodeStyle>,
    pub edges: Vec<EdgeStyle>,
}

impl GraphStyle {
    pub fn compute(graph: &Graph, config: &StyleConfig) -> Self {
        let scale = config.scale_for(&graph.commit_population());
        Self {
            nodes: graph
                .nodes()
                .iter()
                .map(|node| node_style(&scale, node, config))
                .collect(),
            edges: graph
                .edges()
                .iter()
                .map(|edge| edge_style(&scale, edge, config))
                .collect(),
        }
    }

    /// Visual radii in node order, as the simulation expects them.
    pub fn radii(&self) -> Vec<f32> {
        self.nodes.iter().map(|style| style.radius).collect()
    }
}

impl StyleConfig {
    pub fn scale_for(&self, population: &[f64]) -> LogPowerScale {
        if self.suppress_strays {
            LogPowerScale::with_stray_suppression(population)
        } else {
            LogPowerScale::new(population)
        }
    }
}

pub fn node_style(scale: &LogPowerScale, node: &Node, config: &StyleConfig) -> NodeStyle {
    let (range, fill, highlight) = match node.kind {
        NodeKind::Repository => (
            config.repository_radius,
            &config.repository_fill,
            &config.repository_highlight,
        ),
        NodeKind::User => (config.user_radius, &config.user_fill, &config.user_highlight),
    };

    let radius = if node.weight == 0 {
        config.empty_radius
    } else {
        scale.map(node.weight as f64, range.max, range.min)
    };

    NodeStyle {
        radius: radius as f32,
        fill: fill.clone(),
        highlight: highlight.clone(),
        stroke: config.node_stroke.clone(),
    }
}

pub fn edge_style(scale: &LogPowerScale, edge: &Edge, config: &StyleConfig) -> EdgeStyle {
    let weight = edge.weight as f64;
    EdgeStyle {
        width: scale.map(weight, config.edge_width.max, config.edge_width.min) as f32,
        opacity: scale.map(weight, config.edge_opacity.max, config.edge_opacity.min) as f32,
        stroke: config.edge_stroke.clone(),
    }
}

/// Parses `#rgb` or `#rrggbb`.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }
    match digits.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (channel, digit) in rgb.iter_mut().zip(digits.chars()) {
                let value = digit.to_digit(16)? as u8;
                *channel = value * 17;
            }
            Some(rgb)
        }
        6 => {
            let mut rgb = [0u8; 3];
            for (index, channel) in rgb.iter_mut().enumerate() {
                *channel = u8::from_str_radix(&digits[index * 2..index * 2 + 2], 16).ok()?;
            }
            Some(rgb)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataSet, RelationshipRecord, RepositoryRecord, UserRecord};
    use crate::graph::build_from;

    fn graph() -> Graph {
        let data = DataSet {
            repositories: vec![
                RepositoryRecord {
                    name: "octo/big".to_owned(),
                    commit_count: 400,
                },
                RepositoryRecord {
                    name: "octo/empty".to_owned(),
                    commit_count: 0,
                },
            ],
            users: vec![UserRecord {
                hashed_email: "h1".to_owned(),
                name: "ada".to_owned(),
                commit_count: 400,
                any_commit_reference: None,
            }],
            relationships: vec![RelationshipRecord {
                repository_id: "octo/big".to_owned(),
                user_hashed_email: "h1".to_owned(),
                user_name: "ada".to_owned(),
                commit_count: 400,
            }],
        };
        build_from(&data).expect("complete data")
    }

    #[test]
    fn population_maximum_gets_the_largest_attributes() {
        let graph = graph();
        let style = GraphStyle::compute(&graph, &StyleConfig::default());
        assert_eq!(style.nodes[0].radius, 15.0);
        assert_eq!(style.nodes[0].fill, "#00BCD4");
        assert_eq!(style.edges[0].width, 4.0);
        assert_eq!(style.edges[0].opacity, 1.0);
    }

    #[test]
    fn empty_node_uses_fixed_radius() {
        let graph = graph();
        let style = GraphStyle::compute(&graph, &StyleConfig::default());
        let empty = graph.index_of("octo/empty").expect("empty repo");
        assert_eq!(style.nodes[empty].radius, 3.0);
    }

    #[test]
    fn user_nodes_use_their_own_range_and_colours() {
        let graph = graph();
        let style = GraphStyle::compute(&graph, &StyleConfig::default());
        let user = graph
            .nodes()
            .iter()
            .position(|node| node.kind == NodeKind::User)
            .expect("user node");
        assert_eq!(style.nodes[user].radius, 6.0);
        assert_eq!(style.nodes[user].fill, "#FF9800");
        assert_eq!(style.nodes[user].highlight, "#ffca7a");
        assert_eq!(style.radii().len(), graph.node_count());
    }

    #[test]
    fn small_weights_map_near_the_minimum() {
        let scale = LogPowerScale::new(&[2.0, 5_000.0]);
        let node = Node {
            id: "x".to_owned(),
            kind: NodeKind::Repository,
            weight: 2,
            label: "x".to_owned(),
            commit_reference: None,
        };
        let radius = node_style(&scale, &node, &StyleConfig::default()).radius;
        assert!((4.0..5.0).contains(&radius), "radius {radius}");
    }

    #[test]
    fn hex_colours_parse() {
        assert_eq!(parse_hex_color("#00BCD4"), Some([0x00, 0xbc, 0xd4]));
        assert_eq!(parse_hex_color("#333"), Some([0x33, 0x33, 0x33]));
        assert_eq!(parse_hex_color("00BCD4"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }
}
