use std::collections::{HashMap, HashSet};

use super::Edge;

/// Opposite endpoints of every edge touching `node_id`, by linear scan.
/// A node is never its own neighbor, even on a self-loop.
pub fn neighbors_of<'a>(node_id: &str, edges: &'a [Edge]) -> HashSet<&'a str> {
    edges
        .iter()
        .filter_map(|edge| {
            if edge.source == node_id {
                Some(edge.target.as_str())
            } else if edge.target == node_id {
                Some(edge.source.as_str())
            } else {
                None
            }
        })
        .filter(|neighbor| *neighbor != node_id)
        .collect()
}

/// Prebuilt adjacency for repeated lookups (hover highlighting). Rebuilt with
/// the edge set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NeighborIndex {
    adjacency: HashMap<String, Vec<String>>,
}

impl NeighborIndex {
    pub fn new(edges: &[Edge]) -> Self {
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for edge in edges {
            if edge.source == edge.target {
                continue;
            }
            adjacency
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
            adjacency
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
        }

        for neighbors in adjacency.values_mut() {
            neighbors.sort();
            neighbors.dedup();
        }

        Self { adjacency }
    }

    pub fn neighbors(&self, node_id: &str) -> &[String] {
        self.adjacency
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn neighbors_of(&self, node_id: &str) -> HashSet<&str> {
        self.neighbors(node_id).iter().map(String::as_str).collect()
    }

    pub fn degree(&self, node_id: &str) -> usize {
        self.neighbors(node_id).len()
    }
}
