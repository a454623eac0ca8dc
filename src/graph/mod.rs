mod build;
mod neighbors;

use std::collections::{HashMap, HashSet};

pub use build::{build, build_from};
pub use neighbors::{NeighborIndex, neighbors_of};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Repository,
    User,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::User => "user",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Commit count of the repository or user.
    pub weight: u64,
    /// Display name: the repository name, or the user's name without the email hash.
    pub label: String,
    /// Opaque commit handle for users, resolved to a profile link on activation.
    pub commit_reference: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// What the builder left out, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Relationships whose repository or user is not in the node set.
    pub dropped_relationships: usize,
    /// Records without a usable identity.
    pub malformed_records: usize,
    /// Records whose id was already taken by an earlier node.
    pub duplicate_nodes: usize,
}

impl BuildReport {
    pub fn total_dropped(&self) -> usize {
        self.dropped_relationships + self.malformed_records + self.duplicate_nodes
    }
}

/// Nodes and edges ready for layout. Every edge endpoint is a node id.
#[derive(Clone, Debug, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
    neighbors: NeighborIndex,
    commit_distribution: Vec<u64>,
    report: BuildReport,
}

impl Graph {
    fn new(nodes: Vec<Node>, edges: Vec<Edge>, report: BuildReport) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        let neighbors = NeighborIndex::new(&edges);
        let mut commit_distribution = edges.iter().map(|edge| edge.weight).collect::<Vec<_>>();
        commit_distribution.sort_unstable();

        Self {
            nodes,
            edges,
            index_by_id,
            neighbors,
            commit_distribution,
            report,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn report(&self) -> BuildReport {
        self.report
    }

    /// Ascending edge weights; the reference population for scaling.
    pub fn commit_distribution(&self) -> &[u64] {
        &self.commit_distribution
    }

    pub fn commit_population(&self) -> Vec<f64> {
        self.commit_distribution
            .iter()
            .map(|count| *count as f64)
            .collect()
    }

    pub fn neighbors(&self, id: &str) -> HashSet<&str> {
        self.neighbors.neighbors_of(id)
    }

    pub fn neighbor_index(&self) -> &NeighborIndex {
        &self.neighbors
    }
}
