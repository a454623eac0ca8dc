use std::collections::HashMap;

use crate::data::{DataSet, RelationshipRecord, RepositoryRecord, UserRecord};
use crate::error::GraphError;

use super::{BuildReport, Edge, Graph, Node, NodeKind};

/// Builds the layout graph. Repositories come first, then users; edges keep
/// relationship order. Nothing is sorted.
pub fn build(
    repositories: Option<&[RepositoryRecord]>,
    users: Option<&[UserRecord]>,
    relationships: Option<&[RelationshipRecord]>,
) -> Result<Graph, GraphError> {
    let repositories = repositories.ok_or_else(|| GraphError::incomplete("repositories missing"))?;
    let users = users.ok_or_else(|| GraphError::incomplete("users missing"))?;
    let relationships =
        relationships.ok_or_else(|| GraphError::incomplete("relationships missing"))?;

    let mut report = BuildReport::default();
    let mut nodes = Vec::with_capacity(repositories.len() + users.len());
    let mut index_by_id = HashMap::with_capacity(repositories.len() + users.len());

    let mut usable_repositories = 0usize;
    for record in repositories {
        if record.name.trim().is_empty() {
            report.malformed_records += 1;
            continue;
        }
        usable_repositories += 1;

        push_node(
            &mut nodes,
            &mut index_by_id,
            &mut report,
            Node {
                id: record.name.clone(),
                kind: NodeKind::Repository,
                weight: record.commit_count,
                label: record.name.clone(),
                commit_reference: None,
            },
        );
    }
    ensure_usable("repositories", repositories.len(), usable_repositories)?;

    let mut usable_users = 0usize;
    for record in users {
        if record.hashed_email.is_empty() || record.name.is_empty() {
            report.malformed_records += 1;
            continue;
        }
        usable_users += 1;

        push_node(
            &mut nodes,
            &mut index_by_id,
            &mut report,
            Node {
                id: record.id(),
                kind: NodeKind::User,
                weight: record.commit_count,
                label: record.name.clone(),
                commit_reference: record.any_commit_reference.clone(),
            },
        );
    }
    ensure_usable("users", users.len(), usable_users)?;

    let mut edges = Vec::with_capacity(relationships.len());
    let mut usable_relationships = 0usize;
    for record in relationships {
        if record.repository_id.trim().is_empty()
            || record.user_hashed_email.is_empty()
            || record.user_name.is_empty()
        {
            report.malformed_records += 1;
            continue;
        }
        usable_relationships += 1;

        let user_id = record.user_id();
        if !index_by_id.contains_key(&record.repository_id) || !index_by_id.contains_key(&user_id)
        {
            report.dropped_relationships += 1;
            continue;
        }

        edges.push(Edge {
            source: record.repository_id.clone(),
            target: user_id,
            weight: record.commit_count,
        });
    }
    ensure_usable("relationships", relationships.len(), usable_relationships)?;

    if report.total_dropped() > 0 {
        tracing::warn!(
            dropped_relationships = report.dropped_relationships,
            malformed_records = report.malformed_records,
            duplicate_nodes = report.duplicate_nodes,
            "excluded records while building graph"
        );
    }
    tracing::debug!(nodes = nodes.len(), edges = edges.len(), "built graph");

    Ok(Graph::new(nodes, edges, report))
}

pub fn build_from(data: &DataSet) -> Result<Graph, GraphError> {
    build(
        Some(&data.repositories),
        Some(&data.users),
        Some(&data.relationships),
    )
}

fn push_node(
    nodes: &mut Vec<Node>,
    index_by_id: &mut HashMap<String, usize>,
    report: &mut BuildReport,
    node: Node,
) {
    if index_by_id.contains_key(&node.id) {
        report.duplicate_nodes += 1;
        return;
    }
    index_by_id.insert(node.id.clone(), nodes.len());
    nodes.push(node);
}

fn ensure_usable(what: &str, total: usize, usable: usize) -> Result<(), GraphError> {
    if total > 0 && usable == 0 {
        return Err(GraphError::incomplete(format!(
            "all {total} {what} records are malformed"
        )));
    }
    Ok(())
}
