//! Collapsing pods into their deployments, fully or for selected groups.

use kubesonde_core::{Graph, GraphEdge, GraphNode, NodeShape};
use std::collections::{HashMap, HashSet};

use crate::merge::merge_edges;

/// Distinct deployment names in first-seen order.
pub fn deployments(nodes: &[GraphNode]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for deployment in nodes.iter().filter_map(|n| n.deployment.as_deref()) {
        if seen.insert(deployment) {
            out.push(deployment.to_string());
        }
    }
    out
}

pub fn cluster_node(node: &GraphNode) -> GraphNode {
    match &node.deployment {
        Some(deployment) => GraphNode {
            id: deployment.clone(),
            label: deployment.clone(),
            shape: Some(NodeShape::Square),
            ..node.clone()
        },
        None => GraphNode {
            shape: Some(NodeShape::Ellipse),
            ..node.clone()
        },
    }
}

pub fn cluster_edge(edge: &GraphEdge) -> GraphEdge {
    GraphEdge {
        from: edge.from_deployment.clone().unwrap_or_else(|| edge.from.clone()),
        to: edge.to_deployment.clone().unwrap_or_else(|| edge.to.clone()),
        ..edge.clone()
    }
}

fn join_titles(first: Option<String>, next: Option<&str>) -> Option<String> {
    let first = first.filter(|t| !t.is_empty());
    let next = next.filter(|t| !t.is_empty());
    match (first, next) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b.to_string()),
        (Some(a), Some(b)) => Some(format!("{a}\n{b}")),
    }
}

/// One node per id. The first occurrence keeps its fields; titles of later
/// duplicates are appended line by line.
pub fn unique_nodes(nodes: &[GraphNode]) -> Vec<GraphNode> {
    let mut out: Vec<GraphNode> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for node in nodes {
        match index.get(&node.id) {
            Some(&slot) => {
                let title = out[slot].title.take();
                out[slot].title = join_titles(title, node.title.as_deref());
            }
            None => {
                index.insert(node.id.clone(), out.len());
                out.push(node.clone());
            }
        }
    }
    out
}

/// Collapses every deployment into a single square node.
pub fn cluster_all(graph: &Graph) -> Graph {
    let nodes: Vec<GraphNode> = graph.nodes.iter().map(cluster_node).collect();
    let edges: Vec<GraphEdge> = graph.edges.iter().map(cluster_edge).collect();
    Graph {
        nodes: unique_nodes(&nodes),
        edges: merge_edges(&edges),
    }
}

/// Collapses only the deployments listed in `groups`; pods of every other
/// group stay individual nodes.
pub fn cluster_selected(graph: &Graph, groups: &[String]) -> Graph {
    let selected: HashSet<&str> = groups.iter().map(String::as_str).collect();
    let in_selected = |node: &GraphNode| {
        node.group.as_deref().is_some_and(|g| selected.contains(g))
    };

    let kept: Vec<GraphNode> = graph
        .nodes
        .iter()
        .filter(|n| !in_selected(*n))
        .cloned()
        .collect();

    let mut clustered: Vec<GraphNode> = Vec::new();
    let mut clustered_ids: HashSet<String> = HashSet::new();
    for node in graph.nodes.iter().filter(|n| in_selected(*n)) {
        let id = node.deployment.clone().unwrap_or_else(|| node.id.clone());
        if !clustered_ids.insert(id.clone()) {
            continue;
        }
        clustered.push(GraphNode {
            label: node.deployment.clone().unwrap_or_else(|| node.label.clone()),
            id,
            shape: Some(NodeShape::Square),
            ..node.clone()
        });
    }

    let kept_ids: HashSet<&str> = kept.iter().map(|n| n.id.as_str()).collect();
    let resolve = |id: &str, deployment: &Option<String>| -> String {
        if kept_ids.contains(id) {
            id.to_string()
        } else {
            deployment.clone().unwrap_or_else(|| id.to_string())
        }
    };
    let edges: Vec<GraphEdge> = graph
        .edges
        .iter()
        .map(|e| GraphEdge {
            from: resolve(e.from.as_str(), &e.from_deployment),
            to: resolve(e.to.as_str(), &e.to_deployment),
            ..e.clone()
        })
        .filter(|e| e.from != e.to)
        .collect();

    let mut nodes = kept;
    nodes.extend(clustered);
    Graph {
        nodes,
        edges: merge_edges(&edges),
    }
}
