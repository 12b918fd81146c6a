//! Visibility toggles. Every function returns a fresh collection.

use kubesonde_core::{Connection, Graph, GraphNode, SimpleGraphEdge};

/// Hides edges whose port is listed and reveals every other edge that is
/// not a denied connection.
pub fn hide_ports(edges: &[SimpleGraphEdge], ports: &[String]) -> Vec<SimpleGraphEdge> {
    edges
        .iter()
        .map(|edge| {
            if ports.contains(&edge.port) {
                edge.with_hidden(true)
            } else if !edge.denied_connection {
                edge.with_hidden(false)
            } else {
                edge.clone()
            }
        })
        .collect()
}

fn set_pod_hidden(nodes: &[GraphNode], pod: &str, hidden: bool) -> Vec<GraphNode> {
    nodes
        .iter()
        .map(|node| {
            if node.name == pod {
                GraphNode {
                    hidden,
                    ..node.clone()
                }
            } else {
                node.clone()
            }
        })
        .collect()
}

pub fn hide_pod(nodes: &[GraphNode], pod: &str) -> Vec<GraphNode> {
    set_pod_hidden(nodes, pod, true)
}

pub fn show_pod(nodes: &[GraphNode], pod: &str) -> Vec<GraphNode> {
    set_pod_hidden(nodes, pod, false)
}

pub fn hide_edges_within_pod<E: Connection>(edges: &[E], pod: &str) -> Vec<E> {
    edges
        .iter()
        .map(|e| if e.touches(pod) { e.with_hidden(true) } else { e.clone() })
        .collect()
}

/// Denied connections stay hidden.
pub fn show_edges_within_pod<E: Connection>(edges: &[E], pod: &str) -> Vec<E> {
    edges
        .iter()
        .map(|e| {
            if e.touches(pod) && !e.is_denied() {
                e.with_hidden(false)
            } else {
                e.clone()
            }
        })
        .collect()
}

/// Shows or hides a table row. A row naming a node group matches on the
/// group; any other row addresses its pods by id.
pub fn set_deployment_enabled(
    nodes: &[GraphNode],
    group: &str,
    pods: &[String],
    enabled: bool,
) -> Vec<GraphNode> {
    let ungrouped = !nodes.iter().any(|n| n.group.as_deref() == Some(group));
    nodes
        .iter()
        .map(|node| {
            let member = if ungrouped {
                pods.contains(&node.id)
            } else {
                node.group.as_deref() == Some(group)
            };
            if member {
                GraphNode {
                    hidden: !enabled,
                    ..node.clone()
                }
            } else {
                node.clone()
            }
        })
        .collect()
}

/// Clears every hidden flag, denied edges included.
pub fn reset_all<E: Connection>(graph: &Graph<E>) -> Graph<E> {
    Graph {
        nodes: graph
            .nodes
            .iter()
            .map(|n| GraphNode {
                hidden: false,
                ..n.clone()
            })
            .collect(),
        edges: graph.edges.iter().map(|e| e.with_hidden(false)).collect(),
    }
}
