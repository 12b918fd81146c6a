//! Connectivity metrics over the visible part of a graph.

use kubesonde_core::{Connection, Graph, MetricsReport};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Strongly connected components and average out-degree of the visible
/// nodes. Edges touching a hidden or unknown node are ignored; parallel
/// edges each count towards the out-degree.
pub fn compute_metrics<E: Connection>(graph: &Graph<E>) -> MetricsReport {
    let mut dg: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for node in graph.nodes.iter().filter(|n| !n.hidden) {
        if !index.contains_key(node.id.as_str()) {
            index.insert(node.id.as_str(), dg.add_node(node.id.as_str()));
        }
    }

    let mut out_edges = 0usize;
    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (index.get(edge.source()), index.get(edge.target())) {
            dg.add_edge(from, to, ());
            out_edges += 1;
        }
    }

    let components = tarjan_scc(&dg)
        .into_iter()
        .map(|scc| scc.iter().map(|&i| dg[i].to_string()).collect())
        .collect();

    let average_out_degree = if index.is_empty() {
        f64::NAN
    } else {
        out_edges as f64 / index.len() as f64
    };

    tracing::debug!(
        nodes = index.len(),
        edges = out_edges,
        "computed graph metrics"
    );

    MetricsReport {
        strongly_connected_components: components,
        average_out_degree,
    }
}
