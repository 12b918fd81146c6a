//! Folding parallel edges between the same ordered pair into one edge.

use kubesonde_core::{GraphEdge, SimpleGraphEdge};
use std::collections::{HashMap, HashSet};

/// Accumulates merged edges in first-seen order. Only visible edges are
/// registered as merge targets, so a hidden edge never absorbs another.
#[derive(Default)]
struct MergeAcc {
    edges: Vec<GraphEdge>,
    open: HashMap<(String, String), usize>,
}

impl MergeAcc {
    fn target(&self, from: &str, to: &str) -> Option<usize> {
        self.open.get(&(from.to_string(), to.to_string())).copied()
    }

    fn push_standalone(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    fn push_open(&mut self, edge: GraphEdge) {
        self.open
            .insert((edge.from.clone(), edge.to.clone()), self.edges.len());
        self.edges.push(edge);
    }

    fn finish(self) -> Vec<GraphEdge> {
        self.edges.into_iter().map(finalize).collect()
    }
}

fn dedup_ports(ports: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ports.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

fn finalize(edge: GraphEdge) -> GraphEdge {
    let ports = dedup_ports(edge.ports);
    GraphEdge {
        label: ports.join(", "),
        ports,
        ..edge
    }
}

/// Merges already-merged edges again, e.g. after clustering rewrote their
/// endpoints. Self-loops are dropped; hidden edges are kept as they are.
pub fn merge_edges(edges: &[GraphEdge]) -> Vec<GraphEdge> {
    let mut acc = MergeAcc::default();
    for edge in edges {
        if edge.from == edge.to {
            continue;
        }
        if edge.hidden {
            acc.push_standalone(edge.clone());
            continue;
        }
        match acc.target(&edge.from, &edge.to) {
            Some(slot) => {
                let merged = &mut acc.edges[slot];
                if merged.label == edge.label {
                    continue;
                }
                merged.ports.extend(edge.ports.iter().cloned());
            }
            None => acc.push_open(edge.clone()),
        }
    }
    acc.finish()
}

/// Merges single-port edges. Hidden edges are dropped unless they are denied
/// connections, which stay as standalone entries.
pub fn merge_simple_edges(edges: &[SimpleGraphEdge]) -> Vec<GraphEdge> {
    let mut acc = MergeAcc::default();
    for edge in edges {
        if edge.hidden && !edge.denied_connection {
            continue;
        }
        if edge.from == edge.to {
            continue;
        }
        if edge.hidden {
            acc.push_standalone(GraphEdge::from(edge.clone()));
            continue;
        }
        match acc.target(&edge.from, &edge.to) {
            Some(slot) => {
                let merged = &mut acc.edges[slot];
                if !merged.ports.contains(&edge.port) {
                    merged.ports.push(edge.port.clone());
                }
            }
            None => acc.push_open(GraphEdge::from(edge.clone())),
        }
    }
    acc.finish()
}
