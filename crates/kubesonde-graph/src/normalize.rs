//! Probe snapshot → canonical nodes and single-port edges.

use kubesonde_core::{
    CanonicalGraph, GraphNode, ProbeEndpoint, ProbeErrorInfo, ProbeOutput, ProbeOutputItem,
    SimpleGraphEdge,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Endpoint name → owning deployment, learned from a full scan of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMap(HashMap<String, String>);

impl GroupMap {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn learn(&mut self, endpoint: &ProbeEndpoint) {
        if let Some(deployment) = endpoint.deployment() {
            self.0.insert(endpoint.name.clone(), deployment.to_string());
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }
}

fn all_records(output: &ProbeOutput) -> impl Iterator<Item = &ProbeOutputItem> {
    output
        .items
        .iter()
        .chain(output.errors.iter().map(|e| &e.value))
}

pub fn build_group_map(output: &ProbeOutput) -> GroupMap {
    let mut map = GroupMap::default();
    for record in all_records(output) {
        map.learn(&record.source);
        map.learn(&record.destination);
    }
    map
}

#[derive(Serialize)]
struct EndpointSummary<'a> {
    name: &'a str,
    namespace: &'a str,
}

fn endpoint_title(endpoint: &ProbeEndpoint) -> Option<String> {
    serde_json::to_string_pretty(&EndpointSummary {
        name: &endpoint.name,
        namespace: &endpoint.namespace,
    })
    .ok()
}

fn to_node(groups: &GroupMap, endpoint: &ProbeEndpoint) -> GraphNode {
    let deployment = groups.lookup(&endpoint.name);
    GraphNode {
        id: endpoint.name.clone(),
        name: endpoint.name.clone(),
        label: endpoint.name.clone(),
        kind: Some(endpoint.kind.as_str().to_string()),
        group: deployment.clone(),
        deployment,
        title: endpoint_title(endpoint),
        hidden: false,
        shape: None,
        color: None,
    }
}

/// Every endpoint of every record, deduplicated by full field equality.
pub fn build_nodes(output: &ProbeOutput, groups: &GroupMap) -> Vec<GraphNode> {
    let mut seen: HashSet<GraphNode> = HashSet::new();
    let mut nodes = Vec::new();
    for record in all_records(output) {
        for endpoint in [&record.source, &record.destination] {
            if endpoint.name.is_empty() {
                continue;
            }
            let node = to_node(groups, endpoint);
            if seen.insert(node.clone()) {
                nodes.push(node);
            }
        }
    }
    nodes
}

pub fn port_label(record: &ProbeOutputItem) -> String {
    match &record.forwarded_port {
        Some(forwarded) => format!("{}:{}/{}", record.port, forwarded, record.protocol),
        None => format!("{}/{}", record.port, record.protocol),
    }
}

fn to_edge(groups: &GroupMap, record: &ProbeOutputItem, id: String) -> SimpleGraphEdge {
    let label = if record.port.is_empty() {
        "UNKNOWN".to_string()
    } else {
        record.port.clone()
    };
    SimpleGraphEdge {
        id,
        from: record.source.name.clone(),
        to: record.destination.name.clone(),
        label,
        port: port_label(record),
        from_deployment: groups.lookup(&record.source.name),
        to_deployment: groups.lookup(&record.destination.name),
        hidden: false,
        denied_connection: record.is_denied(),
        timestamp: record.timestamp,
    }
}

type EdgeKey = (String, String, String, String);

fn edge_key(edge: &SimpleGraphEdge) -> EdgeKey {
    (
        edge.from.clone(),
        edge.to.clone(),
        edge.port.clone(),
        edge.label.clone(),
    )
}

/// Keeps the newest edge per `(from, to, port, label)`; ties keep the first.
/// The survivor sits where its key was first seen.
fn remove_duplicates(edges: Vec<SimpleGraphEdge>) -> Vec<SimpleGraphEdge> {
    let mut slots: Vec<SimpleGraphEdge> = Vec::with_capacity(edges.len());
    let mut index: HashMap<EdgeKey, usize> = HashMap::new();
    for edge in edges {
        match index.get(&edge_key(&edge)) {
            Some(&slot) => {
                if edge.timestamp > slots[slot].timestamp {
                    slots[slot] = edge;
                }
            }
            None => {
                index.insert(edge_key(&edge), slots.len());
                slots.push(edge);
            }
        }
    }
    slots
}

pub fn build_edges(output: &ProbeOutput, groups: &GroupMap) -> Vec<SimpleGraphEdge> {
    let (denied, allowed): (Vec<_>, Vec<_>) = output
        .items
        .iter()
        .enumerate()
        .partition(|(_, record)| record.is_denied());

    let allowed = allowed
        .into_iter()
        .map(|(i, record)| to_edge(groups, record, i.to_string()));
    let denied = denied.into_iter().map(|(i, record)| SimpleGraphEdge {
        hidden: true,
        ..to_edge(groups, record, format!("{i}disallowed"))
    });
    let failed = output.errors.iter().enumerate().map(|(i, error)| SimpleGraphEdge {
        hidden: true,
        denied_connection: true,
        ..to_edge(groups, &error.value, format!("{i}disallowed"))
    });

    let all: Vec<SimpleGraphEdge> = allowed.chain(denied).chain(failed).collect();
    let total = all.len();
    let unique = remove_duplicates(all);
    tracing::debug!(
        total,
        kept = unique.len(),
        "deduplicated probe edges"
    );

    unique
        .into_iter()
        .enumerate()
        .map(|(i, edge)| SimpleGraphEdge {
            id: i.to_string(),
            ..edge
        })
        .collect()
}

/// Builds the canonical graph of one snapshot.
pub fn normalize(output: &ProbeOutput) -> CanonicalGraph {
    let groups = build_group_map(output);
    let graph = CanonicalGraph {
        nodes: build_nodes(output, &groups),
        edges: build_edges(output, &groups),
    };
    tracing::debug!(
        items = output.items.len(),
        errors = output.errors.len(),
        deployments_known = groups.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "normalized probe snapshot"
    );
    graph
}

pub fn error_logs(output: &ProbeOutput) -> Vec<ProbeErrorInfo> {
    let mut seen = HashSet::new();
    output
        .errors
        .iter()
        .filter(|e| !e.reason.is_empty())
        .map(|e| ProbeErrorInfo {
            pod_name: e.value.source.name.clone(),
            reason: e.reason.clone(),
            timestamp: e.value.timestamp,
        })
        .filter(|info| seen.insert(info.clone()))
        .collect()
}

/// IP address → pod name for every endpoint that reported one.
pub fn pod_ip_mapping(output: &ProbeOutput) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for record in &output.items {
        for endpoint in [&record.source, &record.destination] {
            if let Some(ip) = &endpoint.ip_address {
                map.insert(ip.clone(), endpoint.name.clone());
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{denied, failure, pod, pod_in, probe, snapshot};

    #[test]
    fn edges_between_same_pods_stay_separate_per_port() {
        let out = snapshot(
            vec![
                probe(pod("pod1"), pod("pod2"), "8080", 1234),
                probe(pod("pod1"), pod("pod2"), "80", 1234),
            ],
            vec![],
        );
        let edges = build_edges(&out, &build_group_map(&out));

        let mut first = SimpleGraphEdge::new("0", "pod1", "pod2", "8080/TCP");
        first.label = "8080".into();
        first.timestamp = 1234;
        let mut second = SimpleGraphEdge::new("1", "pod1", "pod2", "80/TCP");
        second.label = "80".into();
        second.timestamp = 1234;
        assert_eq!(edges, vec![first, second]);
    }

    #[test]
    fn opposite_directions_do_not_merge() {
        let out = snapshot(
            vec![
                probe(pod("pod1"), pod("pod2"), "8080", 1234),
                probe(pod("pod2"), pod("pod1"), "80", 1234),
            ],
            vec![],
        );
        let edges = build_edges(&out, &build_group_map(&out));
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].from.as_str(), edges[0].to.as_str()), ("pod1", "pod2"));
        assert_eq!((edges[1].from.as_str(), edges[1].to.as_str()), ("pod2", "pod1"));
        assert!(edges.iter().all(|e| !e.denied_connection));
    }

    #[test]
    fn newest_duplicate_wins_and_ties_keep_first() {
        let mut older = probe(pod("a"), pod("b"), "80", 1);
        older.expected_action = "old".into();
        let newer = probe(pod("a"), pod("b"), "80", 5);
        let tie = denied(probe(pod("a"), pod("b"), "80", 5));
        let out = snapshot(vec![older, newer, tie], vec![]);

        let edges = build_edges(&out, &build_group_map(&out));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].timestamp, 5);
        assert!(!edges[0].denied_connection);
        assert_eq!(edges[0].id, "0");
    }

    #[test]
    fn denied_and_failed_probes_become_hidden_edges() {
        let out = snapshot(
            vec![denied(probe(pod("a"), pod("b"), "443", 1))],
            vec![failure(probe(pod("a"), pod("c"), "53", 2), "timeout")],
        );
        let edges = build_edges(&out, &build_group_map(&out));
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.hidden && e.denied_connection));
        assert_eq!(edges[0].id, "0");
        assert_eq!(edges[1].id, "1");
    }

    #[test]
    fn forwarded_port_is_rendered_in_port_label() {
        let mut record = probe(pod("a"), pod("b"), "80", 1);
        record.forwarded_port = Some("8080".into());
        assert_eq!(port_label(&record), "80:8080/TCP");
    }

    #[test]
    fn empty_port_gets_unknown_label() {
        let out = snapshot(vec![probe(pod("a"), pod("b"), "", 1)], vec![]);
        let edges = build_edges(&out, &build_group_map(&out));
        assert_eq!(edges[0].label, "UNKNOWN");
    }

    #[test]
    fn group_map_applies_to_every_occurrence() {
        let out = snapshot(
            vec![
                probe(pod_in("web-1", "web"), pod("db"), "5432", 1),
                probe(pod("db"), pod("web-1"), "80", 2),
            ],
            vec![],
        );
        let groups = build_group_map(&out);
        assert_eq!(groups.get("web-1"), Some("web"));
        assert_eq!(groups.get("db"), None);

        let edges = build_edges(&out, &groups);
        assert_eq!(edges[1].to_deployment.as_deref(), Some("web"));

        let nodes = build_nodes(&out, &groups);
        assert_eq!(nodes.len(), 2);
        let web = nodes.iter().find(|n| n.id == "web-1").expect("web node");
        assert_eq!(web.deployment.as_deref(), Some("web"));
        assert_eq!(web.group.as_deref(), Some("web"));
    }

    #[test]
    fn nodes_differing_in_any_field_are_kept() {
        let mut other_ns = pod("a");
        other_ns.namespace = "kube-system".into();
        let out = snapshot(
            vec![
                probe(pod("a"), pod("b"), "80", 1),
                probe(other_ns, pod("b"), "80", 2),
            ],
            vec![],
        );
        let nodes = build_nodes(&out, &build_group_map(&out));
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a"]);
        assert!(nodes[0].title.as_deref().unwrap_or("").contains("\"namespace\": \"default\""));
    }

    #[test]
    fn normalize_includes_error_endpoints() {
        let out = snapshot(
            vec![probe(pod("a"), pod("b"), "80", 1)],
            vec![failure(probe(pod("a"), pod("ghost"), "80", 1), "refused")],
        );
        let graph = normalize(&out);
        assert!(graph.nodes.iter().any(|n| n.id == "ghost"));
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn error_logs_skip_empty_reasons_and_duplicates() {
        let out = snapshot(
            vec![],
            vec![
                failure(probe(pod("a"), pod("b"), "80", 1), "timeout"),
                failure(probe(pod("a"), pod("c"), "80", 1), "timeout"),
                failure(probe(pod("x"), pod("b"), "80", 1), ""),
            ],
        );
        let logs = error_logs(&out);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].pod_name, "a");
    }

    #[test]
    fn ip_mapping_collects_reported_addresses() {
        let mut src = pod("a");
        src.ip_address = Some("10.0.0.1".into());
        let out = snapshot(vec![probe(src, pod("b"), "80", 1)], vec![]);
        let map = pod_ip_mapping(&out);
        assert_eq!(map.get("10.0.0.1").map(String::as_str), Some("a"));
        assert_eq!(map.len(), 1);
    }
}
