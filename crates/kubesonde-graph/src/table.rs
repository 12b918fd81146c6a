//! Deployment table projection and the port lists shown next to the graph.

use kubesonde_core::{BoolMap, Graph, GraphEdge, GraphNode, SimpleGraphEdge, TableRow};
use std::collections::HashSet;

use crate::cluster::deployments;
use crate::color::ColorMap;

pub const UNGROUPED_PREFIX: &str = "none";

/// Names of `count` rows for pods without a deployment: `none0`, `none1`, ...
/// Names already used by a deployment are skipped.
pub fn ungrouped_rows(count: usize, deployments: &[String]) -> Vec<String> {
    (0usize..)
        .map(|index| format!("{UNGROUPED_PREFIX}{index}"))
        .filter(|row| !deployments.contains(row))
        .take(count)
        .collect()
}

pub fn bool_map<I, S>(values: I, default: bool) -> BoolMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(|v| (v.into(), default)).collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).cloned().collect()
}

/// Distinct ports of the allowed probe edges, first-seen order.
pub fn ports(edges: &[SimpleGraphEdge]) -> Vec<String> {
    distinct(edges.iter().filter(|e| !e.denied_connection).map(|e| &e.port))
}

pub fn ports_full_graph(edges: &[GraphEdge]) -> Vec<String> {
    distinct(
        edges
            .iter()
            .filter(|e| !e.denied_connection)
            .flat_map(|e| e.ports.iter()),
    )
}

/// Services never get a row of their own.
fn table_nodes(nodes: &[GraphNode]) -> Vec<GraphNode> {
    nodes.iter().filter(|n| !n.is_service()).cloned().collect()
}

fn ungrouped_names(nodes: &[GraphNode]) -> Vec<&str> {
    nodes
        .iter()
        .filter(|n| n.deployment.is_none())
        .map(|n| n.name.as_str())
        .collect()
}

/// Every deployment row and every ungrouped row starts enabled.
pub fn initial_enabled_groups(nodes: &[GraphNode]) -> BoolMap {
    let taken = deployments(nodes);
    let rows = table_nodes(nodes);
    let ungrouped = ungrouped_rows(ungrouped_names(&rows).len(), &taken);
    let mut enabled = bool_map(taken, true);
    enabled.extend(ungrouped.into_iter().map(|row| (row, true)));
    enabled
}

/// One row per deployment of a non-service node, then one `none{idx}` row
/// per non-service node without a deployment.
pub fn table_rows(
    graph: &Graph,
    colors: &ColorMap,
    enabled: &BoolMap,
    clustered: &[String],
    hidden_pods: &BoolMap,
) -> Vec<TableRow> {
    let flag = |map: &BoolMap, key: &str| map.get(key).copied().unwrap_or(false);
    let rows = table_nodes(&graph.nodes);

    let mut table: Vec<TableRow> = deployments(&rows)
        .into_iter()
        .map(|deployment| {
            let pods: Vec<String> = graph
                .nodes
                .iter()
                .filter(|n| n.deployment.as_deref() == Some(deployment.as_str()))
                .map(|n| n.name.clone())
                .collect();
            TableRow {
                is_enabled: flag(enabled, &deployment),
                is_deployment_expanded: !clustered.contains(&deployment),
                background: colors.get(&deployment).cloned(),
                pods_expanded: pods
                    .iter()
                    .map(|p| (p.clone(), flag(hidden_pods, p)))
                    .collect(),
                pods_number: pods.len().to_string(),
                pods,
                deployment,
            }
        })
        .collect();

    let names = ungrouped_names(&rows);
    let row_names = ungrouped_rows(names.len(), &deployments(&graph.nodes));
    for (name, row) in names.into_iter().zip(row_names) {
        table.push(TableRow {
            is_enabled: flag(enabled, &row),
            is_deployment_expanded: false,
            background: colors.get(name).cloned(),
            pods: vec![name.to_string()],
            pods_expanded: BoolMap::from([(name.to_string(), flag(hidden_pods, name))]),
            pods_number: "1".to_string(),
            deployment: row,
        });
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str) -> GraphNode {
        GraphNode {
            kind: Some("Service".into()),
            ..GraphNode::new(id)
        }
    }

    fn sample() -> Graph {
        Graph {
            nodes: vec![
                GraphNode::new("web-1").with_deployment("web"),
                service("web_SVC"),
                GraphNode::new("web-2").with_deployment("web"),
                GraphNode::new("loner"),
                GraphNode::new("Internet"),
            ],
            edges: Vec::new(),
        }
    }

    #[test]
    fn ports_skip_denied_and_repeat() {
        let edges = vec![
            SimpleGraphEdge::new("0", "a", "b", "80/TCP"),
            SimpleGraphEdge::new("1", "a", "c", "80/TCP"),
            SimpleGraphEdge::new("2", "a", "c", "22/TCP").denied(),
            SimpleGraphEdge::new("3", "c", "b", "53/UDP"),
        ];
        assert_eq!(ports(&edges), vec!["80/TCP", "53/UDP"]);
    }

    #[test]
    fn full_graph_ports_flatten_merged_edges() {
        let edges = vec![
            GraphEdge::new("0", "a", "b").with_ports(["80/TCP", "443/TCP"]),
            GraphEdge::new("1", "b", "a").with_ports(["443/TCP", "53/UDP"]),
        ];
        assert_eq!(
            ports_full_graph(&edges),
            vec!["80/TCP", "443/TCP", "53/UDP"]
        );
    }

    #[test]
    fn bool_map_uses_default_for_every_key() {
        let map = bool_map(["a", "b"], true);
        assert_eq!(map.len(), 2);
        assert!(map.values().all(|v| *v));
    }

    #[test]
    fn enabled_groups_include_ungrouped_rows() {
        let enabled = initial_enabled_groups(&sample().nodes);
        let keys: Vec<&str> = enabled.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["none0", "none1", "web"]);
        assert!(enabled.values().all(|v| *v));
    }

    #[test]
    fn ungrouped_rows_skip_names_taken_by_deployments() {
        let nodes = vec![
            GraphNode::new("x-1").with_deployment("none0"),
            GraphNode::new("loner"),
            GraphNode::new("other"),
        ];
        let enabled = initial_enabled_groups(&nodes);
        let keys: Vec<&str> = enabled.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["none0", "none1", "none2"]);

        let graph = Graph {
            nodes,
            edges: Vec::new(),
        };
        let rows = table_rows(&graph, &ColorMap::new(), &enabled, &[], &BoolMap::new());
        assert_eq!(rows[0].deployment, "none0");
        assert_eq!(rows[0].pods, vec!["x-1"]);
        assert_eq!(rows[1].deployment, "none1");
        assert_eq!(rows[1].pods, vec!["loner"]);
        assert_eq!(rows[2].deployment, "none2");
        assert_eq!(rows[2].pods, vec!["other"]);
    }

    #[test]
    fn rows_cover_deployments_then_ungrouped_pods() {
        let graph = sample();
        let colors = ColorMap::from([
            ("web".to_string(), "#AAAAAA".to_string()),
            ("loner".to_string(), "#BBBBBB".to_string()),
        ]);
        let enabled = initial_enabled_groups(&graph.nodes);
        let hidden = BoolMap::from([("web-2".to_string(), true)]);
        let rows = table_rows(&graph, &colors, &enabled, &["web".to_string()], &hidden);

        assert_eq!(rows.len(), 3);
        let web = &rows[0];
        assert_eq!(web.deployment, "web");
        assert!(web.is_enabled);
        assert!(!web.is_deployment_expanded);
        assert_eq!(web.background.as_deref(), Some("#AAAAAA"));
        assert_eq!(web.pods, vec!["web-1", "web-2"]);
        assert_eq!(web.pods_number, "2");
        assert_eq!(web.pods_expanded.get("web-2"), Some(&true));
        assert_eq!(web.pods_expanded.get("web-1"), Some(&false));

        assert_eq!(rows[1].deployment, "none0");
        assert_eq!(rows[1].pods, vec!["loner"]);
        assert_eq!(rows[1].background.as_deref(), Some("#BBBBBB"));
        assert_eq!(rows[2].deployment, "none1");
        assert_eq!(rows[2].pods, vec!["Internet"]);
        assert_eq!(rows[2].pods_number, "1");
    }

    #[test]
    fn expanded_deployment_is_reported() {
        let graph = sample();
        let rows = table_rows(
            &graph,
            &ColorMap::new(),
            &BoolMap::new(),
            &[],
            &BoolMap::new(),
        );
        assert!(rows[0].is_deployment_expanded);
        assert!(!rows[0].is_enabled);
    }
}
