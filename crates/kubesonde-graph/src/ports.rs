//! Pod → port views built from probes, netstat captures and the
//! networking side tables.

use kubesonde_core::{
    CanonicalGraph, Graph, NetInfoRow, NetstatInfo, PodNetworkingInfoV2, PodNetworkingItem,
    PortMapping, PortsReport, ProbeOutput, SimpleGraphEdge,
};
use std::collections::HashSet;

use crate::cluster::cluster_all;
use crate::merge::merge_simple_edges;
use crate::netstat::netstat_info;
use crate::normalize::{error_logs, pod_ip_mapping};
use crate::table::ports_full_graph;

/// Ports probed on each destination, in first-seen destination order.
pub fn mapping_from_edges(edges: &[SimpleGraphEdge]) -> Vec<PortMapping> {
    let mut seen = HashSet::new();
    edges
        .iter()
        .map(|e| e.to.as_str())
        .filter(|to| seen.insert(*to))
        .map(|pod| PortMapping {
            pod_name: pod.to_string(),
            ports: edges
                .iter()
                .filter(|e| e.to == pod)
                .map(|e| e.port.clone())
                .collect(),
        })
        .collect()
}

pub fn mapping_from_net_info(info: &PodNetworkingInfoV2) -> Vec<PortMapping> {
    info.iter()
        .map(|(pod, entries)| PortMapping {
            pod_name: pod.clone(),
            ports: entries
                .iter()
                .map(|e| format!("{}/{}", e.port, e.protocol))
                .collect(),
        })
        .collect()
}

/// Listening ports reported by netstat, as `port/PROTO`.
pub fn mapping_from_netstat(netstat: &[NetstatInfo]) -> Vec<PortMapping> {
    netstat
        .iter()
        .map(|capture| {
            let mut seen = HashSet::new();
            let ports = capture
                .entries
                .iter()
                .filter(|e| e.state.as_deref() == Some("LISTEN"))
                .filter_map(|e| {
                    e.local
                        .port
                        .map(|port| format!("{port}/{}", e.protocol.to_uppercase()))
                })
                .filter(|p| seen.insert(p.clone()))
                .collect();
            PortMapping {
                pod_name: capture.name.clone(),
                ports,
            }
        })
        .collect()
}

/// Open ports as observed by the probes, keyed by destination. The interface
/// is unknown, so `ip` is always `none`.
pub fn probed_net_info(edges: &[SimpleGraphEdge]) -> PodNetworkingInfoV2 {
    let mut info = PodNetworkingInfoV2::new();
    for edge in edges {
        let (port, protocol) = edge.port.split_once('/').unwrap_or((edge.port.as_str(), ""));
        let entry = PodNetworkingItem {
            ip: "none".to_string(),
            port: port.to_string(),
            protocol: protocol.to_string(),
        };
        let entries = info.entry(edge.to.clone()).or_default();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    info
}

/// Flattens a side table into rows sorted by pod name, then numerically by
/// port. Non-numeric ports sort last within their pod.
pub fn net_info_rows(info: &PodNetworkingInfoV2) -> Vec<NetInfoRow> {
    let mut rows: Vec<NetInfoRow> = info
        .iter()
        .flat_map(|(pod, entries)| {
            entries.iter().map(move |e| NetInfoRow {
                pod_name: pod.clone(),
                port: e.port.clone(),
                protocol: e.protocol.clone(),
                ip: e.ip.clone(),
            })
        })
        .collect();
    rows.sort_by_key(|r| (r.pod_name.clone(), r.port.parse::<u32>().unwrap_or(u32::MAX)));
    rows
}

/// Declared ports bind every interface; repeated declarations collapse.
pub fn declared_rows(info: &PodNetworkingInfoV2) -> Vec<NetInfoRow> {
    let mut seen = HashSet::new();
    net_info_rows(info)
        .into_iter()
        .map(|row| NetInfoRow {
            ip: "0.0.0.0".to_string(),
            ..row
        })
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Port and failure tables for `output`, whose canonical graph is `graph`.
pub fn ports_report(output: &ProbeOutput, graph: &CanonicalGraph) -> PortsReport {
    let netstat = netstat_info(output);
    let listening = netstat.as_deref().map(mapping_from_netstat).unwrap_or_default();
    let merged = Graph {
        nodes: graph.nodes.clone(),
        edges: merge_simple_edges(&graph.edges),
    };
    let report = PortsReport {
        listening,
        netstat,
        declared: declared_rows(&output.pod_configuration_networking),
        reported: net_info_rows(&output.pod_networking_v2),
        probed: net_info_rows(&probed_net_info(&graph.edges)),
        graph_ports: ports_full_graph(&cluster_all(&merged).edges),
        errors: error_logs(output),
        pod_ips: pod_ip_mapping(output),
    };
    tracing::debug!(
        declared = report.declared.len(),
        probed = report.probed.len(),
        errors = report.errors.len(),
        "ports report built"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{denied, failure, pod, pod_in, probe, snapshot};
    use crate::netstat::parse_netstat_line;
    use crate::normalize::normalize;
    use kubesonde_core::PodNetworkingInfo;

    fn item(ip: &str, port: &str, protocol: &str) -> PodNetworkingItem {
        PodNetworkingItem {
            ip: ip.into(),
            port: port.into(),
            protocol: protocol.into(),
        }
    }

    #[test]
    fn edges_map_destinations_to_probed_ports() {
        let edges = vec![
            SimpleGraphEdge::new("0", "a", "db", "5432/TCP"),
            SimpleGraphEdge::new("1", "a", "web", "80/TCP"),
            SimpleGraphEdge::new("2", "b", "db", "5433/TCP"),
        ];
        let mapping = mapping_from_edges(&edges);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[0].pod_name, "db");
        assert_eq!(mapping[0].ports, vec!["5432/TCP", "5433/TCP"]);
        assert_eq!(mapping[1].pod_name, "web");
    }

    #[test]
    fn net_info_maps_to_port_protocol() {
        let info = PodNetworkingInfoV2::from([(
            "web".to_string(),
            vec![item("0.0.0.0", "80", "TCP"), item("0.0.0.0", "53", "UDP")],
        )]);
        assert_eq!(
            mapping_from_net_info(&info),
            vec![PortMapping {
                pod_name: "web".into(),
                ports: vec!["80/TCP".into(), "53/UDP".into()],
            }]
        );
    }

    #[test]
    fn netstat_mapping_keeps_distinct_listening_ports() {
        let entries = [
            "tcp 0 0 0.0.0.0:8080 0.0.0.0:* LISTEN 1/app",
            "tcp6 0 0 :::8080 :::* LISTEN 1/app",
            "tcp 0 0 0.0.0.0:8080 0.0.0.0:* LISTEN 1/app",
            "tcp 0 0 10.0.0.2:40000 10.0.0.3:5432 ESTABLISHED 1/app",
            "udp 0 0 0.0.0.0:68 0.0.0.0:* 2/dhclient",
        ]
        .iter()
        .filter_map(|l| parse_netstat_line(l))
        .collect();
        let mapping = mapping_from_netstat(&[NetstatInfo {
            name: "web".into(),
            entries,
        }]);
        assert_eq!(mapping[0].ports, vec!["8080/TCP", "8080/TCP6"]);
    }

    #[test]
    fn probed_net_info_splits_and_dedupes() {
        let edges = vec![
            SimpleGraphEdge::new("0", "a", "db", "5432/TCP"),
            SimpleGraphEdge::new("1", "b", "db", "5432/TCP"),
            SimpleGraphEdge::new("2", "b", "db", "53/UDP"),
        ];
        let info = probed_net_info(&edges);
        assert_eq!(
            info["db"],
            vec![item("none", "5432", "TCP"), item("none", "53", "UDP")]
        );
    }

    #[test]
    fn rows_sort_by_pod_then_numeric_port() {
        let info = PodNetworkingInfoV2::from([
            (
                "web".to_string(),
                vec![item("0.0.0.0", "8080", "TCP"), item("0.0.0.0", "443", "TCP")],
            ),
            ("api".to_string(), vec![item("0.0.0.0", "9000", "TCP")]),
        ]);
        let rows = net_info_rows(&info);
        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.pod_name.as_str(), r.port.as_str()))
            .collect();
        assert_eq!(order, vec![("api", "9000"), ("web", "443"), ("web", "8080")]);
    }

    #[test]
    fn declared_rows_bind_all_interfaces_once() {
        let info = PodNetworkingInfoV2::from([(
            "db-0".to_string(),
            vec![item("10.0.0.9", "5432", "TCP"), item("10.0.0.10", "5432", "TCP")],
        )]);
        assert_eq!(
            declared_rows(&info),
            vec![NetInfoRow {
                pod_name: "db-0".into(),
                port: "5432".into(),
                protocol: "TCP".into(),
                ip: "0.0.0.0".into(),
            }]
        );
    }

    #[test]
    fn report_collects_every_port_table() {
        let mut web = pod_in("web-1", "web");
        web.ip_address = Some("10.0.0.1".into());
        let mut output = snapshot(
            vec![
                probe(web.clone(), pod_in("db-0", "db"), "5432", 1),
                probe(pod_in("web-2", "web"), pod_in("db-0", "db"), "5432", 1),
                denied(probe(web, pod("loner"), "22", 1)),
            ],
            vec![failure(
                probe(pod("loner"), pod_in("db-0", "db"), "5432", 2),
                "timeout",
            )],
        );
        output.pod_configuration_networking = PodNetworkingInfoV2::from([(
            "db-0".to_string(),
            vec![item("10.0.0.9", "5432", "TCP")],
        )]);
        output.pod_networking = Some(vec![PodNetworkingInfo {
            pod_name: "db-0".into(),
            netstat: "Active Internet connections\nProto Recv-Q Send-Q\n\
                      tcp 0 0 0.0.0.0:5432 0.0.0.0:* LISTEN 7/postgres"
                .into(),
        }]);

        let report = ports_report(&output, &normalize(&output));

        assert_eq!(
            report.listening,
            vec![PortMapping {
                pod_name: "db-0".into(),
                ports: vec!["5432/TCP".into()],
            }]
        );
        assert_eq!(report.netstat.as_ref().map(Vec::len), Some(1));
        assert_eq!(report.declared.len(), 1);
        assert_eq!(report.declared[0].ip, "0.0.0.0");
        assert!(report.reported.is_empty());
        let probed: Vec<(&str, &str)> = report
            .probed
            .iter()
            .map(|r| (r.pod_name.as_str(), r.port.as_str()))
            .collect();
        assert_eq!(probed, vec![("db-0", "5432"), ("loner", "22")]);
        assert_eq!(report.graph_ports, vec!["5432/TCP"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].reason, "timeout");
        assert_eq!(
            report.pod_ips.get("10.0.0.1").map(String::as_str),
            Some("web-1")
        );
    }
}
