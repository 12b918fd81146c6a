use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::view::ProbeErrorInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketAddress {
    pub port: Option<u32>,
    /// `None` for wildcard binds (`0.0.0.0`, `::`).
    pub address: Option<String>,
}

/// One parsed line of `netstat -tulpn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetstatEntry {
    pub protocol: String,
    pub local: SocketAddress,
    pub remote: SocketAddress,
    pub state: Option<String>,
    pub pid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetstatInfo {
    pub name: String,
    pub entries: Vec<NetstatEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub pod_name: String,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetInfoRow {
    pub pod_name: String,
    pub port: String,
    pub protocol: String,
    pub ip: String,
}

/// Port and failure tables of one snapshot. They do not change while a
/// client explores the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortsReport {
    /// Raw netstat captures; `None` when the snapshot carried none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netstat: Option<Vec<NetstatInfo>>,
    /// Listening ports per pod according to netstat.
    pub listening: Vec<PortMapping>,
    /// Ports the pods declare in their configuration.
    pub declared: Vec<NetInfoRow>,
    /// Open ports reported from inside the containers.
    pub reported: Vec<NetInfoRow>,
    /// Ports the probes reached, per destination.
    pub probed: Vec<NetInfoRow>,
    /// Allowed ports of the fully clustered graph.
    pub graph_ports: Vec<String>,
    pub errors: Vec<ProbeErrorInfo>,
    /// IP address → pod name.
    pub pod_ips: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_omits_netstat() {
        let json = serde_json::to_value(PortsReport::default()).expect("encode");
        let obj = json.as_object().expect("object");
        assert!(!obj.contains_key("netstat"));
        assert!(obj.contains_key("graphPorts"));
        assert!(obj.contains_key("podIps"));
        let back: PortsReport = serde_json::from_value(json).expect("decode");
        assert_eq!(back, PortsReport::default());
    }
}
