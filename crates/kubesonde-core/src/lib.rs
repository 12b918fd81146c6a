mod error;
mod graph;
mod ports;
mod probe;
mod view;

use serde::{Deserialize, Serialize};

pub use error::ValidationError;
pub use graph::{
    CanonicalGraph, Connection, Graph, GraphEdge, GraphNode, NodeShape, SimpleGraphEdge,
};
pub use ports::{
    NetInfoRow, NetstatEntry, NetstatInfo, PortMapping, PortsReport, SocketAddress,
};
pub use probe::{
    EndpointKind, PodNetworkingInfo, PodNetworkingInfoV2, PodNetworkingItem, ProbeAction,
    ProbeEndpoint, ProbeKind, ProbeOutput, ProbeOutputError, ProbeOutputItem,
};
pub use view::{BoolMap, MetricsReport, ProbeErrorInfo, TableRow, ViewReport};

/// Reserved node id of the pod running the probes.
pub const TEST_POD_ID: &str = "test-pod";
/// Reserved node id standing for any host outside the cluster.
pub const INTERNET_ID: &str = "Internet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ViewCommand {
    SetHiddenPorts { ports: Vec<String> },
    ToggleDeployment { deployment: String },
    SetDeploymentEnabled { deployment: String, pods: Vec<String>, enabled: bool },
    TogglePod { pod: String },
    SetShowDenied { show: bool },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Msg {
    Hello { version: String },
    RequestSnapshot,
    Snapshot { graph: CanonicalGraph },
    RequestPorts,
    Ports { report: Box<PortsReport> },
    Command { command: ViewCommand },
    View { report: Box<ViewReport> },
    Error { message: String },
    Ping,
    Pong,
}
