//! Interactive session over one snapshot: visibility state plus the derived
//! display graph, table and metrics.

use kubesonde_core::{
    BoolMap, CanonicalGraph, Graph, MetricsReport, PortsReport, TableRow, ViewCommand,
    ViewReport,
};

use crate::cluster::{cluster_selected, deployments};
use crate::color::{build_color_map, colored, ColorMap, Palette};
use crate::error::ExplorerError;
use crate::filter::{
    hide_edges_within_pod, hide_pod, hide_ports, reset_all, set_deployment_enabled,
    show_edges_within_pod, show_pod,
};
use crate::merge::merge_simple_edges;
use crate::metrics::compute_metrics;
use crate::table::{bool_map, initial_enabled_groups, ports, table_rows};

#[derive(Debug, Clone, PartialEq)]
pub struct Explorer {
    /// Colored canonical graph as loaded; `reset` returns here.
    pristine: CanonicalGraph,
    working: CanonicalGraph,
    colors: ColorMap,
    deployments: Vec<String>,
    ports: PortsReport,

    hidden_ports: BoolMap,
    clustered: Vec<String>,
    /// `true` while the pod is hidden.
    hidden_pods: BoolMap,
    enabled: BoolMap,
    show_denied: bool,
}

impl Explorer {
    pub fn new(graph: CanonicalGraph, palette: &dyn Palette) -> Self {
        let colors = build_color_map(&graph.nodes, palette);
        let pristine = colored(&graph, &colors);
        let deployments = deployments(&pristine.nodes);
        let mut explorer = Self {
            working: pristine.clone(),
            pristine,
            colors,
            deployments,
            ports: PortsReport::default(),
            hidden_ports: BoolMap::new(),
            clustered: Vec::new(),
            hidden_pods: BoolMap::new(),
            enabled: BoolMap::new(),
            show_denied: false,
        };
        explorer.reset();
        explorer
    }

    pub fn with_show_denied(mut self, show: bool) -> Self {
        self.show_denied = show;
        self
    }

    /// Attaches the port and failure tables of the snapshot this graph came
    /// from.
    pub fn with_ports(mut self, ports: PortsReport) -> Self {
        self.ports = ports;
        self
    }

    pub fn reset(&mut self) {
        self.working = self.pristine.clone();
        self.hidden_ports = bool_map(ports(&self.pristine.edges), false);
        self.clustered = self.deployments.clone();
        self.hidden_pods = bool_map(self.pristine.nodes.iter().map(|n| n.id.clone()), false);
        self.enabled = initial_enabled_groups(&self.pristine.nodes);
        self.show_denied = false;
    }

    pub fn canonical(&self) -> &CanonicalGraph {
        &self.working
    }

    pub fn ports_report(&self) -> &PortsReport {
        &self.ports
    }

    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    pub fn clustered_deployments(&self) -> &[String] {
        &self.clustered
    }

    pub fn show_denied(&self) -> bool {
        self.show_denied
    }

    /// Working nodes with their probe edges merged per endpoint pair.
    pub fn merged(&self) -> Graph {
        Graph {
            nodes: self.working.nodes.clone(),
            edges: merge_simple_edges(&self.working.edges),
        }
    }

    /// The graph as it should be drawn right now.
    pub fn display(&self) -> Graph {
        let clustered = cluster_selected(&self.merged(), &self.clustered);
        if self.show_denied {
            reset_all(&clustered)
        } else {
            clustered
        }
    }

    pub fn metrics(&self) -> MetricsReport {
        compute_metrics(&self.display())
    }

    pub fn table(&self) -> Vec<TableRow> {
        table_rows(
            &self.merged(),
            &self.colors,
            &self.enabled,
            &self.clustered,
            &self.hidden_pods,
        )
    }

    pub fn report(&self) -> ViewReport {
        ViewReport {
            graph: self.display(),
            table: self.table(),
            metrics: self.metrics(),
            hidden_ports: self.hidden_ports.clone(),
            show_denied: self.show_denied,
        }
    }

    /// Hides exactly the listed ports; every other allowed edge is shown.
    pub fn set_hidden_ports(&mut self, hidden: &[String]) {
        for (port, flag) in self.hidden_ports.iter_mut() {
            *flag = hidden.contains(port);
        }
        self.working.edges = hide_ports(&self.working.edges, hidden);
    }

    /// Expands a clustered deployment or clusters an expanded one. Returns
    /// `false` when the deployment is disabled and nothing changed.
    pub fn toggle_deployment(&mut self, deployment: &str) -> Result<bool, ExplorerError> {
        if !self.deployments.iter().any(|d| d == deployment) {
            return Err(if self.enabled.contains_key(deployment) {
                ExplorerError::UngroupedDeployment(deployment.to_string())
            } else {
                ExplorerError::UnknownDeployment(deployment.to_string())
            });
        }
        if self.enabled.get(deployment) == Some(&false) {
            return Ok(false);
        }
        match self.clustered.iter().position(|d| d == deployment) {
            Some(i) => {
                self.clustered.remove(i);
            }
            None => self.clustered.push(deployment.to_string()),
        }
        tracing::debug!(
            deployment,
            clustered = self.clustered.len(),
            "toggled deployment"
        );
        Ok(true)
    }

    pub fn set_deployment_enabled(
        &mut self,
        deployment: &str,
        pods: &[String],
        enabled: bool,
    ) -> Result<(), ExplorerError> {
        if !self.enabled.contains_key(deployment) {
            return Err(ExplorerError::UnknownDeployment(deployment.to_string()));
        }
        self.working.nodes =
            set_deployment_enabled(&self.working.nodes, deployment, pods, enabled);
        self.enabled.insert(deployment.to_string(), enabled);
        Ok(())
    }

    /// Hides or reveals one pod and the edges touching it. Only pods that are
    /// currently drawn on their own can be toggled.
    pub fn toggle_pod(&mut self, pod: &str) -> bool {
        if !self.display().nodes.iter().any(|n| n.id == pod) {
            return false;
        }
        let hidden = self.hidden_pods.get(pod).copied().unwrap_or(false);
        if hidden {
            self.working.nodes = show_pod(&self.working.nodes, pod);
            self.working.edges = show_edges_within_pod(&self.working.edges, pod);
        } else {
            self.working.nodes = hide_pod(&self.working.nodes, pod);
            self.working.edges = hide_edges_within_pod(&self.working.edges, pod);
        }
        self.hidden_pods.insert(pod.to_string(), !hidden);
        true
    }

    pub fn set_show_denied(&mut self, show: bool) {
        self.show_denied = show;
    }

    pub fn apply(&mut self, command: &ViewCommand) -> Result<(), ExplorerError> {
        match command {
            ViewCommand::SetHiddenPorts { ports } => self.set_hidden_ports(ports),
            ViewCommand::ToggleDeployment { deployment } => {
                self.toggle_deployment(deployment)?;
            }
            ViewCommand::SetDeploymentEnabled {
                deployment,
                pods,
                enabled,
            } => self.set_deployment_enabled(deployment, pods, *enabled)?,
            ViewCommand::TogglePod { pod } => {
                self.toggle_pod(pod);
            }
            ViewCommand::SetShowDenied { show } => self.set_show_denied(*show),
            ViewCommand::Reset => self.reset(),
        }
        Ok(())
    }
}
