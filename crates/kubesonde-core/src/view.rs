use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::graph::Graph;

/// Visibility flags keyed by port, pod or deployment name.
pub type BoolMap = BTreeMap<String, bool>;

/// One row of the deployment table shown next to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub deployment: String,
    pub is_enabled: bool,
    pub is_deployment_expanded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    pub pods: Vec<String>,
    pub pods_expanded: BoolMap,
    pub pods_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub strongly_connected_components: Vec<Vec<String>>,
    /// NaN when no node is visible; serialized as `null`.
    #[serde(deserialize_with = "nan_if_null")]
    pub average_out_degree: f64,
}

fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl MetricsReport {
    /// Components rendered as comma separated node ids.
    pub fn components_display(&self) -> Vec<String> {
        self.strongly_connected_components
            .iter()
            .map(|c| c.join(", "))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeErrorInfo {
    pub pod_name: String,
    pub reason: String,
    pub timestamp: i64,
}

/// Everything a client needs to redraw after an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewReport {
    pub graph: Graph,
    pub table: Vec<TableRow>,
    pub metrics: MetricsReport,
    pub hidden_ports: BoolMap,
    pub show_denied: bool,
}
