use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Ellipse,
    Square,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<NodeShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl GraphNode {
    /// A visible pod-like node whose id, name and label are all `id`.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            label: id.clone(),
            id,
            kind: None,
            group: None,
            deployment: None,
            title: None,
            hidden: false,
            shape: None,
            color: None,
        }
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        let deployment = deployment.into();
        self.group = Some(deployment.clone());
        self.deployment = Some(deployment);
        self
    }

    pub fn is_service(&self) -> bool {
        self.kind.as_deref() == Some("Service")
    }
}

/// One probe observation between two endpoints, before merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleGraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_deployment: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub denied_connection: bool,
    pub timestamp: i64,
}

impl SimpleGraphEdge {
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        let port = port.into();
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: port.clone(),
            port,
            from_deployment: None,
            to_deployment: None,
            hidden: false,
            denied_connection: false,
            timestamp: 0,
        }
    }

    pub fn denied(mut self) -> Self {
        self.denied_connection = true;
        self.hidden = true;
        self
    }
}

/// An edge carrying every port observed between one ordered endpoint pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_deployment: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub denied_connection: bool,
}

impl GraphEdge {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: String::new(),
            ports: Vec::new(),
            from_deployment: None,
            to_deployment: None,
            hidden: false,
            denied_connection: false,
        }
    }

    pub fn with_ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ports = ports.into_iter().map(Into::into).collect();
        self.label = self.ports.join(", ");
        self
    }
}

impl From<SimpleGraphEdge> for GraphEdge {
    fn from(edge: SimpleGraphEdge) -> Self {
        Self {
            id: edge.id,
            from: edge.from,
            to: edge.to,
            label: edge.label,
            ports: vec![edge.port],
            from_deployment: edge.from_deployment,
            to_deployment: edge.to_deployment,
            hidden: edge.hidden,
            denied_connection: edge.denied_connection,
        }
    }
}

/// Common view over both edge shapes, used by the visibility filters.
pub trait Connection: Clone {
    fn source(&self) -> &str;
    fn target(&self) -> &str;
    fn is_hidden(&self) -> bool;
    fn is_denied(&self) -> bool;
    fn set_hidden(&mut self, hidden: bool);

    fn touches(&self, id: &str) -> bool {
        self.source() == id || self.target() == id
    }

    fn with_hidden(&self, hidden: bool) -> Self {
        let mut out = self.clone();
        out.set_hidden(hidden);
        out
    }
}

impl Connection for SimpleGraphEdge {
    fn source(&self) -> &str {
        &self.from
    }
    fn target(&self) -> &str {
        &self.to
    }
    fn is_hidden(&self) -> bool {
        self.hidden
    }
    fn is_denied(&self) -> bool {
        self.denied_connection
    }
    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }
}

impl Connection for GraphEdge {
    fn source(&self) -> &str {
        &self.from
    }
    fn target(&self) -> &str {
        &self.to
    }
    fn is_hidden(&self) -> bool {
        self.hidden
    }
    fn is_denied(&self) -> bool {
        self.denied_connection
    }
    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph<E = GraphEdge> {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<E>,
}

impl<E> Default for Graph<E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

/// Normalizer output: canonical nodes with one edge per probe observation.
pub type CanonicalGraph = Graph<SimpleGraphEdge>;
