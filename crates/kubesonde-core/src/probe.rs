use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    Pod,
    Service,
    Internet,
}

impl EndpointKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pod => "Pod",
            Self::Service => "Service",
            Self::Internet => "Internet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeKind {
    Probe,
    Information,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeEndpoint {
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "IPAddress", default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set_name: Option<String>,
}

impl ProbeEndpoint {
    /// Deployment name, treating an empty string as absent.
    pub fn deployment(&self) -> Option<&str> {
        self.deployment_name.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutputItem {
    #[serde(rename = "type")]
    pub kind: ProbeKind,
    pub expected_action: String,
    pub resulting_action: ProbeAction,
    pub source: ProbeEndpoint,
    pub destination: ProbeEndpoint,
    #[serde(default)]
    pub destination_hostnames: Vec<String>,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_port: Option<String>,
    pub protocol: String,
    pub timestamp: i64,
}

impl ProbeOutputItem {
    pub fn is_denied(&self) -> bool {
        self.resulting_action == ProbeAction::Deny
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutputError {
    pub value: ProbeOutputItem,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodNetworkingItem {
    pub ip: String,
    pub port: String,
    pub protocol: String,
}

/// Open ports per pod name.
pub type PodNetworkingInfoV2 = BTreeMap<String, Vec<PodNetworkingItem>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodNetworkingInfo {
    pub pod_name: String,
    pub netstat: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutput {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    pub items: Vec<ProbeOutputItem>,
    pub errors: Vec<ProbeOutputError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_networking: Option<Vec<PodNetworkingInfo>>,
    #[serde(rename = "podNetworkingv2", default)]
    pub pod_networking_v2: PodNetworkingInfoV2,
    #[serde(default)]
    pub pod_configuration_networking: PodNetworkingInfoV2,
}

const ITEM_FIELDS: &[&str] = &[
    "type",
    "expectedAction",
    "resultingAction",
    "source",
    "destination",
    "port",
    "protocol",
    "timestamp",
];
const ENDPOINT_FIELDS: &[&str] = &["type", "name", "namespace"];

impl ProbeOutput {
    pub fn from_json(input: &str) -> Result<Self, ValidationError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| ValidationError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    /// Checks every required field before deserializing, so a malformed
    /// snapshot is reported by path instead of a generic decode error.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        validate_snapshot(&value)?;
        serde_json::from_value(value).map_err(|e| ValidationError::Json(e.to_string()))
    }
}

fn validate_snapshot(value: &Value) -> Result<(), ValidationError> {
    let root = value
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type("$", "object"))?;

    let items = require_array(root.get("items"), "items")?;
    for (i, item) in items.iter().enumerate() {
        validate_item(item, &format!("items[{i}]"))?;
    }

    let errors = require_array(root.get("errors"), "errors")?;
    for (i, error) in errors.iter().enumerate() {
        let path = format!("errors[{i}]");
        let obj = error
            .as_object()
            .ok_or_else(|| ValidationError::wrong_type(&path, "object"))?;
        let Some(inner) = obj.get("value") else {
            return Err(ValidationError::missing(format!("{path}.value")));
        };
        validate_item(inner, &format!("{path}.value"))?;
    }
    Ok(())
}

fn require_array<'a>(
    value: Option<&'a Value>,
    path: &str,
) -> Result<&'a Vec<Value>, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::missing(path)),
        Some(Value::Array(arr)) => Ok(arr),
        Some(_) => Err(ValidationError::wrong_type(path, "array")),
    }
}

fn validate_item(item: &Value, path: &str) -> Result<(), ValidationError> {
    let obj = item
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type(path, "object"))?;
    for field in ITEM_FIELDS {
        if obj.get(*field).map_or(true, Value::is_null) {
            return Err(ValidationError::missing(format!("{path}.{field}")));
        }
    }
    for side in ["source", "destination"] {
        let endpoint_path = format!("{path}.{side}");
        let endpoint = obj[side]
            .as_object()
            .ok_or_else(|| ValidationError::wrong_type(&endpoint_path, "object"))?;
        for field in ENDPOINT_FIELDS {
            if endpoint.get(*field).map_or(true, Value::is_null) {
                return Err(ValidationError::missing(format!("{endpoint_path}.{field}")));
            }
        }
    }
    Ok(())
}
