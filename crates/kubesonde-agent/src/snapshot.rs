use anyhow::{Context, Result};
use kubesonde_core::{CanonicalGraph, PortsReport, ProbeOutput};
use kubesonde_graph::{cleanup_probe_output, normalize, ports_report};
use std::fs;
use std::path::Path;

pub fn load_snapshot(path: &Path) -> Result<ProbeOutput> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read probe snapshot {}", path.display()))?;
    let output = ProbeOutput::from_json(&contents)
        .with_context(|| format!("invalid probe snapshot {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        items = output.items.len(),
        errors = output.errors.len(),
        "snapshot loaded"
    );
    Ok(output)
}

/// Canonical graph and port tables of a snapshot, optionally after probe
/// cleanup. Failed probes with a reason are logged once each.
pub fn build_graph(output: &ProbeOutput, cleanup: bool) -> (CanonicalGraph, PortsReport) {
    let output = if cleanup {
        cleanup_probe_output(output)
    } else {
        output.clone()
    };
    let graph = normalize(&output);
    let ports = ports_report(&output, &graph);
    for failure in &ports.errors {
        tracing::warn!(
            pod = %failure.pod_name,
            reason = %failure.reason,
            timestamp = failure.timestamp,
            "probe failed"
        );
    }
    (graph, ports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SNAPSHOT: &str = r#"{
        "start": "2023-01-01T00:00:00Z",
        "end": "2023-01-01T00:01:00Z",
        "items": [
            {
                "type": "Probe",
                "expectedAction": "Allow",
                "resultingAction": "Allow",
                "source": {"type": "Pod", "name": "web-1", "namespace": "default", "deploymentName": "web"},
                "destination": {"type": "Service", "name": "db", "namespace": "default"},
                "port": "5432",
                "protocol": "TCP",
                "timestamp": 1
            },
            {
                "type": "Probe",
                "expectedAction": "Allow",
                "resultingAction": "Allow",
                "source": {"type": "Pod", "name": "web-1", "namespace": "default", "deploymentName": "web"},
                "destination": {"type": "Service", "name": "db", "namespace": "default"},
                "port": "5432",
                "protocol": "TCP",
                "timestamp": 2
            }
        ],
        "errors": []
    }"#;

    #[test]
    fn loads_and_builds_cleaned_graph() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("probes.json");
        fs::write(&path, SNAPSHOT).expect("write");

        let output = load_snapshot(&path).expect("snapshot");
        assert_eq!(output.items.len(), 2);

        let (cleaned, ports) = build_graph(&output, true);
        assert_eq!(cleaned.edges.len(), 1);
        assert!(cleaned.nodes.iter().any(|n| n.id == "db_SVC"));
        assert_eq!(ports.graph_ports, vec!["5432/TCP"]);
        assert_eq!(ports.probed.len(), 1);
        assert!(ports.errors.is_empty());

        let (raw, _) = build_graph(&output, false);
        assert!(raw.nodes.iter().any(|n| n.id == "db"));
    }

    #[test]
    fn missing_file_and_invalid_json_are_errors() {
        let dir = tempdir().expect("tempdir");
        assert!(load_snapshot(&dir.path().join("absent.json")).is_err());

        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"items": []}"#).expect("write");
        let err = load_snapshot(&path).expect_err("errors is required");
        assert!(format!("{err:#}").contains("errors"));
    }
}
