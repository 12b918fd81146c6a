use kubesonde_core::{
    EndpointKind, ProbeAction, ProbeEndpoint, ProbeKind, ProbeOutput, ProbeOutputError,
    ProbeOutputItem,
};

pub fn pod(name: &str) -> ProbeEndpoint {
    ProbeEndpoint {
        kind: EndpointKind::Pod,
        name: name.to_string(),
        namespace: "default".to_string(),
        ip_address: None,
        deployment_name: None,
        replica_set_name: None,
    }
}

pub fn pod_in(name: &str, deployment: &str) -> ProbeEndpoint {
    ProbeEndpoint {
        deployment_name: Some(deployment.to_string()),
        replica_set_name: Some(format!("{deployment}-rs")),
        ..pod(name)
    }
}

pub fn service(name: &str) -> ProbeEndpoint {
    ProbeEndpoint {
        kind: EndpointKind::Service,
        ..pod(name)
    }
}

pub fn probe(
    source: ProbeEndpoint,
    destination: ProbeEndpoint,
    port: &str,
    timestamp: i64,
) -> ProbeOutputItem {
    ProbeOutputItem {
        kind: ProbeKind::Probe,
        expected_action: "Allow".to_string(),
        resulting_action: ProbeAction::Allow,
        source,
        destination,
        destination_hostnames: Vec::new(),
        port: port.to_string(),
        forwarded_port: None,
        protocol: "TCP".to_string(),
        timestamp,
    }
}

pub fn denied(mut item: ProbeOutputItem) -> ProbeOutputItem {
    item.resulting_action = ProbeAction::Deny;
    item
}

pub fn failure(item: ProbeOutputItem, reason: &str) -> ProbeOutputError {
    ProbeOutputError {
        value: item,
        reason: reason.to_string(),
    }
}

pub fn snapshot(items: Vec<ProbeOutputItem>, errors: Vec<ProbeOutputError>) -> ProbeOutput {
    ProbeOutput {
        items,
        errors,
        ..ProbeOutput::default()
    }
}
