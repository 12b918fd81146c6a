//! Removes the noise the probing backend leaves in a snapshot.

use kubesonde_core::{
    EndpointKind, PodNetworkingInfoV2, ProbeEndpoint, ProbeOutput, ProbeOutputError,
    ProbeOutputItem,
};
use std::collections::HashMap;

const LOOPBACK: &str = "127.0.0.1";
const SERVICE_SUFFIX: &str = "_SVC";

type ProbeKey = (String, String, EndpointKind, String, String);

fn probe_key(item: &ProbeOutputItem) -> ProbeKey {
    (
        item.destination.name.clone(),
        item.source.name.clone(),
        item.destination.kind,
        item.port.clone(),
        item.protocol.clone(),
    )
}

/// One record per `(destination, source, destination type, port, protocol)`,
/// keeping the newest.
pub fn cleanup_probes(items: &[ProbeOutputItem]) -> Vec<ProbeOutputItem> {
    let mut slots: Vec<ProbeOutputItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<ProbeKey, usize> = HashMap::new();
    for item in items {
        let key = probe_key(item);
        match index.get(&key) {
            Some(&slot) => {
                if item.timestamp > slots[slot].timestamp {
                    slots[slot] = item.clone();
                }
            }
            None => {
                index.insert(key, slots.len());
                slots.push(item.clone());
            }
        }
    }
    slots
}

/// Drops ports that only listen on the loopback interface.
pub fn cleanup_net_info(info: &PodNetworkingInfoV2) -> PodNetworkingInfoV2 {
    info.iter()
        .map(|(pod, entries)| {
            let kept = entries
                .iter()
                .filter(|e| e.ip != LOOPBACK)
                .cloned()
                .collect();
            (pod.clone(), kept)
        })
        .collect()
}

/// Services are not members of a deployment for display purposes.
fn as_service_destination(destination: &ProbeEndpoint) -> ProbeEndpoint {
    if destination.kind != EndpointKind::Service {
        return destination.clone();
    }
    ProbeEndpoint {
        name: format!("{}{SERVICE_SUFFIX}", destination.name),
        deployment_name: None,
        replica_set_name: None,
        ..destination.clone()
    }
}

fn fix_service(item: ProbeOutputItem) -> ProbeOutputItem {
    ProbeOutputItem {
        destination: as_service_destination(&item.destination),
        ..item
    }
}

pub fn cleanup_probe_output(output: &ProbeOutput) -> ProbeOutput {
    let items: Vec<ProbeOutputItem> = cleanup_probes(&output.items)
        .into_iter()
        .map(fix_service)
        .collect();
    let errors = output
        .errors
        .iter()
        .map(|e| ProbeOutputError {
            value: fix_service(e.value.clone()),
            reason: e.reason.clone(),
        })
        .collect();
    tracing::debug!(
        before = output.items.len(),
        after = items.len(),
        "cleaned probe records"
    );
    ProbeOutput {
        items,
        errors,
        pod_networking_v2: cleanup_net_info(&output.pod_networking_v2),
        ..output.clone()
    }
}
