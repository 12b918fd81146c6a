//! Parsing `netstat -tulpn` output captured inside the probed pods.

use kubesonde_core::{NetstatEntry, NetstatInfo, ProbeOutput, SocketAddress};

fn split_at_last(raw: &str, sep: char) -> Option<(&str, &str)> {
    raw.rfind(sep).map(|i| (&raw[..i], &raw[i + 1..]))
}

pub fn parse_address(raw: &str) -> SocketAddress {
    let colons = raw.matches(':').count();
    let (address, port) = if raw.starts_with('[') {
        let port = split_at_last(raw, ':').map(|(_, p)| p);
        let address = raw[1..].split(']').next();
        (address, port)
    } else if colons > 1 {
        match split_at_last(raw, ':') {
            Some((a, p)) => (Some(a), Some(p)),
            None => (None, None),
        }
    } else if colons == 1 {
        let (a, p) = raw.split_once(':').unwrap_or((raw, ""));
        (Some(a).filter(|a| !a.is_empty()), Some(p))
    } else if raw.matches('.').count() > 1 {
        match split_at_last(raw, '.') {
            Some((a, p)) => (Some(a), Some(p)),
            None => (None, None),
        }
    } else {
        (None, None)
    };

    SocketAddress {
        port: port.and_then(|p| p.parse().ok()),
        address: address
            .filter(|a| *a != "::" && *a != "0.0.0.0")
            .map(str::to_string),
    }
}

fn parse_pid(raw: &str) -> u32 {
    let pid = raw.split('/').next().unwrap_or(raw);
    pid.trim().parse().unwrap_or(0)
}

/// Parses one line of Linux netstat output. Header and blank lines yield
/// `None`; UDP lines have no state column.
pub fn parse_netstat_line(line: &str) -> Option<NetstatEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let first = parts.first()?;
    let protocol = first.to_lowercase();
    if !protocol.starts_with("tcp") && !protocol.starts_with("udp") {
        return None;
    }
    if parts.len() < 5 {
        tracing::warn!(line, "skipping truncated netstat line");
        return None;
    }

    let (state, pid_from) = if protocol.starts_with("udp") {
        (None, 5)
    } else {
        (parts.get(5).map(|s| s.to_string()), 6)
    };
    let pid = parts.get(pid_from..).unwrap_or_default().join(" ");

    let local = parse_address(parts[3]);
    let remote = parse_address(parts[4]);
    let protocol = match &local.address {
        Some(address) if protocol == "tcp" && address.contains(':') => "tcp6".to_string(),
        _ => protocol,
    };

    Some(NetstatEntry {
        protocol,
        local,
        remote,
        state,
        pid: parse_pid(&pid),
    })
}

/// Parsed netstat tables of every pod in the optional `podNetworking` side
/// table. The first two lines of each capture are headers.
pub fn netstat_info(output: &ProbeOutput) -> Option<Vec<NetstatInfo>> {
    let captures = output.pod_networking.as_ref()?;
    Some(
        captures
            .iter()
            .map(|capture| NetstatInfo {
                name: capture.pod_name.clone(),
                entries: capture
                    .netstat
                    .split('\n')
                    .skip(2)
                    .filter_map(parse_netstat_line)
                    .collect(),
            })
            .collect(),
    )
}
