//! Statistics snapshot: per-client packet counts and sample summary,
//! exported as JSON for an out-of-process consumer (spec §6, "Persisted
//! state"; spec §9, "Plotting and interactive prompts do not belong in the
//! core").

use std::net::SocketAddr;

use serde::Serialize;

use crate::offset::registry::EstimatorRegistry;

/// Summary statistics for one client's recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClientStats {
    pub endpoint: String,
    pub packet_count: u64,
    pub sample_count: usize,
    pub min_us: i64,
    pub max_us: i64,
    pub avg_us: f64,
    pub stddev_us: f64,
}

/// A point-in-time snapshot across every tracked client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub clients: Vec<ClientStats>,
}

/// Builds a [`StatsSnapshot`] from the current registry state.
pub fn snapshot(registry: &EstimatorRegistry) -> StatsSnapshot {
    let mut clients: Vec<ClientStats> = registry
        .addrs()
        .filter_map(|addr| registry.get(addr).map(|bank| client_stats(*addr, bank)))
        .collect();
    clients.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
    StatsSnapshot { clients }
}

fn client_stats(addr: SocketAddr, bank: &crate::offset::estimators::EstimatorBank) -> ClientStats {
    let ring = bank.ring();
    let (min_us, max_us) = ring
        .iter()
        .fold((i64::MAX, i64::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    ClientStats {
        endpoint: addr.to_string(),
        packet_count: bank.packet_count(),
        sample_count: ring.len(),
        min_us: if ring.is_empty() { 0 } else { min_us },
        max_us: if ring.is_empty() { 0 } else { max_us },
        avg_us: ring.mean(),
        stddev_us: ring.stddev(),
    }
}

/// Serializes a snapshot to a compact JSON string (spec §6).
pub fn to_json(snapshot: &StatsSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn snapshot_reports_per_client_summary() {
        let mut registry = EstimatorRegistry::new(8);
        registry.entry_mut(addr(1)).observe(1_000);
        registry.entry_mut(addr(1)).observe(2_000);
        registry.entry_mut(addr(2)).observe(500);

        let snap = snapshot(&registry);
        assert_eq!(snap.clients.len(), 2);

        let first = snap
            .clients
            .iter()
            .find(|c| c.endpoint == addr(1).to_string())
            .unwrap();
        assert_eq!(first.packet_count, 2);
        assert_eq!(first.min_us, 1_000);
        assert_eq!(first.max_us, 2_000);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut registry = EstimatorRegistry::new(8);
        registry.entry_mut(addr(1)).observe(1_000);
        let snap = snapshot(&registry);
        let json = to_json(&snap).unwrap();
        assert!(json.contains("\"packet_count\":1"));
    }
}
