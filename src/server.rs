//! Server receive loop: single-threaded, cooperative, with an optional
//! background statistics-snapshot writer and SIGINT-driven shutdown
//! (spec §5, "Server scheduling model").
//!
//! Per-client estimator state is only ever touched under a lock held for
//! the duration of one update — the snapshot task takes the same lock just
//! long enough to clone a summary, never while the receive loop is
//! awaiting a datagram.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::signal;
use tokio::sync::Mutex;

use crate::constants::{DEFAULT_BIND_ADDR, DEFAULT_RAW_PORT};
use crate::error::PmuError;
use crate::frame::envelope;
use crate::frame::time_quality::{pack_frasec, LeapDirection};
use crate::logging::{log_debug, log_info, log_warn};
use crate::offset::registry::EstimatorRegistry;
use crate::offset::{sampler, stats};
use crate::reply::{self, Scheme};
use crate::transport::udp_server::UdpServer;

/// The server assumes a 1 MHz FRASEC denominator (microsecond resolution)
/// for its own wall-clock stamps; see [`wall_clock`].
const SERVER_TIME_BASE: u32 = 1_000_000;

/// Default statistics-snapshot file name (spec §6, "Persisted state").
const DEFAULT_SNAPSHOT_FILE: &str = "timing_analysis.json";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Suppress raw per-packet traces in diagnostics (spec §6, `--hide-raw`).
    pub hide_raw: bool,
    pub snapshot_interval: Duration,
    /// File the periodic and final statistics snapshot JSON is written to.
    pub snapshot_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("{DEFAULT_BIND_ADDR}:{DEFAULT_RAW_PORT}")
                .parse()
                .expect("static default address parses"),
            hide_raw: false,
            snapshot_interval: Duration::from_secs(10),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
        }
    }
}

/// Runs the receive loop until SIGINT, then snapshots once more and returns.
pub async fn run(config: ServerConfig) -> Result<(), PmuError> {
    let server = UdpServer::bind(config.bind_addr).await?;
    log_info(&format!("pmu-sync server listening on {}", config.bind_addr));

    let registry = Arc::new(Mutex::new(EstimatorRegistry::default()));

    let snapshot_registry = Arc::clone(&registry);
    let snapshot_interval = config.snapshot_interval;
    let snapshot_path = config.snapshot_path.clone();
    let snapshot_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(snapshot_interval);
        loop {
            interval.tick().await;
            let snap = {
                let guard = snapshot_registry.lock().await;
                stats::snapshot(&guard)
            };
            write_snapshot(&snapshot_path, &snap).await;
        }
    });

    let mut ack_counter: u64 = 0;
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log_info("received SIGINT, shutting down");
                break;
            }
            received = server.recv() => {
                let (bytes, from) = match received {
                    Ok(v) => v,
                    Err(e) => {
                        log_warn(&format!("datagram receive error: {e}"));
                        continue;
                    }
                };
                ack_counter += 1;
                if let Err(e) =
                    handle_datagram(&server, &registry, &bytes, from, ack_counter, config.hide_raw).await
                {
                    log_warn(&format!("dropping datagram from {from}: {e}"));
                }
            }
        }
    }

    snapshot_task.abort();

    let guard = registry.lock().await;
    let snap = stats::snapshot(&guard);
    drop(guard);
    write_snapshot(&config.snapshot_path, &snap).await;

    Ok(())
}

/// Serializes a snapshot and writes it to `path`, logging either the
/// written JSON or the failure; a snapshot write failure never aborts
/// the server.
async fn write_snapshot(path: &std::path::Path, snap: &stats::StatsSnapshot) {
    let json = match stats::to_json(snap) {
        Ok(json) => json,
        Err(e) => {
            log_warn(&format!("failed to serialize stats snapshot: {e}"));
            return;
        }
    };
    match tokio::fs::write(path, &json).await {
        Ok(()) => log_info(&format!("wrote stats snapshot to {}", path.display())),
        Err(e) => log_warn(&format!(
            "failed to write stats snapshot to {}: {e}",
            path.display()
        )),
    }
}

async fn handle_datagram(
    server: &UdpServer,
    registry: &Arc<Mutex<EstimatorRegistry>>,
    bytes: &[u8],
    from: SocketAddr,
    ack_num: u64,
    hide_raw: bool,
) -> Result<(), PmuError> {
    let (envelope, _payload) = envelope::decode(bytes)?;
    let scheme = Scheme::from_id_code(envelope.id_code);
    let (server_soc, server_frasec) = wall_clock();

    let sample = sampler::sample_offset_us(
        envelope.soc,
        envelope.frasec,
        server_soc,
        server_frasec,
        SERVER_TIME_BASE,
    );

    let (estimate, bias) = {
        let mut guard = registry.lock().await;
        let bank = guard.entry_mut(from);
        let estimate = bank.observe(sample);
        (estimate, bank.bias_us())
    };

    if !hide_raw {
        log_debug(&format!(
            "sample from {from}: {sample}us (scheme={})",
            scheme.as_str()
        ));
    }

    let reply = reply::build_reply(scheme, ack_num, &estimate, bias, server_soc, server_frasec);
    let json = reply::to_json(&reply).map_err(|e| PmuError::FrameParse(e.to_string()))?;
    server.send_to(json.as_bytes(), from).await
}

fn wall_clock() -> (u32, u32) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let soc = now.as_secs() as u32;
    let frasec = pack_frasec(now.subsec_micros(), LeapDirection::Add, false, false, 0)
        .expect("wall clock microsecond fraction always fits 24 bits");
    (soc, frasec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_raw_port() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), DEFAULT_RAW_PORT);
    }

    #[test]
    fn wall_clock_produces_plausible_fields() {
        let (soc, frasec) = wall_clock();
        assert!(soc > 1_700_000_000); // sometime after 2023
        assert_eq!(frasec & (1 << 31), 0);
    }

    #[tokio::test]
    async fn write_snapshot_persists_json_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timing_analysis.json");

        let registry = EstimatorRegistry::new(4);
        let snap = stats::snapshot(&registry);
        write_snapshot(&path, &snap).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, stats::to_json(&snap).unwrap());
    }
}
