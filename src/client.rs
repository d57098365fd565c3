//! Client-side damping loop: applies each correction with adaptive damping
//! and round-trip-time compensation, adapts its resync cadence, and resets
//! on sustained large error (spec §4.12).
//!
//! The local offset lives in an owned cell (spec §9, "Global mutable clock
//! offset ... replaced by an owned offset cell with well-defined readers
//! and a single writer task"); [`run`] is the single writer, [`OffsetCell`]
//! the shared reader handle a sender task would use.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::constants::{
    DAMPING_FACTOR_STAGE_1, DAMPING_FACTOR_STAGE_2, DAMPING_FACTOR_STAGE_3, RESET_CHECK_PACKET,
    RESET_THRESHOLD_US, RESYNC_INTERVAL_FAST_MS, RESYNC_INTERVAL_MEDIUM_MS,
    RESYNC_INTERVAL_SLOW_MS, RESYNC_THRESHOLD_FAST_US, RESYNC_THRESHOLD_MEDIUM_US,
};
use crate::error::PmuError;
use crate::frame::header_command::encode_header;
use crate::frame::time_quality::{pack_frasec, LeapDirection};
use crate::logging::log_debug;
use crate::reply::{self, Scheme};
use crate::transport::udp_client::UdpClient;

const CLIENT_TIME_BASE: u32 = 1_000_000;
const RECENT_WINDOW: usize = 10;

/// Shared handle to the client's local clock offset, in seconds.
#[derive(Clone)]
pub struct OffsetCell(Arc<Mutex<f64>>);

impl OffsetCell {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(0.0)))
    }

    pub async fn get(&self) -> f64 {
        *self.0.lock().await
    }

    async fn set(&self, value: f64) {
        *self.0.lock().await = value;
    }
}

impl Default for OffsetCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure damping-loop state, independent of any network I/O (spec §4.12).
#[derive(Debug, Clone)]
pub struct DampingState {
    packet_index: u64,
    offset_seconds: f64,
    recent_compensated_us: VecDeque<i64>,
}

impl DampingState {
    pub fn new() -> Self {
        Self {
            packet_index: 0,
            offset_seconds: 0.0,
            recent_compensated_us: VecDeque::with_capacity(RECENT_WINDOW),
        }
    }

    pub fn offset_seconds(&self) -> f64 {
        self.offset_seconds
    }

    pub fn packet_index(&self) -> u64 {
        self.packet_index
    }

    fn damping_factor(&self) -> f64 {
        match self.packet_index {
            1..=5 => DAMPING_FACTOR_STAGE_1,
            6..=10 => DAMPING_FACTOR_STAGE_2,
            _ => DAMPING_FACTOR_STAGE_3,
        }
    }

    /// Applies one correction, adjusted for half the measured RTT and
    /// scaled by the current damping stage. Returns the offset delta just
    /// applied, in seconds.
    pub fn apply_correction(&mut self, correction_us: i64, rtt_us: i64) -> f64 {
        self.packet_index += 1;
        let compensated = correction_us - rtt_us / 2;
        let factor = self.damping_factor();
        let delta_seconds = (compensated as f64 * factor) / 1_000_000.0;
        self.offset_seconds += delta_seconds;

        if self.recent_compensated_us.len() == RECENT_WINDOW {
            self.recent_compensated_us.pop_front();
        }
        self.recent_compensated_us.push_back(compensated);

        if self.packet_index % RESET_CHECK_PACKET == 0 && compensated.abs() > RESET_THRESHOLD_US {
            self.offset_seconds = 0.0;
            self.packet_index = 0;
            self.recent_compensated_us.clear();
        }

        delta_seconds
    }

    /// Resync cadence, adapted to the average magnitude of recent
    /// corrections (spec §4.12).
    pub fn resync_interval(&self) -> Duration {
        if self.recent_compensated_us.is_empty() {
            return Duration::from_millis(RESYNC_INTERVAL_SLOW_MS);
        }
        let avg = self
            .recent_compensated_us
            .iter()
            .map(|v| v.unsigned_abs())
            .sum::<u64>() as f64
            / self.recent_compensated_us.len() as f64;

        if avg > RESYNC_THRESHOLD_FAST_US as f64 {
            Duration::from_millis(RESYNC_INTERVAL_FAST_MS)
        } else if avg > RESYNC_THRESHOLD_MEDIUM_US as f64 {
            Duration::from_millis(RESYNC_INTERVAL_MEDIUM_MS)
        } else {
            Duration::from_millis(RESYNC_INTERVAL_SLOW_MS)
        }
    }
}

impl Default for DampingState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    pub scheme: Scheme,
    /// Packets to send before exiting cleanly; 0 means unlimited (spec §6).
    pub count: u64,
}

/// Runs the client poll loop: craft a frame stamped with the corrected
/// clock, send, await the correction, apply it with damping, sleep for the
/// adapted resync interval, repeat.
pub async fn run(config: ClientConfig) -> Result<(), PmuError> {
    let transport = UdpClient::connect(config.server_addr).await?;
    let offset = OffsetCell::new();
    let mut damping = DampingState::new();

    let mut sent: u64 = 0;
    loop {
        if config.count != 0 && sent >= config.count {
            break;
        }

        let current_offset = offset.get().await;
        let (soc, frasec) = corrected_wall_clock(current_offset);
        let id_code = scheme_id_code(config.scheme);
        let frame = encode_header(1, id_code, Some(soc), Some(frasec), b"")?;

        let t0 = Instant::now();
        transport.send(&frame).await?;
        let reply_bytes = transport.recv().await?;
        let rtt_us = t0.elapsed().as_micros() as i64;
        sent += 1;

        let reply = reply::from_json(&reply_bytes)
            .map_err(|e| PmuError::FrameParse(e.to_string()))?;

        let delta = damping.apply_correction(reply.correction_us, rtt_us);
        let new_offset = current_offset + delta;
        offset.set(new_offset).await;

        log_debug(&format!(
            "packet {}: scheme={} correction={}us rtt={}us offset={:.6}s",
            damping.packet_index(),
            reply.scheme,
            reply.correction_us,
            rtt_us,
            offset.get().await
        ));

        sleep(damping.resync_interval()).await;
    }

    Ok(())
}

fn scheme_id_code(scheme: Scheme) -> u16 {
    match scheme {
        Scheme::Raw => 1,
        Scheme::Ewma => 2,
        Scheme::Kalman => 3,
        Scheme::Pid => 4,
    }
}

fn corrected_wall_clock(offset_seconds: f64) -> (u32, u32) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
        + offset_seconds;

    let soc = now.trunc().max(0.0) as u32;
    let fraction_us = ((now.fract().max(0.0)) * CLIENT_TIME_BASE as f64) as u32;
    let frasec = pack_frasec(fraction_us, LeapDirection::Add, false, false, 0)
        .expect("corrected fraction always fits 24 bits");
    (soc, frasec)
}
