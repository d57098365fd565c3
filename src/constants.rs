//! IEEE C37.118.2 Protocol Constants
//!
//! This module defines constants used in the synchrophasor frame codec,
//! based on IEEE Std C37.118.2-2011, and the defaults used by the
//! clock-offset estimators.

/// High byte of `SYNC`: always 0xAA.
pub const SYNC_LEADER: u8 = 0xAA;

/// Frame-type nibble values (bits 6..4 of the second sync byte).
pub const FRAME_TYPE_DATA: u8 = 0;
pub const FRAME_TYPE_HEADER: u8 = 1;
pub const FRAME_TYPE_CFG1: u8 = 2;
pub const FRAME_TYPE_CFG2: u8 = 3;
pub const FRAME_TYPE_CMD: u8 = 4;
pub const FRAME_TYPE_CFG3: u8 = 5;

/// Valid protocol version range (4-bit nibble).
pub const VERSION_MIN: u8 = 1;
pub const VERSION_MAX: u8 = 15;

/// Valid IDCODE range.
pub const ID_CODE_MIN: u16 = 1;
pub const ID_CODE_MAX: u16 = 65534;

/// Byte length of the shared envelope header (SYNC..FRASEC inclusive).
pub const ENVELOPE_HEADER_LEN: usize = 14;
/// Byte length of the trailing CRC.
pub const CRC_LEN: usize = 2;
/// Minimum possible on-wire frame length: header + CRC, no payload.
pub const MIN_FRAME_LEN: usize = ENVELOPE_HEADER_LEN + CRC_LEN;

/// Maximum fraction-of-second numerator (24-bit).
pub const FRASEC_FRACTION_MAX: u32 = 0x00FF_FFFF;

/// Message time-quality codes {12, 13, 14} are reserved/forbidden.
pub const TIME_QUALITY_FORBIDDEN: [u8; 3] = [12, 13, 14];
pub const TIME_QUALITY_MAX: u8 = 15;

/// Station name field width, ASCII space-padded.
pub const STATION_NAME_LEN: usize = 16;
/// Channel-name field width (phasor/analog names), ASCII space-padded.
pub const CHANNEL_NAME_LEN: usize = 16;
/// Digital channel-name field width, two 16-byte names per digital word.
pub const DIGITAL_NAME_LEN: usize = 16;

/// PHUNIT/ANUNIT/DIGUNIT conversion-factor scale: 10^-5 per LSB.
pub const PHUNIT_SCALE: f64 = 1e-5;

/// Nominal line frequencies selectable via FNOM bit 0.
pub const FNOM_60HZ: u16 = 0;
pub const FNOM_50HZ: u16 = 1;

/// Maximum UDP datagram payload this deployment accepts.
pub const MAX_DATAGRAM_LEN: usize = 1024;

// --- Estimator defaults (spec §3, "Estimator state") ---

/// Ring-buffer length of recent clock-offset samples kept per client.
pub const SAMPLE_RING_CAPACITY: usize = 1000;

/// EWMA smoothing factor.
pub const EWMA_ALPHA: f64 = 0.2;

/// Kalman filter defaults, in microseconds^2 / microseconds.
pub const KALMAN_INITIAL_P: f64 = 1.0e6;
pub const KALMAN_PROCESS_NOISE_Q: f64 = 1.0e4;
pub const KALMAN_MEASUREMENT_NOISE_R: f64 = 2.0e6;

/// PID gains.
pub const PID_KP: f64 = 0.6;
pub const PID_KI: f64 = 0.05;
pub const PID_KD: f64 = 0.0;

/// Packet index at which the per-client bias sample is captured (spec §4.11).
pub const BIAS_CAPTURE_PACKET: u64 = 30;

/// Maximum number of tracked client endpoints before LRU eviction kicks in.
pub const MAX_TRACKED_ENDPOINTS: usize = 4096;

/// Anomaly-flag threshold: multiple of recent sample stddev.
pub const ANOMALY_STDDEV_THRESHOLD: f64 = 4.0;

// --- Client damping defaults (spec §4.12) ---

pub const DAMPING_FACTOR_STAGE_1: f64 = 0.5; // packets 1..=5
pub const DAMPING_FACTOR_STAGE_2: f64 = 0.3; // packets 6..=10
pub const DAMPING_FACTOR_STAGE_3: f64 = 0.1; // packets 11..

pub const RESYNC_INTERVAL_FAST_MS: u64 = 1_000; // avg |correction| > 100ms
pub const RESYNC_INTERVAL_MEDIUM_MS: u64 = 2_000; // avg |correction| > 10ms
pub const RESYNC_INTERVAL_SLOW_MS: u64 = 5_000; // else

pub const RESYNC_THRESHOLD_FAST_US: i64 = 100_000;
pub const RESYNC_THRESHOLD_MEDIUM_US: i64 = 10_000;

pub const RESET_CHECK_PACKET: u64 = 15;
pub const RESET_THRESHOLD_US: i64 = 500_000;

// --- Default endpoints (spec §6, "UDP endpoint") ---

pub const DEFAULT_RAW_PORT: u16 = 12345;
pub const DEFAULT_SCHEME_AWARE_PORT: u16 = 12346;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
