//! Correction reply formatter: emits the scheme-tagged JSON message a
//! client receives after each poll (spec §4.11).

use serde::{Deserialize, Serialize};

use crate::offset::estimators::EstimateSet;

/// Correction scheme requested by the client, carried in the IDCODE field
/// of its outbound frame (spec §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Raw,
    Ewma,
    Kalman,
    Pid,
}

impl Scheme {
    /// Maps the reserved IDCODE values {1,2,3,4}; anything else is `Raw`.
    pub fn from_id_code(id_code: u16) -> Self {
        match id_code {
            2 => Scheme::Ewma,
            3 => Scheme::Kalman,
            4 => Scheme::Pid,
            _ => Scheme::Raw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Raw => "raw",
            Scheme::Ewma => "ewma",
            Scheme::Kalman => "kalman",
            Scheme::Pid => "pid",
        }
    }
}

/// UTF-8 JSON correction reply (spec §4.11, §6 "Wire: correction reply").
///
/// `Deserialize` does not reject unknown fields, so a client tolerates a
/// server that adds new ones (spec §6, "Clients tolerate extra unknown
/// fields").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionReply {
    pub ack_num: u64,
    pub scheme: &'static str,
    pub correction_us: i64,
    pub server_time_soc: u32,
    pub server_time_fracsec: u32,
}

/// Builds the reply for one client poll.
///
/// For `{ewma, kalman, pid}`, `bias_us` (the sample captured at packet #30)
/// is subtracted from the estimator output so the client sees a delta from
/// steady state rather than the raw offset. `Raw` always reports the
/// unbiased sample.
pub fn build_reply(
    scheme: Scheme,
    ack_num: u64,
    estimate: &EstimateSet,
    bias_us: Option<i64>,
    server_time_soc: u32,
    server_time_fracsec: u32,
) -> CorrectionReply {
    let correction_us = match scheme {
        Scheme::Raw => estimate.raw,
        Scheme::Ewma => apply_bias(estimate.ewma, bias_us),
        Scheme::Kalman => apply_bias(estimate.kalman, bias_us),
        Scheme::Pid => apply_bias(estimate.pid, bias_us),
    };

    CorrectionReply {
        ack_num,
        scheme: scheme.as_str(),
        correction_us,
        server_time_soc,
        server_time_fracsec,
    }
}

fn apply_bias(value: f64, bias_us: Option<i64>) -> i64 {
    let biased = value - bias_us.unwrap_or(0) as f64;
    biased.round() as i64
}

/// Serializes a reply to its on-wire JSON form.
pub fn to_json(reply: &CorrectionReply) -> Result<String, serde_json::Error> {
    serde_json::to_string(reply)
}

/// Parses a reply from its on-wire JSON form.
pub fn from_json(bytes: &[u8]) -> Result<CorrectionReply, serde_json::Error> {
    serde_json::from_slice(bytes)
}
