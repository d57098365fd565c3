//! # PMU Frame Codec Error Handling
//!
//! This module defines [`PmuError`], the error taxonomy used across the
//! frame codec and the clock-offset service (spec §7).

use thiserror::Error;

/// Represents the different error types that can occur in the pmu-sync crate.
#[derive(Debug, Error)]
pub enum PmuError {
    /// CRC over the frame does not match the trailing CHK field.
    #[error("CRC mismatch: expected {expected:#06x}, calculated {calculated:#06x}")]
    CrcMismatch { expected: u16, calculated: u16 },

    /// Buffer is smaller than the declared frame/field sizes require.
    #[error("truncated frame: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    /// Counts declared by configuration don't fit the remaining payload.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Frame-type nibble is not one of {data, header, cfg1, cfg2, cmd, cfg3}.
    #[error("unknown frame type nibble: {0}")]
    UnknownFrameType(u8),

    /// A field value is outside the bounds the standard permits.
    #[error("field out of range: {0}")]
    FieldRange(String),

    /// A data frame arrived before any configuration frame for its stream.
    #[error("no configuration available for id code {0}")]
    NoConfiguration(u16),

    /// Socket bind failed at startup.
    #[error("failed to bind {addr}: {source}")]
    BindError {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Transient datagram send failure.
    #[error("send failed: {0}")]
    SendError(std::io::Error),

    /// Correction-reply JSON failed to parse, flattened to a message.
    #[error("frame parse error: {0}")]
    FrameParse(String),

    /// Any other I/O failure not covered above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
