//! Header and command frames: only the shared envelope is in scope here —
//! no test-visible behavior beyond round-tripping it (spec §1, "Out of
//! scope"). Callers that need the header message text or command code get
//! the raw payload slice and decide what to do with it themselves.

use crate::error::PmuError;
use crate::frame::envelope::{self, Envelope};

/// Encodes a header frame: envelope plus an opaque UTF-8 message payload.
pub fn encode_header(
    version: u8,
    id_code: u16,
    soc: Option<u32>,
    frasec: Option<u32>,
    message: &[u8],
) -> Result<Vec<u8>, PmuError> {
    envelope::encode(
        crate::constants::FRAME_TYPE_HEADER,
        version,
        id_code,
        soc,
        frasec,
        message,
    )
}

/// Decodes a header frame, returning the envelope and raw message bytes.
pub fn decode_header(bytes: &[u8]) -> Result<(Envelope, &[u8]), PmuError> {
    envelope::decode(bytes)
}

/// Encodes a command frame: envelope plus an opaque command-code payload.
pub fn encode_command(
    version: u8,
    id_code: u16,
    soc: Option<u32>,
    frasec: Option<u32>,
    command: &[u8],
) -> Result<Vec<u8>, PmuError> {
    envelope::encode(
        crate::constants::FRAME_TYPE_CMD,
        version,
        id_code,
        soc,
        frasec,
        command,
    )
}

/// Decodes a command frame, returning the envelope and raw command bytes.
pub fn decode_command(bytes: &[u8]) -> Result<(Envelope, &[u8]), PmuError> {
    envelope::decode(bytes)
}
