//! FRASEC: fraction-of-second plus time-quality, packed into a 32-bit word
//! (spec §3, "FRASEC word"; spec §4.3).
//!
//! ```text
//! bit  31      30        29       28      27..24          23..0
//!      reserved leap_dir  leap_occ leap_pen time_quality    fraction
//!      (=0)     (0=+,1=-)                   (0..11,15)      (0..2^24-1)
//! ```
//!
//! The reference implementation this crate's behavior was distilled from
//! sets bit 31 via an XOR-to-zero dance ("for standard compliance"); we
//! just never set it.

use crate::constants::{FRASEC_FRACTION_MAX, TIME_QUALITY_FORBIDDEN, TIME_QUALITY_MAX};
use crate::error::PmuError;

/// Leap-second direction: `+` means a second is added, `-` means deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeapDirection {
    Add,
    Delete,
}

/// Decoded contents of a FRASEC word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frasec {
    pub fraction: u32,
    pub leap_dir: LeapDirection,
    pub leap_occurred: bool,
    pub leap_pending: bool,
    pub time_quality: u8,
}

/// Packs FRASEC fields into the 32-bit wire word. Bit 31 is always 0.
pub fn pack_frasec(
    fraction: u32,
    leap_dir: LeapDirection,
    leap_occurred: bool,
    leap_pending: bool,
    time_quality: u8,
) -> Result<u32, PmuError> {
    if fraction > FRASEC_FRACTION_MAX {
        return Err(PmuError::FieldRange(format!(
            "FRASEC fraction {fraction} exceeds 24-bit range"
        )));
    }
    if time_quality > TIME_QUALITY_MAX || TIME_QUALITY_FORBIDDEN.contains(&time_quality) {
        return Err(PmuError::FieldRange(format!(
            "time quality code {time_quality} is not in {{0..11,15}}"
        )));
    }

    let mut tq_byte: u32 = 0; // bit 31 stays 0
    if leap_dir == LeapDirection::Delete {
        tq_byte |= 1 << 6;
    }
    if leap_occurred {
        tq_byte |= 1 << 5;
    }
    if leap_pending {
        tq_byte |= 1 << 4;
    }
    tq_byte |= time_quality as u32 & 0x0F;

    Ok((tq_byte << 24) | fraction)
}

/// Unpacks a FRASEC word back into its fields.
pub fn unpack_frasec(word: u32) -> Frasec {
    let tq_byte = (word >> 24) & 0x7F; // bit 31 ignored on input
    let leap_dir = if tq_byte & (1 << 6) != 0 {
        LeapDirection::Delete
    } else {
        LeapDirection::Add
    };
    let leap_occurred = tq_byte & (1 << 5) != 0;
    let leap_pending = tq_byte & (1 << 4) != 0;
    let time_quality = (tq_byte & 0x0F) as u8;
    let fraction = word & FRASEC_FRACTION_MAX;

    Frasec {
        fraction,
        leap_dir,
        leap_occurred,
        leap_pending,
        time_quality,
    }
}
