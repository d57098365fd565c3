//! Shared frame envelope: SYNC, FRAMESIZE, IDCODE, SOC, FRASEC, and the
//! trailing CRC (spec §3, "Frame envelope"; spec §4.2).
//!
//! Every frame type — data, header, cfg1/cfg2/cfg3, command — shares this
//! 14-byte header and 2-byte trailer; only the payload between them
//! differs. [`encode`] builds it around an opaque payload; [`decode`]
//! strips it back off and hands the caller the envelope fields plus the
//! raw payload slice for type-specific decoding; [`peek_type`] is the
//! cheap path used by a dispatcher that only needs to know which decoder
//! to call.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{
    CRC_LEN, ENVELOPE_HEADER_LEN, ID_CODE_MAX, ID_CODE_MIN, MIN_FRAME_LEN, SYNC_LEADER,
    VERSION_MAX, VERSION_MIN,
};
use crate::error::PmuError;
use crate::frame::time_quality::{pack_frasec, LeapDirection};
use crate::util::bigend::{Reader, Writer};
use crate::util::crc::crc16_xmodem;

/// Decoded envelope fields, with the payload left for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub frame_type: u8,
    pub version: u8,
    pub id_code: u16,
    pub soc: u32,
    pub frasec: u32,
}

/// Encodes a complete frame: envelope header, `payload`, and trailing CRC.
///
/// `soc`/`frasec` default to the current wall clock when omitted
/// (spec §4.2).
pub fn encode(
    frame_type: u8,
    version: u8,
    id_code: u16,
    soc: Option<u32>,
    frasec: Option<u32>,
    payload: &[u8],
) -> Result<Vec<u8>, PmuError> {
    if frame_type > 0x0F {
        return Err(PmuError::FieldRange(format!(
            "frame type nibble {frame_type} exceeds 4 bits"
        )));
    }
    if !(VERSION_MIN..=VERSION_MAX).contains(&version) {
        return Err(PmuError::FieldRange(format!(
            "version {version} out of range [{VERSION_MIN}, {VERSION_MAX}]"
        )));
    }
    if !(ID_CODE_MIN..=ID_CODE_MAX).contains(&id_code) {
        return Err(PmuError::FieldRange(format!(
            "id code {id_code} out of range [{ID_CODE_MIN}, {ID_CODE_MAX}]"
        )));
    }

    let soc = soc.unwrap_or_else(wall_clock_soc);
    let frasec = match frasec {
        Some(f) => f,
        None => pack_frasec(wall_clock_fraction(), LeapDirection::Add, false, false, 0)?,
    };

    let framesize = ENVELOPE_HEADER_LEN + payload.len() + CRC_LEN;
    if framesize > u16::MAX as usize {
        return Err(PmuError::FieldRange(format!(
            "frame size {framesize} exceeds 16-bit FRAMESIZE field"
        )));
    }

    let mut w = Writer::with_capacity(framesize);
    w.u8(SYNC_LEADER);
    w.u8((frame_type << 4) | version);
    w.u16(framesize as u16);
    w.u16(id_code);
    w.u32(soc);
    w.u32(frasec);
    w.bytes(payload);

    let crc = crc16_xmodem(w.as_slice());
    w.u16(crc);

    Ok(w.into_vec())
}

/// Validates the CRC and returns just the frame-type nibble, the way a
/// stream splitter wants to route bytes without paying for a full decode.
pub fn peek_type(bytes: &[u8]) -> Result<u8, PmuError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(PmuError::Truncated {
            needed: MIN_FRAME_LEN,
            have: bytes.len(),
        });
    }
    check_crc(bytes)?;
    Ok((bytes[1] >> 4) & 0x0F)
}

/// Decodes the shared envelope, returning the fields and the payload
/// slice (CRC already stripped and verified).
pub fn decode(bytes: &[u8]) -> Result<(Envelope, &[u8]), PmuError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(PmuError::Truncated {
            needed: MIN_FRAME_LEN,
            have: bytes.len(),
        });
    }
    check_crc(bytes)?;

    let mut r = Reader::new(bytes);
    let leader = r.u8()?;
    if leader != SYNC_LEADER {
        return Err(PmuError::StructuralMismatch(format!(
            "invalid SYNC leader byte {leader:#04x}, expected {SYNC_LEADER:#04x}"
        )));
    }
    let type_version = r.u8()?;
    let frame_type = (type_version >> 4) & 0x0F;
    let version = type_version & 0x0F;

    let framesize = r.u16()? as usize;
    if framesize != bytes.len() {
        return Err(PmuError::StructuralMismatch(format!(
            "FRAMESIZE {framesize} does not match received length {}",
            bytes.len()
        )));
    }

    let id_code = r.u16()?;
    let soc = r.u32()?;
    let frasec = r.u32()?;

    let payload = &bytes[r.position()..bytes.len() - CRC_LEN];

    Ok((
        Envelope {
            frame_type,
            version,
            id_code,
            soc,
            frasec,
        },
        payload,
    ))
}

fn check_crc(bytes: &[u8]) -> Result<(), PmuError> {
    let (body, trailer) = bytes.split_at(bytes.len() - CRC_LEN);
    let expected = u16::from_be_bytes([trailer[0], trailer[1]]);
    let calculated = crc16_xmodem(body);
    if expected != calculated {
        return Err(PmuError::CrcMismatch {
            expected,
            calculated,
        });
    }
    Ok(())
}

fn wall_clock_soc() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn wall_clock_fraction() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_micros())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FRAME_TYPE_HEADER;
    use crate::frame::time_quality::pack_frasec;

    #[test]
    fn envelope_roundtrip() {
        let frasec = pack_frasec(500_000, LeapDirection::Add, false, false, 5).unwrap();
        let bytes = encode(
            FRAME_TYPE_HEADER,
            1,
            7,
            Some(0x6000_0000),
            Some(frasec),
            b"HELLO",
        )
        .unwrap();

        assert_eq!(bytes.len(), ENVELOPE_HEADER_LEN + 5 + CRC_LEN);
        assert_eq!(peek_type(&bytes).unwrap(), FRAME_TYPE_HEADER);

        let (envelope, payload) = decode(&bytes).unwrap();
        assert_eq!(envelope.id_code, 7);
        assert_eq!(envelope.soc, 0x6000_0000);
        assert_eq!(envelope.frasec, frasec);
        assert_eq!(payload, b"HELLO");
    }

    #[test]
    fn single_bit_flip_is_caught_by_crc() {
        let bytes = encode(FRAME_TYPE_HEADER, 1, 7, None, None, b"HELLO").unwrap();
        let mut corrupt = bytes.clone();
        corrupt[7] ^= 1 << 3;
        assert!(matches!(
            decode(&corrupt),
            Err(PmuError::CrcMismatch { .. })
        ));
        assert!(matches!(
            peek_type(&corrupt),
            Err(PmuError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_id_code() {
        assert!(encode(FRAME_TYPE_HEADER, 1, 0, None, None, &[]).is_err());
        assert!(encode(FRAME_TYPE_HEADER, 1, 65535, None, None, &[]).is_err());
    }

    #[test]
    fn truncated_buffer_is_reported() {
        let err = decode(&[0xAA, 0x10]).unwrap_err();
        assert!(matches!(err, PmuError::Truncated { .. }));
    }
}
