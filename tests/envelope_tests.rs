//! Integration-level envelope round-trip, exercised through the crate's
//! public API rather than the module's internal unit tests.

use pmu_sync::frame::envelope::{decode, encode, peek_type};
use pmu_sync::frame::time_quality::{pack_frasec, LeapDirection};
use pmu_sync::PmuError;

const FRAME_TYPE_HEADER: u8 = 1;

#[test]
fn scenario_envelope_roundtrip() {
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

    assert_eq!(peek_type(&bytes).unwrap(), FRAME_TYPE_HEADER);

    let (envelope, payload) = decode(&bytes).unwrap();
    assert_eq!(envelope.id_code, 7);
    assert_eq!(envelope.soc, 0x6000_0000);
    assert_eq!(payload, b"HELLO");
}

#[test]
fn scenario_bit_flip_is_caught_by_crc() {
    let bytes = encode(FRAME_TYPE_HEADER, 1, 7, None, None, b"HELLO").unwrap();
    let mut corrupt = bytes;
    corrupt[7] ^= 1 << 3;

    assert!(matches!(decode(&corrupt), Err(PmuError::CrcMismatch { .. })));
}
