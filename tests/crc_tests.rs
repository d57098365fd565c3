//! CRC16/XMODEM law (spec §8, "CRC law").

use pmu_sync::util::crc::{crc16_xmodem, verify};

#[test]
fn known_test_vector_matches_standard() {
    assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
}

#[test]
fn verify_accepts_well_formed_frame_and_rejects_corruption() {
    let mut frame = b"synchrophasor payload".to_vec();
    let crc = crc16_xmodem(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());

    assert!(verify(&frame));

    let mut corrupt = frame.clone();
    corrupt[0] ^= 0xFF;
    assert!(!verify(&corrupt));
}
