//! Frame dispatcher: validates the CRC, reads the type nibble, and routes
//! to the matching decoder (spec §4.7).

pub mod config;
pub mod data;
pub mod envelope;
pub mod format;
pub mod header_command;
pub mod stat;
pub mod time_quality;

use crate::constants::{
    FRAME_TYPE_CFG1, FRAME_TYPE_CFG2, FRAME_TYPE_CFG3, FRAME_TYPE_CMD, FRAME_TYPE_DATA,
    FRAME_TYPE_HEADER,
};
use crate::error::PmuError;
use config::ConfigFrame;
use data::DataFrame;
use envelope::Envelope;

/// A decoded frame of any type, tagged with its envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Data(Envelope, DataFrame),
    Header(Envelope, Vec<u8>),
    Config1(Envelope, ConfigFrame),
    Config2(Envelope, ConfigFrame),
    /// cfg3 is out of scope beyond the shared envelope; payload is opaque.
    Config3(Envelope, Vec<u8>),
    Command(Envelope, Vec<u8>),
}

/// Validates CRC, inspects the type nibble, and decodes against it.
///
/// Decoding a data frame requires `cfg` to be `Some`; every other type
/// ignores it. An unrecognized type nibble yields
/// [`PmuError::UnknownFrameType`].
pub fn decode(bytes: &[u8], cfg: Option<&ConfigFrame>) -> Result<Frame, PmuError> {
    let (envelope, payload) = envelope::decode(bytes)?;

    match envelope.frame_type {
        FRAME_TYPE_DATA => {
            let cfg = cfg.ok_or(PmuError::NoConfiguration(envelope.id_code))?;
            let data = data::decode_payload(payload, cfg, envelope.soc, envelope.frasec)?;
            Ok(Frame::Data(envelope, data))
        }
        FRAME_TYPE_HEADER => Ok(Frame::Header(envelope, payload.to_vec())),
        FRAME_TYPE_CFG1 => {
            let cfg = config::decode_payload(payload)?;
            Ok(Frame::Config1(envelope, cfg))
        }
        FRAME_TYPE_CFG2 => {
            let cfg = config::decode_payload(payload)?;
            Ok(Frame::Config2(envelope, cfg))
        }
        FRAME_TYPE_CMD => Ok(Frame::Command(envelope, payload.to_vec())),
        FRAME_TYPE_CFG3 => Ok(Frame::Config3(envelope, payload.to_vec())),
        other => Err(PmuError::UnknownFrameType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::config::{NominalFrequency, PmuStreamConfig};
    use crate::frame::format::DataFormat;

    fn empty_cfg() -> ConfigFrame {
        ConfigFrame {
            time_base: 1_000_000,
            data_rate: 30,
            streams: vec![PmuStreamConfig {
                station_name: "STATION1".to_string(),
                id_code: 7,
                format: DataFormat {
                    polar: true,
                    phasor_float: false,
                    analog_float: false,
                    freq_float: false,
                },
                phasor_names: vec![],
                analog_names: vec![],
                digital_names: vec![],
                phasor_units: vec![],
                analog_units: vec![],
                digital_units: vec![],
                nominal_frequency: NominalFrequency::Hz60,
                config_change_count: 0,
            }],
        }
    }

    #[test]
    fn dispatches_config_frame() {
        let cfg = empty_cfg();
        let bytes = config::encode(FRAME_TYPE_CFG1, 1, 7, None, None, &cfg).unwrap();
        match decode(&bytes, None).unwrap() {
            Frame::Config1(_, decoded) => assert_eq!(decoded, cfg),
            other => panic!("expected Config1, got {other:?}"),
        }
    }

    #[test]
    fn data_frame_requires_configuration() {
        let cfg = empty_cfg();
        let data = DataFrame {
            soc: 0,
            frasec: 0,
            streams: vec![data::StreamData {
                stat: stat::Stat::unpack(0),
                phasors: vec![],
                freq: data::ScalarField::Int(0),
                dfreq: data::ScalarField::Int(0),
                analogs: vec![],
                digitals: vec![],
            }],
        };
        let bytes = data::encode(1, 7, None, None, &data, &cfg).unwrap();

        assert!(matches!(
            decode(&bytes, None),
            Err(PmuError::NoConfiguration(7))
        ));

        match decode(&bytes, Some(&cfg)).unwrap() {
            Frame::Data(_, decoded) => assert_eq!(decoded, data),
            other => panic!("expected Data, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_nibble_is_reported() {
        use crate::util::crc::crc16_xmodem;

        let bytes = header_command::encode_header(1, 7, None, None, b"hi").unwrap();
        let mut forged = bytes.clone();
        let unused_nibble = 0x0F;
        forged[1] = (unused_nibble << 4) | (forged[1] & 0x0F);
        let crc = crc16_xmodem(&forged[..forged.len() - 2]);
        let crc_bytes = crc.to_be_bytes();
        let len = forged.len();
        forged[len - 2] = crc_bytes[0];
        forged[len - 1] = crc_bytes[1];

        assert!(matches!(
            decode(&forged, None),
            Err(PmuError::UnknownFrameType(0x0F))
        ));
    }
}
