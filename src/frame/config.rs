//! Configuration frame (cfg1/cfg2): describes one or more PMU streams —
//! counts, names, scaling factors, nominal frequency (spec §3,
//! "Configuration entity"; spec §4.5).
//!
//! cfg1 and cfg2 share an identical payload layout and differ only in the
//! envelope's frame-type nibble (spec §4.5); cfg3 is out of scope beyond
//! the shared envelope (spec §1). [`encode_payload`]/[`decode_payload`]
//! work on the payload only; [`encode`]/[`decode`] wrap it with the
//! envelope for a specific frame-type code.

use crate::constants::{
    CHANNEL_NAME_LEN, DIGITAL_NAME_LEN, FNOM_50HZ, FNOM_60HZ, ID_CODE_MAX, ID_CODE_MIN,
    STATION_NAME_LEN,
};
use crate::error::PmuError;
use crate::frame::envelope::{self, Envelope};
use crate::frame::format::{pack_format, unpack_format, DataFormat};
use crate::util::bigend::{Reader, Writer};

/// PHUNIT's type tag: voltage or current phasor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhasorUnitKind {
    Voltage,
    Current,
}

/// Per-phasor scaling unit: high byte type tag, low 24 bits conversion
/// factor in units of 10^-5 (spec §4.5, "PHUNIT").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasorUnit {
    pub kind: PhasorUnitKind,
    /// Raw 24-bit conversion factor; multiply by `PHUNIT_SCALE` for the
    /// real-valued factor.
    pub conversion_factor: u32,
}

/// Per-analog scaling unit: high byte a free-form unit code, low 24 bits
/// conversion factor in units of 10^-5 (spec §4.5, "ANUNIT").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogUnit {
    pub code: u8,
    pub conversion_factor: u32,
}

/// Per-digital scaling unit: valid/current mask halves (spec §4.5,
/// "DIGUNIT").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalUnit {
    pub valid_mask: u16,
    pub current_mask: u16,
}

/// Nominal line frequency (spec §4.5, "FNOM").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalFrequency {
    Hz60,
    Hz50,
}

impl NominalFrequency {
    pub fn as_hz(&self) -> f64 {
        match self {
            NominalFrequency::Hz60 => 60.0,
            NominalFrequency::Hz50 => 50.0,
        }
    }

    fn to_bits(self) -> u16 {
        match self {
            NominalFrequency::Hz60 => FNOM_60HZ,
            NominalFrequency::Hz50 => FNOM_50HZ,
        }
    }

    fn from_bits(bits: u16) -> Self {
        if bits & 1 == FNOM_50HZ {
            NominalFrequency::Hz50
        } else {
            NominalFrequency::Hz60
        }
    }
}

/// One PMU stream's configuration (spec §3, "Configuration entity").
#[derive(Debug, Clone, PartialEq)]
pub struct PmuStreamConfig {
    pub station_name: String,
    pub id_code: u16,
    pub format: DataFormat,
    pub phasor_names: Vec<String>,
    pub analog_names: Vec<String>,
    pub digital_names: Vec<String>,
    pub phasor_units: Vec<PhasorUnit>,
    pub analog_units: Vec<AnalogUnit>,
    pub digital_units: Vec<DigitalUnit>,
    pub nominal_frequency: NominalFrequency,
    pub config_change_count: u16,
}

impl PmuStreamConfig {
    pub fn phasor_count(&self) -> usize {
        self.phasor_names.len()
    }

    pub fn analog_count(&self) -> usize {
        self.analog_names.len()
    }

    pub fn digital_count(&self) -> usize {
        self.digital_names.len()
    }

    fn validate(&self) -> Result<(), PmuError> {
        if !(ID_CODE_MIN..=ID_CODE_MAX).contains(&self.id_code) {
            return Err(PmuError::FieldRange(format!(
                "stream id code {} out of range",
                self.id_code
            )));
        }
        if self.phasor_units.len() != self.phasor_names.len()
            || self.analog_units.len() != self.analog_names.len()
            || self.digital_units.len() != self.digital_names.len()
        {
            return Err(PmuError::StructuralMismatch(
                "unit list length does not match channel name count".to_string(),
            ));
        }
        for unit in &self.phasor_units {
            if unit.conversion_factor > 0x00FF_FFFF {
                return Err(PmuError::FieldRange(
                    "PHUNIT conversion factor exceeds 24 bits".to_string(),
                ));
            }
        }
        for unit in &self.analog_units {
            if unit.conversion_factor > 0x00FF_FFFF {
                return Err(PmuError::FieldRange(
                    "ANUNIT conversion factor exceeds 24 bits".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A complete configuration frame: global TIME_BASE/DATA_RATE plus one or
/// more stream configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFrame {
    /// 24-bit FRASEC fraction-of-second denominator.
    pub time_base: u32,
    /// Signed data rate: positive = frames/second, negative = seconds/frame.
    pub data_rate: i16,
    pub streams: Vec<PmuStreamConfig>,
}

/// Encodes the cfg1/cfg2 payload (TIME_BASE, NUM_PMU, streams, DATA_RATE).
pub fn encode_payload(cfg: &ConfigFrame) -> Result<Vec<u8>, PmuError> {
    if cfg.time_base > 0x00FF_FFFF {
        return Err(PmuError::FieldRange(
            "TIME_BASE exceeds 24-bit range".to_string(),
        ));
    }
    if cfg.streams.len() > u16::MAX as usize {
        return Err(PmuError::FieldRange("too many PMU streams".to_string()));
    }
    for stream in &cfg.streams {
        stream.validate()?;
    }

    let mut w = Writer::with_capacity(64 + cfg.streams.len() * 128);
    w.u32(cfg.time_base);
    w.u16(cfg.streams.len() as u16);

    for stream in &cfg.streams {
        w.ascii_fixed(&stream.station_name, STATION_NAME_LEN);
        w.u16(stream.id_code);
        let format_flags = pack_format(
            stream.format.polar,
            stream.format.phasor_float,
            stream.format.analog_float,
            stream.format.freq_float,
        );
        w.u16(format_flags as u16);
        w.u16(stream.phasor_count() as u16);
        w.u16(stream.analog_count() as u16);
        w.u16(stream.digital_count() as u16);

        for name in &stream.phasor_names {
            w.ascii_fixed(name, CHANNEL_NAME_LEN);
        }
        for name in &stream.analog_names {
            w.ascii_fixed(name, CHANNEL_NAME_LEN);
        }
        for name in &stream.digital_names {
            w.ascii_fixed(name, DIGITAL_NAME_LEN);
        }

        for unit in &stream.phasor_units {
            let type_byte = match unit.kind {
                PhasorUnitKind::Voltage => 0u32,
                PhasorUnitKind::Current => 1u32,
            };
            w.u32((type_byte << 24) | (unit.conversion_factor & 0x00FF_FFFF));
        }
        for unit in &stream.analog_units {
            w.u32(((unit.code as u32) << 24) | (unit.conversion_factor & 0x00FF_FFFF));
        }
        for unit in &stream.digital_units {
            w.u16(unit.valid_mask);
            w.u16(unit.current_mask);
        }

        w.u16(stream.nominal_frequency.to_bits());
        w.u16(stream.config_change_count);
    }

    w.i16(cfg.data_rate);

    Ok(w.into_vec())
}

/// Decodes a cfg1/cfg2 payload back into a [`ConfigFrame`].
pub fn decode_payload(bytes: &[u8]) -> Result<ConfigFrame, PmuError> {
    let mut r = Reader::new(bytes);

    let time_base_raw = r.u32()?;
    let time_base = time_base_raw & 0x00FF_FFFF;

    let num_pmu = r.u16()? as usize;
    let mut streams = Vec::with_capacity(num_pmu);

    for _ in 0..num_pmu {
        let station_name = r.ascii_fixed(STATION_NAME_LEN)?;
        let id_code = r.u16()?;
        let format = unpack_format((r.u16()? & 0x0F) as u8);
        let phnmr = r.u16()? as usize;
        let annmr = r.u16()? as usize;
        let dgnmr = r.u16()? as usize;

        let mut phasor_names = Vec::with_capacity(phnmr);
        for _ in 0..phnmr {
            phasor_names.push(r.ascii_fixed(CHANNEL_NAME_LEN)?);
        }
        let mut analog_names = Vec::with_capacity(annmr);
        for _ in 0..annmr {
            analog_names.push(r.ascii_fixed(CHANNEL_NAME_LEN)?);
        }
        let mut digital_names = Vec::with_capacity(dgnmr);
        for _ in 0..dgnmr {
            digital_names.push(r.ascii_fixed(DIGITAL_NAME_LEN)?);
        }

        let mut phasor_units = Vec::with_capacity(phnmr);
        for _ in 0..phnmr {
            let raw = r.u32()?;
            let kind = if (raw >> 24) & 0xFF == 0 {
                PhasorUnitKind::Voltage
            } else {
                PhasorUnitKind::Current
            };
            phasor_units.push(PhasorUnit {
                kind,
                conversion_factor: raw & 0x00FF_FFFF,
            });
        }
        let mut analog_units = Vec::with_capacity(annmr);
        for _ in 0..annmr {
            let raw = r.u32()?;
            analog_units.push(AnalogUnit {
                code: ((raw >> 24) & 0xFF) as u8,
                conversion_factor: raw & 0x00FF_FFFF,
            });
        }
        let mut digital_units = Vec::with_capacity(dgnmr);
        for _ in 0..dgnmr {
            let valid_mask = r.u16()?;
            let current_mask = r.u16()?;
            digital_units.push(DigitalUnit {
                valid_mask,
                current_mask,
            });
        }

        let fnom = r.u16()?;
        let cfgcnt = r.u16()?;

        streams.push(PmuStreamConfig {
            station_name,
            id_code,
            format,
            phasor_names,
            analog_names,
            digital_names,
            phasor_units,
            analog_units,
            digital_units,
            nominal_frequency: NominalFrequency::from_bits(fnom),
            config_change_count: cfgcnt,
        });
    }

    let data_rate = r.i16()?;

    if r.remaining() != 0 {
        return Err(PmuError::StructuralMismatch(format!(
            "{} trailing bytes after configuration payload",
            r.remaining()
        )));
    }

    Ok(ConfigFrame {
        time_base,
        data_rate,
        streams,
    })
}

/// Encodes a full cfg1/cfg2 frame (envelope + payload + CRC).
pub fn encode(
    frame_type: u8,
    version: u8,
    id_code: u16,
    soc: Option<u32>,
    frasec: Option<u32>,
    cfg: &ConfigFrame,
) -> Result<Vec<u8>, PmuError> {
    let payload = encode_payload(cfg)?;
    envelope::encode(frame_type, version, id_code, soc, frasec, &payload)
}

/// Decodes a full cfg1/cfg2 frame, returning the envelope and parsed config.
pub fn decode(bytes: &[u8]) -> Result<(Envelope, ConfigFrame), PmuError> {
    let (envelope, payload) = envelope::decode(bytes)?;
    let cfg = decode_payload(payload)?;
    Ok((envelope, cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FRAME_TYPE_CFG1;

    fn sample_stream() -> PmuStreamConfig {
        PmuStreamConfig {
            station_name: "STATION1".to_string(),
            id_code: 1,
            format: DataFormat {
                polar: true,
                phasor_float: false,
                analog_float: false,
                freq_float: false,
            },
            phasor_names: vec!["VA".to_string(), "VB".to_string()],
            analog_names: vec!["PWR".to_string()],
            digital_names: vec!["STATUS".to_string()],
            phasor_units: vec![
                PhasorUnit {
                    kind: PhasorUnitKind::Voltage,
                    conversion_factor: 100_000,
                },
                PhasorUnit {
                    kind: PhasorUnitKind::Voltage,
                    conversion_factor: 100_000,
                },
            ],
            analog_units: vec![AnalogUnit {
                code: 0,
                conversion_factor: 1,
            }],
            digital_units: vec![DigitalUnit {
                valid_mask: 0xFFFF,
                current_mask: 0x0000,
            }],
            nominal_frequency: NominalFrequency::Hz60,
            config_change_count: 0,
        }
    }

    fn sample_config() -> ConfigFrame {
        ConfigFrame {
            time_base: 1_000_000,
            data_rate: 30,
            streams: vec![sample_stream()],
        }
    }

    #[test]
    fn payload_roundtrip() {
        let cfg = sample_config();
        let bytes = encode_payload(&cfg).unwrap();
        let decoded = decode_payload(&bytes).unwrap();
        assert_eq!(decoded, cfg);
    }

    #[test]
    fn full_frame_roundtrip() {
        let cfg = sample_config();
        let bytes = encode(FRAME_TYPE_CFG1, 1, 7, None, None, &cfg).unwrap();
        let (envelope, decoded) = decode(&bytes).unwrap();
        assert_eq!(envelope.frame_type, FRAME_TYPE_CFG1);
        assert_eq!(decoded, cfg);
    }

    #[test]
    fn rejects_mismatched_unit_counts() {
        let mut stream = sample_stream();
        stream.phasor_units.pop();
        let cfg = ConfigFrame {
            time_base: 1_000_000,
            data_rate: 30,
            streams: vec![stream],
        };
        assert!(encode_payload(&cfg).is_err());
    }

    #[test]
    fn multi_stream_roundtrip() {
        let cfg = ConfigFrame {
            time_base: 1_000_000,
            data_rate: -2,
            streams: vec![sample_stream(), sample_stream()],
        };
        let bytes = encode_payload(&cfg).unwrap();
        let decoded = decode_payload(&bytes).unwrap();
        assert_eq!(decoded.streams.len(), 2);
    }
}
