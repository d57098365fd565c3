//! Data frame: per-stream STAT, phasors, freq/dfreq, analog, digital values
//! (spec §3, "Data entity"; spec §4.6).
//!
//! Decoding a data frame requires the matching [`ConfigFrame`] — there is
//! no ambient state, no ability to self-describe field widths (spec §9,
//! "Configuration-dependent decoding"). [`get_measurements`] is the only
//! place unit conversion happens; everything upstream of it deals in raw
//! wire values.

use crate::constants::{FRAME_TYPE_DATA, PHUNIT_SCALE};
use crate::error::PmuError;
use crate::frame::config::ConfigFrame;
use crate::frame::envelope::{self, Envelope};
use crate::frame::stat::Stat;
use crate::frame::time_quality::unpack_frasec;
use crate::util::bigend::{Reader, Writer};

/// One decoded phasor, still in its on-wire representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPhasor {
    PolarInt { magnitude: u16, angle: i16 },
    PolarFloat { magnitude: f32, angle: f32 },
    RectInt { re: i16, im: i16 },
    RectFloat { re: f32, im: f32 },
}

/// A freq/dfreq field in its on-wire representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarField {
    Int(i16),
    Float(f32),
}

/// An analog channel value in its on-wire representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalogValue {
    Int(i16),
    Float(f32),
}

/// One PMU stream's data block.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamData {
    pub stat: Stat,
    pub phasors: Vec<RawPhasor>,
    pub freq: ScalarField,
    pub dfreq: ScalarField,
    pub analogs: Vec<AnalogValue>,
    pub digitals: Vec<u16>,
}

/// A complete data frame: SOC/FRASEC (needed for absolute timestamps in
/// [`get_measurements`]) plus one block per configured stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub soc: u32,
    pub frasec: u32,
    pub streams: Vec<StreamData>,
}

const POLAR_ANGLE_SCALE: f64 = 1.0e-4;
const POLAR_ANGLE_RAW_MAX: i32 = 31_416;
const DFREQ_INT_SCALE: f64 = 1.0e-2;
const FREQ_INT_SCALE: f64 = 1.0e-3;

/// Encodes a data-frame payload (no envelope) against `cfg`.
pub fn encode_payload(data: &DataFrame, cfg: &ConfigFrame) -> Result<Vec<u8>, PmuError> {
    if data.streams.len() != cfg.streams.len() {
        return Err(PmuError::StructuralMismatch(format!(
            "data frame has {} streams, configuration has {}",
            data.streams.len(),
            cfg.streams.len()
        )));
    }

    let mut w = Writer::with_capacity(256 * cfg.streams.len().max(1));

    for (stream, stream_cfg) in data.streams.iter().zip(cfg.streams.iter()) {
        if stream.phasors.len() != stream_cfg.phasor_count() {
            return Err(PmuError::StructuralMismatch(format!(
                "stream {} has {} phasors, configuration declares {}",
                stream_cfg.id_code,
                stream.phasors.len(),
                stream_cfg.phasor_count()
            )));
        }
        if stream.analogs.len() != stream_cfg.analog_count() {
            return Err(PmuError::StructuralMismatch(format!(
                "stream {} has {} analogs, configuration declares {}",
                stream_cfg.id_code,
                stream.analogs.len(),
                stream_cfg.analog_count()
            )));
        }
        if stream.digitals.len() != stream_cfg.digital_count() {
            return Err(PmuError::StructuralMismatch(format!(
                "stream {} has {} digitals, configuration declares {}",
                stream_cfg.id_code,
                stream.digitals.len(),
                stream_cfg.digital_count()
            )));
        }

        w.u16(stream.stat.pack()?);

        let fmt = &stream_cfg.format;
        for phasor in &stream.phasors {
            write_phasor(&mut w, phasor, fmt.polar, fmt.phasor_float)?;
        }

        write_scalar(&mut w, &stream.freq, fmt.freq_float)?;
        write_scalar_as(&mut w, &stream.dfreq, fmt.freq_float)?;

        for analog in &stream.analogs {
            write_analog(&mut w, analog, fmt.analog_float)?;
        }

        for &digital in &stream.digitals {
            w.u16(digital);
        }
    }

    Ok(w.into_vec())
}

fn write_phasor(
    w: &mut Writer,
    phasor: &RawPhasor,
    polar: bool,
    float: bool,
) -> Result<(), PmuError> {
    match (phasor, polar, float) {
        (RawPhasor::PolarInt { magnitude, angle }, true, false) => {
            if (*angle as i32).abs() > POLAR_ANGLE_RAW_MAX {
                return Err(PmuError::FieldRange(format!(
                    "polar-int phasor angle {angle} exceeds +-{POLAR_ANGLE_RAW_MAX}"
                )));
            }
            w.u16(*magnitude);
            w.i16(*angle);
            Ok(())
        }
        (RawPhasor::PolarFloat { magnitude, angle }, true, true) => {
            if angle.abs() > std::f32::consts::PI {
                return Err(PmuError::FieldRange(format!(
                    "polar-float phasor angle {angle} outside +-pi"
                )));
            }
            w.f32(*magnitude);
            w.f32(*angle);
            Ok(())
        }
        (RawPhasor::RectInt { re, im }, false, false) => {
            w.i16(*re);
            w.i16(*im);
            Ok(())
        }
        (RawPhasor::RectFloat { re, im }, false, true) => {
            w.f32(*re);
            w.f32(*im);
            Ok(())
        }
        _ => Err(PmuError::StructuralMismatch(
            "phasor representation does not match stream's data-format flags".to_string(),
        )),
    }
}

fn write_scalar(w: &mut Writer, field: &ScalarField, float: bool) -> Result<(), PmuError> {
    match (field, float) {
        (ScalarField::Int(v), false) => {
            w.i16(*v);
            Ok(())
        }
        (ScalarField::Float(v), true) => {
            w.f32(*v);
            Ok(())
        }
        _ => Err(PmuError::StructuralMismatch(
            "freq/dfreq representation does not match stream's data-format flags".to_string(),
        )),
    }
}

fn write_scalar_as(w: &mut Writer, field: &ScalarField, float: bool) -> Result<(), PmuError> {
    write_scalar(w, field, float)
}

fn write_analog(w: &mut Writer, value: &AnalogValue, float: bool) -> Result<(), PmuError> {
    match (value, float) {
        (AnalogValue::Int(v), false) => {
            w.i16(*v);
            Ok(())
        }
        (AnalogValue::Float(v), true) => {
            w.f32(*v);
            Ok(())
        }
        _ => Err(PmuError::StructuralMismatch(
            "analog representation does not match stream's data-format flags".to_string(),
        )),
    }
}

/// Decodes a data-frame payload against `cfg`, given the envelope's SOC and
/// FRASEC (needed later for absolute timestamps).
pub fn decode_payload(
    bytes: &[u8],
    cfg: &ConfigFrame,
    soc: u32,
    frasec: u32,
) -> Result<DataFrame, PmuError> {
    let mut r = Reader::new(bytes);
    let mut streams = Vec::with_capacity(cfg.streams.len());

    for stream_cfg in &cfg.streams {
        let stat = Stat::unpack(r.u16()?);
        let fmt = &stream_cfg.format;

        let mut phasors = Vec::with_capacity(stream_cfg.phasor_count());
        for _ in 0..stream_cfg.phasor_count() {
            phasors.push(read_phasor(&mut r, fmt.polar, fmt.phasor_float)?);
        }

        let freq = read_scalar(&mut r, fmt.freq_float)?;
        let dfreq = read_scalar(&mut r, fmt.freq_float)?;

        let mut analogs = Vec::with_capacity(stream_cfg.analog_count());
        for _ in 0..stream_cfg.analog_count() {
            analogs.push(read_analog(&mut r, fmt.analog_float)?);
        }

        let mut digitals = Vec::with_capacity(stream_cfg.digital_count());
        for _ in 0..stream_cfg.digital_count() {
            digitals.push(r.u16()?);
        }

        streams.push(StreamData {
            stat,
            phasors,
            freq,
            dfreq,
            analogs,
            digitals,
        });
    }

    if r.remaining() != 0 {
        return Err(PmuError::StructuralMismatch(format!(
            "{} trailing bytes after data payload",
            r.remaining()
        )));
    }

    Ok(DataFrame {
        soc,
        frasec,
        streams,
    })
}

fn read_phasor(r: &mut Reader, polar: bool, float: bool) -> Result<RawPhasor, PmuError> {
    match (polar, float) {
        (true, false) => {
            let magnitude = r.u16()?;
            let angle = r.i16()?;
            if (angle as i32).abs() > POLAR_ANGLE_RAW_MAX {
                return Err(PmuError::FieldRange(format!(
                    "polar-int phasor angle {angle} exceeds +-{POLAR_ANGLE_RAW_MAX}"
                )));
            }
            Ok(RawPhasor::PolarInt { magnitude, angle })
        }
        (true, true) => {
            let magnitude = r.f32()?;
            let angle = r.f32()?;
            if angle.abs() > std::f32::consts::PI {
                return Err(PmuError::FieldRange(format!(
                    "polar-float phasor angle {angle} outside +-pi"
                )));
            }
            Ok(RawPhasor::PolarFloat { magnitude, angle })
        }
        (false, false) => {
            let re = r.i16()?;
            let im = r.i16()?;
            Ok(RawPhasor::RectInt { re, im })
        }
        (false, true) => {
            let re = r.f32()?;
            let im = r.f32()?;
            Ok(RawPhasor::RectFloat { re, im })
        }
    }
}

fn read_scalar(r: &mut Reader, float: bool) -> Result<ScalarField, PmuError> {
    if float {
        Ok(ScalarField::Float(r.f32()?))
    } else {
        Ok(ScalarField::Int(r.i16()?))
    }
}

fn read_analog(r: &mut Reader, float: bool) -> Result<AnalogValue, PmuError> {
    if float {
        Ok(AnalogValue::Float(r.f32()?))
    } else {
        Ok(AnalogValue::Int(r.i16()?))
    }
}

/// Encodes a complete data frame (envelope + payload + CRC).
pub fn encode(
    version: u8,
    id_code: u16,
    soc: Option<u32>,
    frasec: Option<u32>,
    data: &DataFrame,
    cfg: &ConfigFrame,
) -> Result<Vec<u8>, PmuError> {
    let payload = encode_payload(data, cfg)?;
    envelope::encode(FRAME_TYPE_DATA, version, id_code, soc, frasec, &payload)
}

/// Decodes a complete data frame, returning the envelope and parsed data.
pub fn decode(bytes: &[u8], cfg: &ConfigFrame) -> Result<(Envelope, DataFrame), PmuError> {
    let (envelope, payload) = envelope::decode(bytes)?;
    let data = decode_payload(payload, cfg, envelope.soc, envelope.frasec)?;
    Ok((envelope, data))
}

/// Engineering-unit measurements for one stream, as returned by
/// [`get_measurements`] (spec §4.6, "Decoding contract").
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMeasurement {
    pub stream_id: u16,
    pub time_seconds: f64,
    pub stat: Stat,
    /// `(magnitude, angle_radians)` per phasor, in configured engineering units.
    pub phasors: Vec<(f64, f64)>,
    pub frequency_hz: f64,
    pub rocof: f64,
    pub analogs: Vec<f64>,
    pub digitals: Vec<u16>,
}

/// Converts a decoded [`DataFrame`] into per-stream engineering-unit
/// measurements (spec §4.6, "Decoding contract").
pub fn get_measurements(
    data: &DataFrame,
    cfg: &ConfigFrame,
) -> Result<Vec<StreamMeasurement>, PmuError> {
    if data.streams.len() != cfg.streams.len() {
        return Err(PmuError::StructuralMismatch(format!(
            "data frame has {} streams, configuration has {}",
            data.streams.len(),
            cfg.streams.len()
        )));
    }

    let frasec = unpack_frasec(data.frasec);
    let time_seconds = data.soc as f64 + frasec.fraction as f64 / cfg.time_base as f64;

    let mut out = Vec::with_capacity(data.streams.len());
    for (stream, stream_cfg) in data.streams.iter().zip(cfg.streams.iter()) {
        let mut phasors = Vec::with_capacity(stream.phasors.len());
        for (phasor, unit) in stream.phasors.iter().zip(stream_cfg.phasor_units.iter()) {
            phasors.push(phasor_to_polar(phasor, unit.conversion_factor));
        }

        let frequency_hz = match stream.freq {
            ScalarField::Int(v) => stream_cfg.nominal_frequency.as_hz() + v as f64 * FREQ_INT_SCALE,
            ScalarField::Float(v) => v as f64,
        };
        let rocof = match stream.dfreq {
            ScalarField::Int(v) => v as f64 * DFREQ_INT_SCALE,
            ScalarField::Float(v) => v as f64,
        };

        let analogs = stream
            .analogs
            .iter()
            .map(|value| match value {
                AnalogValue::Int(v) => *v as f64,
                AnalogValue::Float(v) => *v as f64,
            })
            .collect();

        out.push(StreamMeasurement {
            stream_id: stream_cfg.id_code,
            time_seconds,
            stat: stream.stat,
            phasors,
            frequency_hz,
            rocof,
            analogs,
            digitals: stream.digitals.clone(),
        });
    }

    Ok(out)
}

fn phasor_to_polar(phasor: &RawPhasor, conversion_factor: u32) -> (f64, f64) {
    let scale = conversion_factor as f64 * PHUNIT_SCALE;
    match *phasor {
        RawPhasor::PolarInt { magnitude, angle } => {
            (magnitude as f64 * scale, angle as f64 * POLAR_ANGLE_SCALE)
        }
        RawPhasor::PolarFloat { magnitude, angle } => (magnitude as f64, angle as f64),
        RawPhasor::RectInt { re, im } => {
            let re = re as f64 * scale;
            let im = im as f64 * scale;
            ((re * re + im * im).sqrt(), im.atan2(re))
        }
        RawPhasor::RectFloat { re, im } => {
            let re = re as f64;
            let im = im as f64;
            ((re * re + im * im).sqrt(), im.atan2(re))
        }
    }
}
