//! Data frame round-trip law, including the rectangular/angle-conversion
//! property from spec §8 ("Angle conversions").

use pmu_sync::frame::config::{
    AnalogUnit, ConfigFrame, DigitalUnit, NominalFrequency, PhasorUnit, PhasorUnitKind,
    PmuStreamConfig,
};
use pmu_sync::frame::data::{decode_payload, encode_payload, get_measurements, DataFrame, RawPhasor, ScalarField, StreamData};
use pmu_sync::frame::format::DataFormat;
use pmu_sync::frame::stat::Stat;

fn rect_config() -> ConfigFrame {
    ConfigFrame {
        time_base: 1_000_000,
        data_rate: 30,
        streams: vec![PmuStreamConfig {
            station_name: "STATION1".to_string(),
            id_code: 1,
            format: DataFormat {
                polar: false,
                phasor_float: false,
                analog_float: false,
                freq_float: false,
            },
            phasor_names: vec!["VA".to_string()],
            analog_names: vec![],
            digital_names: vec![],
            phasor_units: vec![PhasorUnit {
                kind: PhasorUnitKind::Voltage,
                conversion_factor: 1,
            }],
            analog_units: vec![],
            digital_units: vec![],
            nominal_frequency: NominalFrequency::Hz60,
            config_change_count: 0,
        }],
    }
}

#[test]
fn decode_data_of_encode_data_is_identity() {
    let cfg = rect_config();
    let data = DataFrame {
        soc: 10,
        frasec: 0,
        streams: vec![StreamData {
            stat: Stat::unpack(0),
            phasors: vec![RawPhasor::RectInt { re: 3, im: 4 }],
            freq: ScalarField::Int(0),
            dfreq: ScalarField::Int(0),
            analogs: vec![],
            digitals: vec![],
        }],
    };

    let bytes = encode_payload(&data, &cfg).unwrap();
    let decoded = decode_payload(&bytes, &cfg, data.soc, data.frasec).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn rectangular_phasor_matches_magnitude_angle_formula() {
    let cfg = rect_config();
    let data = DataFrame {
        soc: 10,
        frasec: 0,
        streams: vec![StreamData {
            stat: Stat::unpack(0),
            phasors: vec![RawPhasor::RectInt { re: 3, im: 4 }],
            freq: ScalarField::Int(0),
            dfreq: ScalarField::Int(0),
            analogs: vec![],
            digitals: vec![],
        }],
    };

    let measurements = get_measurements(&data, &cfg).unwrap();
    let (magnitude, angle) = measurements[0].phasors[0];
    assert!((magnitude - 5.0).abs() < 1e-9);
    assert!((angle - (4.0f64).atan2(3.0)).abs() < 1e-9);
}

#[test]
fn structural_mismatch_on_wrong_phasor_count() {
    use pmu_sync::PmuError;

    let cfg = rect_config();
    let data = DataFrame {
        soc: 0,
        frasec: 0,
        streams: vec![StreamData {
            stat: Stat::unpack(0),
            phasors: vec![], // cfg declares 1 phasor
            freq: ScalarField::Int(0),
            dfreq: ScalarField::Int(0),
            analogs: vec![],
            digitals: vec![],
        }],
    };

    assert!(matches!(
        encode_payload(&data, &cfg),
        Err(PmuError::StructuralMismatch(_))
    ));
}
