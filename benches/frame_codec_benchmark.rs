//! Throughput benchmark for the frame codec's hot path: encoding and
//! decoding a single-stream data frame.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pmu_sync::frame::config::{
    AnalogUnit, ConfigFrame, DigitalUnit, NominalFrequency, PhasorUnit, PhasorUnitKind,
    PmuStreamConfig,
};
use pmu_sync::frame::data::{decode_payload, encode_payload, AnalogValue, DataFrame, RawPhasor, ScalarField, StreamData};
use pmu_sync::frame::format::DataFormat;
use pmu_sync::frame::stat::Stat;

fn sample_config() -> ConfigFrame {
    ConfigFrame {
        time_base: 1_000_000,
        data_rate: 30,
        streams: vec![PmuStreamConfig {
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
            digital_names: vec!["ST".to_string()],
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
                conversion_factor: 100_000,
            }],
            digital_units: vec![DigitalUnit {
                valid_mask: 0xFFFF,
                current_mask: 0,
            }],
            nominal_frequency: NominalFrequency::Hz60,
            config_change_count: 0,
        }],
    }
}

fn sample_data() -> DataFrame {
    DataFrame {
        soc: 0x6000_0000,
        frasec: 0,
        streams: vec![StreamData {
            stat: Stat::unpack(0),
            phasors: vec![
                RawPhasor::PolarInt {
                    magnitude: 12345,
                    angle: 31415,
                },
                RawPhasor::PolarInt {
                    magnitude: 30000,
                    angle: -31415,
                },
            ],
            freq: ScalarField::Int(2500),
            dfreq: ScalarField::Int(100),
            analogs: vec![AnalogValue::Int(-123)],
            digitals: vec![0xFFFF],
        }],
    }
}

fn bench_encode(c: &mut Criterion) {
    let cfg = sample_config();
    let data = sample_data();
    c.bench_function("encode_data_payload", |b| {
        b.iter(|| encode_payload(black_box(&data), black_box(&cfg)).unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let cfg = sample_config();
    let data = sample_data();
    let bytes = encode_payload(&data, &cfg).unwrap();
    c.bench_function("decode_data_payload", |b| {
        b.iter(|| decode_payload(black_box(&bytes), black_box(&cfg), data.soc, data.frasec).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
