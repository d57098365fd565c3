//! Data-format width sensitivity (spec §8, scenario 4).

use pmu_sync::frame::format::{pack_format, unpack_format};

#[test]
fn all_integer_vs_all_float_widths() {
    let ints = unpack_format(0b0000);
    assert_eq!((ints.phasor_width(), ints.analog_width(), ints.freq_width()), (4, 2, 2));

    let floats = unpack_format(pack_format(true, true, true, true));
    assert_eq!((floats.phasor_width(), floats.analog_width(), floats.freq_width()), (8, 4, 4));
}
