//! Data-format flag: the 4 significant bits of a PMU stream's `FORMAT`
//! field that control phasor representation and field widths
//! (spec §3, "Data-format flag"; spec §4.4).

/// Decoded data-format flags for one PMU stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFormat {
    /// Phasor representation: polar (true) or rectangular (false).
    pub polar: bool,
    /// Phasor width: 32-bit float (true) or 16-bit integer (false).
    pub phasor_float: bool,
    /// Analog width: 32-bit float (true) or 16-bit integer (false).
    pub analog_float: bool,
    /// Freq/dfreq width: 32-bit float (true) or 16-bit integer (false).
    pub freq_float: bool,
}

impl DataFormat {
    pub fn phasor_width(&self) -> usize {
        if self.phasor_float {
            8
        } else {
            4
        }
    }

    pub fn analog_width(&self) -> usize {
        if self.analog_float {
            4
        } else {
            2
        }
    }

    pub fn freq_width(&self) -> usize {
        if self.freq_float {
            4
        } else {
            2
        }
    }
}

/// Packs the four booleans into the low 4 bits of a format byte.
pub fn pack_format(polar: bool, phasor_float: bool, analog_float: bool, freq_float: bool) -> u8 {
    let mut flags = 0u8;
    if polar {
        flags |= 0b0001;
    }
    if phasor_float {
        flags |= 0b0010;
    }
    if analog_float {
        flags |= 0b0100;
    }
    if freq_float {
        flags |= 0b1000;
    }
    flags
}

/// Unpacks the low 4 bits of a format byte into [`DataFormat`].
pub fn unpack_format(flags: u8) -> DataFormat {
    DataFormat {
        polar: flags & 0b0001 != 0,
        phasor_float: flags & 0b0010 != 0,
        analog_float: flags & 0b0100 != 0,
        freq_float: flags & 0b1000 != 0,
    }
}
