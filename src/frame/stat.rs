//! STAT: the 16-bit per-stream status word carried by every data frame
//! (spec §3, "STAT word invariants").
//!
//! ```text
//! bit  15..14  13      12      11      10      9       8..6    5..4    3..0
//!      status  unsync  sorted  trig    cfgchg  datamod tq      unlock  reason
//! ```

use crate::error::PmuError;

/// Overall measurement status (bits 15..14).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementStatus {
    Ok,
    Error,
    Test,
    VError,
}

impl MeasurementStatus {
    fn from_bits(bits: u16) -> Self {
        match bits {
            0 => MeasurementStatus::Ok,
            1 => MeasurementStatus::Error,
            2 => MeasurementStatus::Test,
            _ => MeasurementStatus::VError,
        }
    }

    fn to_bits(self) -> u16 {
        match self {
            MeasurementStatus::Ok => 0,
            MeasurementStatus::Error => 1,
            MeasurementStatus::Test => 2,
            MeasurementStatus::VError => 3,
        }
    }
}

/// Time-since-unlock bucket (bits 5..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockedTimeBucket {
    UnderTenSeconds,
    UnderHundredSeconds,
    UnderThousandSeconds,
    OverThousandSeconds,
}

impl UnlockedTimeBucket {
    fn from_bits(bits: u16) -> Self {
        match bits {
            0 => UnlockedTimeBucket::UnderTenSeconds,
            1 => UnlockedTimeBucket::UnderHundredSeconds,
            2 => UnlockedTimeBucket::UnderThousandSeconds,
            _ => UnlockedTimeBucket::OverThousandSeconds,
        }
    }

    fn to_bits(self) -> u16 {
        match self {
            UnlockedTimeBucket::UnderTenSeconds => 0,
            UnlockedTimeBucket::UnderHundredSeconds => 1,
            UnlockedTimeBucket::UnderThousandSeconds => 2,
            UnlockedTimeBucket::OverThousandSeconds => 3,
        }
    }
}

/// Decoded STAT word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub status: MeasurementStatus,
    pub unsynchronized: bool,
    pub sorted_by_arrival: bool,
    pub trigger: bool,
    pub config_changed: bool,
    pub data_modified: bool,
    /// 3-bit time-quality bucket, as reported in the data stream.
    pub time_quality_bucket: u8,
    pub unlocked_time: UnlockedTimeBucket,
    /// 4-bit trigger-reason enumeration (8 defined values, one reserved).
    pub trigger_reason: u8,
}

impl Stat {
    pub fn pack(&self) -> Result<u16, PmuError> {
        if self.time_quality_bucket > 0b111 {
            return Err(PmuError::FieldRange(format!(
                "STAT time-quality bucket {} exceeds 3 bits",
                self.time_quality_bucket
            )));
        }
        if self.trigger_reason > 0x0F {
            return Err(PmuError::FieldRange(format!(
                "STAT trigger reason {} exceeds 4 bits",
                self.trigger_reason
            )));
        }

        let mut word = self.status.to_bits() << 14;
        if self.unsynchronized {
            word |= 1 << 13;
        }
        if self.sorted_by_arrival {
            word |= 1 << 12;
        }
        if self.trigger {
            word |= 1 << 11;
        }
        if self.config_changed {
            word |= 1 << 10;
        }
        if self.data_modified {
            word |= 1 << 9;
        }
        word |= (self.time_quality_bucket as u16 & 0b111) << 6;
        word |= self.unlocked_time.to_bits() << 4;
        word |= self.trigger_reason as u16 & 0x0F;
        Ok(word)
    }

    pub fn unpack(word: u16) -> Self {
        Stat {
            status: MeasurementStatus::from_bits((word >> 14) & 0b11),
            unsynchronized: word & (1 << 13) != 0,
            sorted_by_arrival: word & (1 << 12) != 0,
            trigger: word & (1 << 11) != 0,
            config_changed: word & (1 << 10) != 0,
            data_modified: word & (1 << 9) != 0,
            time_quality_bucket: ((word >> 6) & 0b111) as u8,
            unlocked_time: UnlockedTimeBucket::from_bits((word >> 4) & 0b11),
            trigger_reason: (word & 0x0F) as u8,
        }
    }
}
