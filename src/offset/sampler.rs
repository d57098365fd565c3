//! Computes a clock-offset sample from a client frame's `(SOC, FRASEC)`
//! against the server's own clock (spec §4.9).

use crate::frame::time_quality::unpack_frasec;

const US_PER_SECOND: i64 = 1_000_000;

/// One clock-offset sample, in microseconds: positive means the server's
/// clock reads ahead of the client's.
pub fn sample_offset_us(
    client_soc: u32,
    client_frasec: u32,
    server_soc: u32,
    server_frasec: u32,
    time_base: u32,
) -> i64 {
    let client_frac_us = fraction_to_us(client_frasec, time_base);
    let server_frac_us = fraction_to_us(server_frasec, time_base);

    let mut delta_soc = server_soc as i64 - client_soc as i64;
    let mut delta_frac = server_frac_us - client_frac_us;

    if delta_frac < -US_PER_SECOND {
        delta_frac += US_PER_SECOND;
        delta_soc -= 1;
    } else if delta_frac > US_PER_SECOND {
        delta_frac -= US_PER_SECOND;
        delta_soc += 1;
    }

    delta_soc * US_PER_SECOND + delta_frac
}

fn fraction_to_us(frasec: u32, time_base: u32) -> i64 {
    let fraction = unpack_frasec(frasec).fraction as i64;
    if time_base == 0 {
        return 0;
    }
    fraction * US_PER_SECOND / time_base as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::time_quality::{pack_frasec, LeapDirection};

    fn frasec(fraction: u32) -> u32 {
        pack_frasec(fraction, LeapDirection::Add, false, false, 0).unwrap()
    }

    #[test]
    fn zero_offset_when_clocks_match() {
        let sample = sample_offset_us(1000, frasec(500_000), 1000, frasec(500_000), 1_000_000);
        assert_eq!(sample, 0);
    }

    #[test]
    fn positive_offset_when_server_ahead() {
        let sample = sample_offset_us(1000, frasec(0), 1000, frasec(250_000), 1_000_000);
        assert_eq!(sample, 250_000);
    }

    #[test]
    fn borrow_across_second_boundary() {
        // client at 999_900_000us fraction, server at 1000 + 100us: server is
        // 200us ahead once the second rolls over.
        let sample = sample_offset_us(999, frasec(900_000), 1000, frasec(100_000), 1_000_000);
        assert_eq!(sample, 200_000);
    }

    #[test]
    fn carry_across_second_boundary_other_direction() {
        let sample = sample_offset_us(1000, frasec(100_000), 999, frasec(900_000), 1_000_000);
        assert_eq!(sample, -200_000);
    }
}
