//! Report encoding for the CH650 display.
//!
//! Report structure (11 bytes):
//! - Byte 0: 0x10 (report id)
//! - Byte 1: CPU indicator (170 start, 19 celsius, 76 usage)
//! - Byte 2: CPU load green bar (0-10)
//! - Bytes 3-5: CPU value digits, right-aligned
//! - Byte 6: GPU indicator, always equal to byte 1
//! - Byte 7: GPU load green bar (0-10)
//! - Bytes 8-10: GPU digits, right-aligned. Temperature mode shows the gpu
//!   value, usage mode shows the gpu load.

use deepcool_sync_core::{Mode, Sample};

use crate::digits::Digits;
use crate::types::Indicator;

/// Length of every report
pub const REPORT_LEN: usize = 11;

/// Report id leading every frame
pub const MARKER: u8 = 0x10;

/// Byte offsets within a report
pub mod offset {
    pub const CPU_INDICATOR: usize = 1;
    pub const CPU_BAR: usize = 2;
    pub const CPU_DIGITS: usize = 3;
    pub const GPU_INDICATOR: usize = 6;
    pub const GPU_BAR: usize = 7;
    pub const GPU_DIGITS: usize = 8;
}

/// Quantize a load percentage into the 10 segment green bar.
///
/// 1-10% lights one segment, 91-100% lights all ten. An idle load lights none,
/// and anything above 100% is shown as full.
pub fn green_bar(load: u8) -> u8 {
    match load.min(100) {
        0 => 0,
        load => (load - 1) / 10 + 1,
    }
}

/// Write digits into the three slots starting at `start`.
/// `Digits` is zero padded, so 1 and 2 digit values land in the trailing slots.
fn place(buf: &mut [u8; REPORT_LEN], start: usize, digits: Digits) {
    buf[start..start + 3].copy_from_slice(&digits.to_bytes());
}

/// Construct a report for the given mode and readings.
///
/// Values above 999 are shown as 999.
pub fn report(
    mode: Mode,
    cpu_value: u16,
    cpu_load: u8,
    gpu_value: u16,
    gpu_load: u8,
) -> [u8; REPORT_LEN] {
    let indicator = Indicator::from(mode).to_byte();

    let mut buf = [0u8; REPORT_LEN];
    buf[0] = MARKER;
    buf[offset::CPU_INDICATOR] = indicator;
    buf[offset::GPU_INDICATOR] = indicator;
    buf[offset::CPU_BAR] = green_bar(cpu_load);
    buf[offset::GPU_BAR] = green_bar(gpu_load);

    let gpu_digits = match mode {
        // handshake never carries digits
        Mode::Start => return buf,
        Mode::Temperature => gpu_value,
        Mode::Usage => gpu_load.into(),
    };
    place(&mut buf, offset::CPU_DIGITS, Digits::saturating(cpu_value));
    place(&mut buf, offset::GPU_DIGITS, Digits::saturating(gpu_digits));

    buf
}

/// Construct a report from a sample
#[inline(always)]
pub fn encode(sample: &Sample) -> [u8; REPORT_LEN] {
    report(
        sample.mode,
        sample.cpu_value,
        sample.cpu_load,
        sample.gpu_value,
        sample.gpu_load,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn green_bar_buckets() {
        for load in 1..=100u8 {
            assert_eq!(green_bar(load), (load - 1) / 10 + 1, "load {load}");
        }
        assert_eq!(green_bar(1), 1);
        assert_eq!(green_bar(10), 1);
        assert_eq!(green_bar(11), 2);
        assert_eq!(green_bar(91), 10);
        assert_eq!(green_bar(100), 10);
    }

    #[test]
    fn green_bar_out_of_range() {
        assert_eq!(green_bar(0), 0);
        assert_eq!(green_bar(101), 10);
        assert_eq!(green_bar(u8::MAX), 10);
    }

    #[test]
    fn start_frame() {
        let buf = report(Mode::Start, 45, 50, 68, 30);
        assert_eq!(buf, [16, 170, 5, 0, 0, 0, 170, 3, 0, 0, 0]);
        for value in [0, 7, 999, 1000, u16::MAX] {
            let buf = report(Mode::Start, value, 100, value, 1);
            assert_eq!(buf, [16, 170, 10, 0, 0, 0, 170, 1, 0, 0, 0], "value {value}");
        }
        assert_eq!(
            encode(&Sample::start()),
            [16, 170, 0, 0, 0, 0, 170, 0, 0, 0, 0]
        );
    }

    #[test]
    fn temperature_frame() {
        assert_eq!(
            report(Mode::Temperature, 45, 50, 68, 30),
            [16, 19, 5, 0, 4, 5, 19, 3, 0, 6, 8]
        );
    }

    #[test]
    fn temperature_three_and_one_digits() {
        let buf = report(Mode::Temperature, 100, 50, 5, 10);
        assert_eq!(buf[3..6], [1, 0, 0]);
        assert_eq!(buf[8..11], [0, 0, 5]);
    }

    #[test]
    fn usage_frame_shows_gpu_load() {
        let buf = report(Mode::Usage, 7, 7, 99, 42);
        assert_eq!(buf, [16, 76, 1, 0, 0, 7, 76, 5, 0, 4, 2]);
    }

    #[test]
    fn usage_full_load() {
        let buf = report(Mode::Usage, 100, 100, 0, 100);
        assert_eq!(buf, [16, 76, 10, 1, 0, 0, 76, 10, 1, 0, 0]);
    }

    #[test]
    fn oversized_values_saturate() {
        let buf = report(Mode::Temperature, 1234, 50, u16::MAX, 50);
        assert_eq!(buf[3..6], [9, 9, 9]);
        assert_eq!(buf[8..11], [9, 9, 9]);
    }

    #[test]
    fn encoding_is_pure() {
        let sample = Sample {
            mode: Mode::Temperature,
            cpu_value: 61,
            cpu_load: 23,
            gpu_value: 54,
            gpu_load: 88,
        };
        assert_eq!(encode(&sample), encode(&sample));
        assert_eq!(encode(&sample), report(Mode::Temperature, 61, 23, 54, 88));
    }

    #[test]
    fn marker_and_indicators_agree() {
        for mode in [Mode::Start, Mode::Temperature, Mode::Usage] {
            for value in [0, 9, 42, 100, 999] {
                let buf = report(mode, value, 55, value, 55);
                assert_eq!(buf.len(), REPORT_LEN);
                assert_eq!(buf[0], MARKER);
                assert_eq!(buf[offset::CPU_INDICATOR], buf[offset::GPU_INDICATOR]);
                assert!(buf.iter().all(|b| *b <= 170));
            }
        }
    }
}
