use deepcool_sync_core::Mode;

/// Panel indicator shown next to the cpu and gpu readouts.
///
/// The firmware also knows 35 for fahrenheit on the gpu side, which is not used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Indicator {
    /// Handshake, lights both panels without digits
    Start = 170,
    /// Usage in percent
    Usage = 76,
    /// Temperature in celsius
    Celsius = 19,
}

impl From<Mode> for Indicator {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Start => Indicator::Start,
            Mode::Temperature => Indicator::Celsius,
            Mode::Usage => Indicator::Usage,
        }
    }
}

impl Indicator {
    #[inline(always)]
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}
