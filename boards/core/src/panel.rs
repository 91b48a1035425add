//! Core Panel trait and related types.

use std::fmt;
use std::str::FromStr;

use crate::Result;

/// Static information about a panel type for detection and logging
#[derive(Debug, Clone, Copy)]
pub struct PanelInfo {
    pub name: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Display mode of a single report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Handshake frame sent once after opening the device
    #[default]
    Start,
    /// CPU and GPU temperatures
    Temperature,
    /// CPU usage and GPU load
    Usage,
}

impl Mode {
    /// The mode shown after this one in the poll loop.
    /// The loop only ever alternates between temperature and usage.
    pub fn next(self) -> Self {
        match self {
            Mode::Start | Mode::Usage => Mode::Temperature,
            Mode::Temperature => Mode::Usage,
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "temp" | "temperature" => Ok(Self::Temperature),
            "usage" => Ok(Self::Usage),
            _ => Err(format!(
                "unknown mode: {s}. Available: start, temperature, usage"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Temperature => write!(f, "temperature"),
            Self::Usage => write!(f, "usage"),
        }
    }
}

/// One tick worth of telemetry, already resolved for a mode.
///
/// `cpu_value` is a temperature in whole degrees or a usage percentage
/// depending on `mode`. `gpu_value` is only displayed in temperature mode;
/// usage mode displays `gpu_load` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub mode: Mode,
    pub cpu_value: u16,
    pub cpu_load: u8,
    pub gpu_value: u16,
    pub gpu_load: u8,
}

impl Sample {
    /// The all-zero handshake sample
    pub fn start() -> Self {
        Self::default()
    }
}

/// Core panel trait - object-safe for `dyn Panel`
///
/// Panels should provide a static `INFO` constant and `open()` method separately.
pub trait Panel: Send {
    /// Get panel info (instance method for object safety)
    fn info(&self) -> &'static PanelInfo;

    /// Encode and write a single report to the device
    fn write_report(&mut self, sample: &Sample) -> Result<()>;

    /// Send the handshake frame expected once after the device is opened
    fn start(&mut self) -> Result<()> {
        self.write_report(&Sample::start())
    }
}
