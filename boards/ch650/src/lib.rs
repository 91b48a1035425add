//! High level hidapi abstraction for driving the DeepCool CH650 digital display.
//!
//! The panel takes write-only 11-byte output reports, see [`abi`] for the layout.

use deepcool_sync_core::{Panel, PanelError, PanelInfo, Result, Sample};
use hidapi::{DeviceInfo, HidApi, HidDevice};

pub mod abi;
pub mod digits;
pub mod types;

pub mod consts {
    pub const DEEPCOOL_VENDOR_ID: u16 = 0x3633;
    pub const CH650_PRODUCT_ID: u16 = 0x0005;
}

/// Static panel info for detection
pub static INFO: PanelInfo = PanelInfo {
    name: "DeepCool CH650 Digital",
    vendor_id: consts::DEEPCOOL_VENDOR_ID,
    product_id: consts::CH650_PRODUCT_ID,
};

/// Check if a HID device is a CH650 display
fn matches(device: &DeviceInfo) -> bool {
    device.vendor_id() == INFO.vendor_id && device.product_id() == INFO.product_id
}

/// High level abstraction for managing a CH650 display.
///
/// The device is closed when this is dropped.
pub struct Ch650 {
    pub device: HidDevice,
}

impl Ch650 {
    /// Find and open the device for writing
    pub fn open() -> Result<Self> {
        let api = HidApi::new()?;
        Self::open_with(&api)
    }

    /// Open the device from an existing hidapi context
    pub fn open_with(api: &HidApi) -> Result<Self> {
        let device = api
            .device_list()
            .find(|d| matches(d))
            .ok_or(PanelError::DeviceNotFound)?
            .open_device(api)?;
        // Reports are fire and forget, the panel never answers
        device.set_blocking_mode(false)?;
        Ok(Self { device })
    }

    /// Internal method to write a single report
    fn execute(&mut self, report: [u8; abi::REPORT_LEN]) -> Result<()> {
        let written = self.device.write(&report)?;
        if written < abi::REPORT_LEN {
            return Err(PanelError::CommandFailed("short write to device"));
        }
        Ok(())
    }

    /// Update the panel with a sample
    #[inline(always)]
    pub fn update(&mut self, sample: &Sample) -> Result<()> {
        self.execute(abi::encode(sample))
    }
}

// === Trait Implementations ===

impl Panel for Ch650 {
    fn info(&self) -> &'static PanelInfo {
        &INFO
    }

    fn write_report(&mut self, sample: &Sample) -> Result<()> {
        Ch650::update(self, sample)
    }
}
