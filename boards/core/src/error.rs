//! Errors shared by panel drivers.

/// Errors that can occur during panel operations
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// Device was not found
    #[error("device not found")]
    DeviceNotFound,

    /// Command failed on the device
    #[error("command failed: {0}")]
    CommandFailed(&'static str),

    /// HID communication error
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),
}

pub type Result<T> = std::result::Result<T, PanelError>;
