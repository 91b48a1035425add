//! Core traits and types for deepcool-sync panel abstraction.
//!
//! This crate provides:
//! - The `Panel` trait implemented by display drivers
//! - `Mode` and `Sample`, the plain data handed from telemetry to the encoder
//! - `PanelError`, the error type shared by panel drivers

mod error;
mod panel;

pub use error::{PanelError, Result};
pub use panel::{Mode, Panel, PanelInfo, Sample};
