//! Utilities for getting system info

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use deepcool_sync_core::{Mode, Sample};
use log::{debug, warn};
use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::error::NvmlError;
use nvml_wrapper::{Device, Nvml};
use sysinfo::{Component, Components, System};

use crate::hwmon::{self, Cards};

/// Sensor labels tried, in order, when the requested label is not found
const CPU_FALLBACKS: [&str; 4] = ["Tctl", "Package", "CPU", "nct6798"];

/// Errors reading a telemetry source
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {value:?} from {}", .path.display())]
    Parse { path: PathBuf, value: String },

    #[error("nvml error: {0}")]
    Nvml(#[from] NvmlError),
}

/// Source of per-tick samples for the poll loop
pub trait Telemetry {
    /// Read everything the given mode displays
    fn sample(&mut self, mode: Mode) -> Result<Sample, SensorError>;
}

pub struct CpuTemp {
    maybe_cpu: Option<Component>,
}

impl CpuTemp {
    // Create a new cpu temp monitor, selecting the component by a label search string
    pub fn new(search_label: &str) -> Self {
        let comps: Vec<Component> = Components::new_with_refreshed_list().into();

        let position = |label: &str| comps.iter().position(|c| c.label().contains(label));
        let index = position(search_label).or_else(|| {
            CPU_FALLBACKS.into_iter().find_map(|fb| {
                let index = position(fb)?;
                warn!("cpu sensor {search_label:?} not found, using {fb:?}");
                Some(index)
            })
        });

        if index.is_none() {
            warn!("no cpu temp sensor found, cpu temperature will read 0");
            if !comps.is_empty() {
                let labels: Vec<_> = comps.iter().map(|c| c.label()).collect();
                warn!("available sensors: {}", labels.join(", "));
            }
        }

        let maybe_cpu = index.and_then(|i| comps.into_iter().nth(i));
        if let Some(cpu) = &maybe_cpu {
            debug!("reading cpu temperature from {:?}", cpu.label());
        }
        Self { maybe_cpu }
    }

    // Refresh and poll the current temperature in whole degrees
    pub fn get_temp(&mut self) -> Option<u16> {
        self.maybe_cpu.as_mut().map(|cpu| {
            cpu.refresh();
            cpu.temperature()
                .map(|temp| temp.round().max(0.) as u16)
                .unwrap_or_default()
        })
    }
}

/// Helper struct to track global cpu usage
pub struct CpuLoad {
    sys: System,
}

impl CpuLoad {
    /// Construct a new sampler. Usage is measured between refreshes,
    /// so the first refresh here only sets the baseline.
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        Self { sys }
    }

    // Refresh and poll the usage since the previous call, in percent
    pub fn get_load(&mut self) -> u8 {
        self.sys.refresh_cpu_usage();
        self.sys.global_cpu_usage().round().clamp(0., 100.) as u8
    }
}

impl Default for CpuLoad {
    fn default() -> Self {
        Self::new()
    }
}

/// Open an nvidia gpu by index, if nvml is available
fn nvml_device(index: u32) -> Option<Device<'static>> {
    static NVML: LazyLock<Option<Nvml>> = LazyLock::new(|| {
        let nvml = Nvml::init().ok();
        if nvml.is_none() {
            warn!("nvml not found (nvidia gpu readings unavailable)");
        }
        nvml
    });

    NVML.as_ref().and_then(|nvml| {
        let device = nvml.device_by_index(index).ok();
        if device.is_none() {
            warn!("nvidia gpu device {index} not found");
        }
        device
    })
}

/// All sensors polled by the daemon.
///
/// GPU readings come from the DRM card's hwmon tree when the card exists, and
/// from nvml otherwise. Without either, the gpu reads 0.
pub struct Sensors {
    cpu_temp: CpuTemp,
    cpu_load: CpuLoad,
    cards: Cards,
    card: String,
    nvml: Option<Device<'static>>,
}

impl Sensors {
    pub fn new(cpu_label: &str, drm_root: &Path, card: &str, gpu_index: u32) -> Self {
        let cards = hwmon::find_gpu_cards(drm_root);
        for (name, dir) in &cards {
            debug!("found {name} hwmon at {}", dir.display());
        }

        let nvml = if cards.contains_key(card) {
            None
        } else {
            warn!(
                "{card} not found under {}, falling back to nvml",
                drm_root.display()
            );
            nvml_device(gpu_index)
        };

        Self {
            cpu_temp: CpuTemp::new(cpu_label),
            cpu_load: CpuLoad::new(),
            cards,
            card: card.to_string(),
            nvml,
        }
    }

    fn gpu_temp(&self) -> Result<u16, SensorError> {
        match &self.nvml {
            Some(device) => {
                let temp = device.temperature(TemperatureSensor::Gpu)?;
                Ok(temp.min(u16::MAX.into()) as u16)
            },
            None => hwmon::gpu_temp(&self.cards, &self.card),
        }
    }

    fn gpu_load(&self) -> Result<u8, SensorError> {
        match &self.nvml {
            Some(device) => Ok(device.utilization_rates()?.gpu.min(100) as u8),
            None => hwmon::gpu_load(&self.cards, &self.card),
        }
    }
}

impl Telemetry for Sensors {
    fn sample(&mut self, mode: Mode) -> Result<Sample, SensorError> {
        let sample = match mode {
            Mode::Start => Sample::start(),
            Mode::Temperature => Sample {
                mode,
                cpu_value: self.cpu_temp.get_temp().unwrap_or_default(),
                cpu_load: self.cpu_load.get_load(),
                gpu_value: self.gpu_temp()?,
                gpu_load: self.gpu_load()?,
            },
            Mode::Usage => {
                // the load doubles as the displayed value
                let cpu_load = self.cpu_load.get_load();
                Sample {
                    mode,
                    cpu_value: cpu_load.into(),
                    cpu_load,
                    gpu_value: 0,
                    gpu_load: self.gpu_load()?,
                }
            },
        };
        Ok(sample)
    }
}
