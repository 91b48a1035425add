//! Poll loop driving the panel

use std::future::Future;
use std::time::Duration;

use deepcool_sync_core::{Mode, Panel, PanelError};
use log::{debug, info};

use crate::info::{SensorError, Telemetry};

/// Fatal errors ending a run
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("panel: {0}")]
    Panel(#[from] PanelError),
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The requested number of cycles was written
    Completed,
    /// Shutdown was requested between ticks
    Interrupted,
    /// The panel or a sensor failed
    Failed(SyncError),
}

/// Everything the poll loop needs, constructed once at startup.
///
/// Owns the open panel, so the device is released whenever the session drops.
pub struct Session<P, T> {
    pub panel: P,
    pub telemetry: T,
}

impl<P: Panel, T: Telemetry> Session<P, T> {
    pub fn new(panel: P, telemetry: T) -> Self {
        Self { panel, telemetry }
    }

    /// Sample and write a single report
    pub fn tick(&mut self, mode: Mode) -> Result<(), SyncError> {
        let sample = self.telemetry.sample(mode)?;
        debug!("writing {sample:?}");
        self.panel.write_report(&sample)?;
        Ok(())
    }

    /// Send the start frame, then alternate temperature and usage reports every interval.
    ///
    /// A cycle is one temperature report followed by one usage report. Without a cycle
    /// limit the loop only ends on failure or when `shutdown` resolves.
    pub async fn run(
        &mut self,
        interval: Duration,
        cycles: Option<u64>,
        shutdown: impl Future<Output = ()>,
    ) -> RunOutcome {
        tokio::pin!(shutdown);

        if let Err(e) = self.panel.start() {
            return RunOutcome::Failed(e.into());
        }
        info!("initialized {}", self.panel.info().name);

        let limit = cycles.map(|n| n.saturating_mul(2));
        let mut written = 0u64;
        let mut mode = Mode::Temperature;
        loop {
            if limit.is_some_and(|limit| written >= limit) {
                return RunOutcome::Completed;
            }
            if let Err(e) = self.tick(mode) {
                return RunOutcome::Failed(e);
            }
            written += 1;
            mode = mode.next();

            if limit.is_some_and(|limit| written >= limit) {
                return RunOutcome::Completed;
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => return RunOutcome::Interrupted,
                _ = tokio::time::sleep(interval) => {},
            }
        }
    }
}
