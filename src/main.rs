use std::error::Error;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use bpaf::{Bpaf, Parser};
use ch650::Ch650;
use deepcool_sync_core::{Mode, Panel, PanelError, Sample};
use log::{error, info, warn};

use crate::daemon::{RunOutcome, Session, SyncError};
use crate::info::Sensors;

mod daemon;
mod hwmon;
mod info;

/// Default delay between display updates
const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, Bpaf)]
struct RunArgs {
    /// Delay between display updates
    #[bpaf(
        short,
        long,
        argument("DURATION"),
        fallback(DEFAULT_INTERVAL.into()),
        display_fallback
    )]
    interval: humantime::Duration,
    /// Stop after this many temperature and usage cycles
    #[bpaf(long, argument("N"))]
    cycles: Option<u64>,
    /// Sensor label to search for the cpu temperature
    #[bpaf(long("cpu"), argument("LABEL"), fallback("Package".into()), display_fallback)]
    cpu_label: String,
    /// DRM card to read gpu temperature and load from
    #[bpaf(long("card"), argument("NAME"), fallback("card0".into()), display_fallback)]
    card: String,
    /// GPU device id used when the DRM card is missing (nvidia only)
    #[bpaf(long("gpu"), argument::<u32>("ID"), fallback(0), display_fallback)]
    gpu_index: u32,
    #[bpaf(long("drm-root"), argument("PATH"), fallback(PathBuf::from(hwmon::DRM_ROOT)), hide)]
    drm_root: PathBuf,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL.into(),
            cycles: None,
            cpu_label: "Package".into(),
            card: "card0".into(),
            gpu_index: 0,
            drm_root: PathBuf::from(hwmon::DRM_ROOT),
        }
    }
}

#[derive(Clone, Debug, Bpaf)]
struct SetArgs {
    /// Display mode [start|temperature|usage]
    #[bpaf(short, long, argument("MODE"), fallback(Mode::Temperature), display_fallback)]
    mode: Mode,
    /// CPU temperature or usage to display
    #[bpaf(long, argument("VALUE"), fallback(0))]
    cpu_value: u16,
    /// CPU load percentage for the green bar
    #[bpaf(long, argument("PERCENT"), guard(|l| *l <= 100, "load must be 0-100"), fallback(0))]
    cpu_load: u8,
    /// GPU temperature to display in temperature mode
    #[bpaf(long, argument("VALUE"), fallback(0))]
    gpu_value: u16,
    /// GPU load percentage for the green bar, displayed in usage mode
    #[bpaf(long, argument("PERCENT"), guard(|l| *l <= 100, "load must be 0-100"), fallback(0))]
    gpu_load: u8,
}

impl From<&SetArgs> for Sample {
    fn from(args: &SetArgs) -> Self {
        Sample {
            mode: args.mode,
            cpu_value: args.cpu_value,
            cpu_load: args.cpu_load,
            gpu_value: args.gpu_value,
            gpu_load: args.gpu_load,
        }
    }
}

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options, version, descr(env!("CARGO_PKG_DESCRIPTION")))]
struct Cli {
    /// Enable debug logging
    #[bpaf(short, long)]
    verbose: bool,
    #[bpaf(external(command))]
    command: Command,
}

#[derive(Clone, Debug)]
enum Command {
    /// Continuously sync system telemetry to the panel (default).
    Run(RunArgs),
    /// Write a single report with manual values.
    /// Must not be used while deepcool-sync is already running.
    Set(SetArgs),
}

fn command() -> impl Parser<Command> {
    let run = run_args()
        .map(Command::Run)
        .to_options()
        .descr("Continuously sync system telemetry to the panel")
        .command("run")
        .help("Continuously sync system telemetry to the panel (default)");

    let set = set_args()
        .map(Command::Set)
        .to_options()
        .descr("Write a single report with manual values")
        .command("set")
        .help("Write a single report with manual values");

    bpaf::construct!([run, set]).fallback(Command::Run(RunArgs::default()))
}

/// Explain how to find the panel when it can't be reached
fn connection_hint(e: &PanelError) {
    if matches!(e, PanelError::DeviceNotFound | PanelError::Hid(_)) {
        warn!(
            "ensure the {} is connected and readable by this user",
            ch650::INFO.name
        );
        warn!(
            "run lsusb and look for ID {:04x}:{:04x}",
            ch650::INFO.vendor_id,
            ch650::INFO.product_id
        );
    }
}

fn apply_set(panel: &mut dyn Panel, args: &SetArgs) -> Result<(), Box<dyn Error>> {
    let sample = Sample::from(args);
    // the panel ignores data frames until it has seen a handshake
    if sample.mode != Mode::Start {
        panel.start().inspect_err(connection_hint)?;
    }
    panel.write_report(&sample).inspect_err(connection_hint)?;
    println!("wrote {:?}", ch650::abi::encode(&sample));
    Ok(())
}

/// Listen for ctrl-c, resolving once it is pressed.
///
/// The handler is installed before this returns rather than on first poll, so an
/// interrupt during sensor discovery still ends the run cleanly.
/// Must be called from within a runtime.
#[cfg(unix)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    Ok(async move {
        interrupt.recv().await;
        info!("received ctrl-c, shutting down");
    })
}

#[cfg(windows)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut interrupt = tokio::signal::windows::ctrl_c()?;
    Ok(async move {
        interrupt.recv().await;
        info!("received ctrl-c, shutting down");
    })
}

fn apply_run(panel: Ch650, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let shutdown = {
        let _guard = rt.enter();
        shutdown_signal()?
    };

    let sensors = Sensors::new(&args.cpu_label, &args.drm_root, &args.card, args.gpu_index);
    let mut session = Session::new(panel, sensors);

    let outcome = rt.block_on(session.run(args.interval.into(), args.cycles, shutdown));
    match outcome {
        RunOutcome::Completed => info!("finished {} cycles", args.cycles.unwrap_or_default()),
        RunOutcome::Interrupted => info!("terminated by user"),
        RunOutcome::Failed(e) => {
            error!("{e}");
            if let SyncError::Panel(e) = &e {
                connection_hint(e);
            }
            return Err(e.into());
        },
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = cli().run();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut panel = Ch650::open().inspect_err(connection_hint)?;
    match cli.command {
        Command::Run(args) => apply_run(panel, args),
        Command::Set(args) => apply_set(&mut panel, &args),
    }
}
