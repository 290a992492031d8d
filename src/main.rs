//! fastboot - Flash and control Android devices in bootloader mode
//!
//! The command line is turned into a queue of device operations by
//! `fastboot-core`, a matching device is found (or waited for) on the host's
//! USB bus through `fastboot-usb`, and the queue is executed against it.
//!
//! Only `devices` and `help` bypass the queue: they are handled when they
//! appear as the very first token and never touch a device.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Direct, USAGE};
use fastboot_core::device::{acquire_or_wait, POLL_INTERVAL};
use fastboot_core::protocol::{execute, ExecutionProgress, Transport};
use fastboot_core::{build_queue, Error, MatchFilter, UsbEnumerator};
use fastboot_usb::UsbBus;

/// Environment variable naming the default target serial
const SERIAL_ENV: &str = "ANDROID_SERIAL";

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let default_serial = std::env::var(SERIAL_ENV).ok();
    let mut progress = commands::IndicatifProgress::new();

    if let Err(e) = run(&cli, &mut UsbBus::new(), default_serial, &mut progress) {
        eprint!("{}", error_report(&e));
        std::process::exit(1);
    }
}

/// Text printed on stderr when an invocation fails
fn error_report(e: &Error) -> String {
    let usage = if e.is_usage() { USAGE } else { "" };
    format!("{}error: {}\n", usage, e)
}

/// Run one invocation against the devices visible through `usb`
///
/// The queue is built completely before the bus is looked at, so a bad
/// command line never waits for a device.
fn run<E>(
    cli: &Cli,
    usb: &mut E,
    default_serial: Option<String>,
    progress: &mut dyn ExecutionProgress,
) -> fastboot_core::Result<()>
where
    E: UsbEnumerator,
    E::Handle: Transport,
{
    if cli.args.is_empty() {
        return Err(Error::Usage("no command given".into()));
    }

    match cli.direct() {
        Some(Direct::Devices) => return commands::run_devices(usb, &MatchFilter::any()),
        Some(Direct::Help) => {
            eprint!("{}", USAGE);
            return Ok(());
        }
        None => {}
    }

    let invocation = build_queue(cli.args.as_slice(), default_serial)?;
    log::debug!(
        "Queued {} operation(s), filter {:?}",
        invocation.queue.len(),
        invocation.filter
    );

    let mut device = acquire_or_wait(usb, &invocation.filter, POLL_INTERVAL);
    execute(&mut device, invocation.queue, progress)
}
