//! CLI argument parsing
//!
//! clap only handles the global flags. Everything after them is passed
//! verbatim to the queue builder, which gives `-s` and `-i` their per-token
//! meaning and interprets the command words in order.

use clap::Parser;

/// Usage text, printed by `fastboot help` and on usage errors
pub const USAGE: &str = "\
usage: fastboot [ <option> ] <command>

commands:
  flashall <filename>                      reflash device from a zip package
  flash <partition> <filename>             write a file to a flash partition
  erase <partition>                        erase a flash partition
  getvar <variable>                        display a bootloader variable
  signature <filename>                     send a 256 byte image signature
  oem <word>...                            send a vendor specific command
  devices                                  list all connected devices
  continue                                 continue with autoboot
  reboot                                   reboot device normally
  reboot-bootloader                        reboot device into bootloader
  help                                     show this help message

options:
  -s <serial number>                       specify device serial number
  -i <vendor id>                           specify a custom USB vendor id
";

#[derive(Parser)]
#[command(name = "fastboot")]
#[command(author, version, about = "Flash and control Android devices in bootloader mode", long_about = None)]
#[command(after_help = USAGE)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Options and commands, processed left to right
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub args: Vec<String>,
}

/// Commands handled before any queue is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direct {
    /// List devices and exit
    Devices,
    /// Print usage and exit
    Help,
}

impl Cli {
    /// The short-circuit command, recognized only as the first token
    pub fn direct(&self) -> Option<Direct> {
        match self.args.first().map(String::as_str) {
            Some("devices") => Some(Direct::Devices),
            Some("help") => Some(Direct::Help),
            _ => None,
        }
    }
}
