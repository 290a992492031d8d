//! fastboot-core - Platform independent core of the fastboot front-end
//!
//! This crate turns a fastboot command line into an ordered queue of device
//! operations and runs that queue over an abstract transport. It never talks
//! to USB directly: device enumeration and bulk transfers are provided by
//! the `fastboot-usb` crate through the [`UsbEnumerator`] and [`Transport`]
//! traits.
//!
//! # Modules
//!
//! - [`device`]: which USB interfaces are fastboot targets, and the
//!   wait/list discovery loops
//! - [`loader`]: loading payloads from disk and from zip archives
//! - [`package`]: the fixed image manifest of a full-device package
//! - [`builder`]: command line tokens to [`CommandQueue`]
//! - [`queue`]: the [`QueuedOperation`] model
//! - [`protocol`]: the fastboot wire protocol and queue execution
//!
//! # Example
//!
//! ```no_run
//! use fastboot_core::builder::build_queue;
//! use fastboot_core::protocol::{execute, NoProgress, Transport};
//!
//! fn run<T: Transport>(device: &mut T) -> fastboot_core::Result<()> {
//!     let invocation = build_queue(&["erase", "cache", "reboot"], None)?;
//!     execute(device, invocation.queue, &mut NoProgress)
//! }
//! ```

pub mod builder;
pub mod device;
pub mod error;
pub mod loader;
pub mod package;
pub mod protocol;
pub mod queue;

#[cfg(test)]
mod testutil;

pub use builder::{build_queue, Invocation, RebootIntent};
pub use device::{DeviceDescriptor, MatchFilter, UsbEnumerator, Visit};
pub use error::{Error, Result};
pub use protocol::Transport;
pub use queue::{CommandQueue, QueuedOperation};
