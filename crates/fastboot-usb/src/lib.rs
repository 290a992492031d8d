//! fastboot-usb - Host USB backend for the fastboot front-end
//!
//! This crate connects `fastboot-core` to real hardware using nusb:
//!
//! - [`UsbBus`] implements `UsbEnumerator`. It walks every interface of every
//!   device on the host and reports vendor id, interface class triple,
//!   serial number and whether the device could be opened.
//! - [`FastbootDevice`] is the opened, claimed interface. It implements
//!   `Transport` with synchronous bulk transfers on the interface's first
//!   bulk IN/OUT endpoint pair.
//!
//! # Example
//!
//! ```no_run
//! use fastboot_core::device::{acquire_or_wait, POLL_INTERVAL};
//! use fastboot_core::protocol::{execute, NoProgress};
//! use fastboot_core::build_queue;
//! use fastboot_usb::UsbBus;
//!
//! let invocation = build_queue(&["reboot"], None)?;
//! let mut device = acquire_or_wait(&mut UsbBus::new(), &invocation.filter, POLL_INTERVAL);
//! execute(&mut device, invocation.queue, &mut NoProgress)?;
//! # Ok::<(), fastboot_core::Error>(())
//! ```

mod device;
mod error;

pub use device::{FastbootDevice, UsbBus, MAX_USB_TRANSFER};
pub use error::{Result, UsbError};
