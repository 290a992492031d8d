//! Device selection
//!
//! A host may have any number of USB devices attached. This module decides
//! which of them are fastboot targets ([`matcher`]) and drives the host USB
//! layer until one shows up or every candidate has been listed
//! ([`discovery`]).
//!
//! The USB layer itself lives in another crate and is reached through the
//! [`UsbEnumerator`](discovery::UsbEnumerator) trait.

pub mod discovery;
pub mod matcher;

pub use discovery::{acquire_or_wait, enumerate_all, UsbEnumerator, Visit, POLL_INTERVAL};
pub use matcher::{matches, InterfaceTriple, FASTBOOT_INTERFACE, VENDOR_WHITELIST};

/// One candidate USB interface as reported by the host
///
/// Produced fresh for every enumeration pass and discarded right after the
/// matcher has looked at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// USB vendor id of the device
    pub vendor_id: u16,
    /// Interface class
    pub class: u8,
    /// Interface subclass
    pub subclass: u8,
    /// Interface protocol
    pub protocol: u8,
    /// Serial number string, empty when the device reports none
    pub serial: String,
    /// Whether the current user may open the device
    pub writable: bool,
}

impl DeviceDescriptor {
    /// Serial as shown by `fastboot devices`
    pub fn display_serial(&self) -> &str {
        if !self.writable {
            "no permissions"
        } else if self.serial.is_empty() {
            "????????????"
        } else {
            &self.serial
        }
    }
}

/// Filters selecting which fastboot device to talk to
///
/// Built once from the command line and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    /// Extra vendor id accepted on top of the built-in whitelist, zero is ignored
    pub vendor_id: Option<u16>,
    /// Exact serial number the device must report
    pub serial: Option<String>,
}

impl MatchFilter {
    /// Filter that accepts any whitelisted fastboot device
    pub fn any() -> Self {
        Self::default()
    }
}
