//! Device discovery loops
//!
//! Two ways of walking the host's USB devices through the matcher:
//!
//! - [`acquire_or_wait`] blocks until a matching device can be opened,
//!   polling once per [`POLL_INTERVAL`]. There is no timeout; the only way
//!   out is a device showing up or the process being killed.
//! - [`enumerate_all`] visits every device once and returns the ones that
//!   match, without selecting any of them.

use std::thread;
use std::time::Duration;

use super::matcher::matches;
use super::{DeviceDescriptor, MatchFilter};
use crate::error::Result;

/// Delay between two enumeration attempts while waiting for a device
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Verdict of an enumeration callback for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Open this device and stop enumerating
    Accept,
    /// Skip this device and keep going
    Continue,
}

/// Host USB layer as seen by discovery
///
/// Implementations call `visit` once per candidate interface. When the
/// callback returns [`Visit::Accept`] the implementation opens that
/// interface, stops walking and returns the handle. An accepted candidate
/// that cannot be opened is skipped. If nothing was opened, `Ok(None)` is
/// returned.
pub trait UsbEnumerator {
    /// Opened device, ready for protocol traffic
    type Handle;

    /// Walk all candidate interfaces
    fn enumerate(
        &mut self,
        visit: &mut dyn FnMut(&DeviceDescriptor) -> Visit,
    ) -> Result<Option<Self::Handle>>;
}

/// Block until a device matching `filter` is found and opened
///
/// Prints `< waiting for device >` once, the first time nothing is found.
/// Enumeration errors are treated like an empty bus and retried.
pub fn acquire_or_wait<E: UsbEnumerator>(
    usb: &mut E,
    filter: &MatchFilter,
    interval: Duration,
) -> E::Handle {
    let mut announce = true;

    loop {
        let mut accept = |dev: &DeviceDescriptor| {
            if matches(dev, filter) {
                log::debug!(
                    "Accepting device {:04x} serial '{}'",
                    dev.vendor_id,
                    dev.serial
                );
                Visit::Accept
            } else {
                Visit::Continue
            }
        };

        match usb.enumerate(&mut accept) {
            Ok(Some(handle)) => return handle,
            Ok(None) => {}
            Err(e) => log::warn!("USB enumeration failed: {}", e),
        }

        if announce {
            announce = false;
            eprintln!("< waiting for device >");
        }
        thread::sleep(interval);
    }
}

/// Return every connected device matching `filter`
///
/// Never selects a device and never stops early, so all candidates are seen.
pub fn enumerate_all<E: UsbEnumerator>(
    usb: &mut E,
    filter: &MatchFilter,
) -> Result<Vec<DeviceDescriptor>> {
    let mut found = Vec::new();

    usb.enumerate(&mut |dev: &DeviceDescriptor| {
        if matches(dev, filter) {
            found.push(dev.clone());
        }
        Visit::Continue
    })?;

    Ok(found)
}
