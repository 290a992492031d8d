//! Devices command implementation

use fastboot_core::device::enumerate_all;
use fastboot_core::{DeviceDescriptor, MatchFilter, UsbEnumerator};

/// Device-kind label printed after each serial
const DEVICE_KIND: &str = "fastboot";

/// Format one listing line: `<serial>\tfastboot`
pub fn listing_line(device: &DeviceDescriptor) -> String {
    format!("{}\t{}", device.display_serial(), DEVICE_KIND)
}

/// Run the devices command
///
/// Prints one line per matching device and never selects one.
pub fn run_devices<E: UsbEnumerator>(usb: &mut E, filter: &MatchFilter) -> fastboot_core::Result<()> {
    let devices = enumerate_all(usb, filter)?;
    log::debug!("Found {} fastboot device(s)", devices.len());

    for device in &devices {
        println!("{}", listing_line(device));
    }

    Ok(())
}
