//! Fastboot USB device implementation
//!
//! [`UsbBus`] walks the host's USB devices with nusb and implements the core
//! `UsbEnumerator` trait. The device it hands back, [`FastbootDevice`], owns
//! the claimed interface and implements `Transport` with bulk transfers.

use nusb::transfer::{Direction, EndpointType, Queue, RequestBuffer};
use nusb::{Device, DeviceInfo, Interface, InterfaceInfo};

use fastboot_core::device::{UsbEnumerator, Visit, FASTBOOT_INTERFACE};
use fastboot_core::protocol::Transport;
use fastboot_core::{DeviceDescriptor, Result as CoreResult};

use crate::error::{Result, UsbError};

/// Largest single bulk OUT transfer
pub const MAX_USB_TRANSFER: usize = 1024 * 1024;

/// Host USB bus
#[derive(Debug, Default)]
pub struct UsbBus;

impl UsbBus {
    pub fn new() -> Self {
        Self
    }
}

fn is_fastboot_interface(iface: &InterfaceInfo) -> bool {
    iface.class() == FASTBOOT_INTERFACE.class
        && iface.subclass() == FASTBOOT_INTERFACE.subclass
        && iface.protocol() == FASTBOOT_INTERFACE.protocol
}

impl UsbEnumerator for UsbBus {
    type Handle = FastbootDevice;

    fn enumerate(
        &mut self,
        visit: &mut dyn FnMut(&DeviceDescriptor) -> Visit,
    ) -> CoreResult<Option<FastbootDevice>> {
        let devices = nusb::list_devices().map_err(UsbError::EnumerationFailed)?;

        for info in devices {
            for iface in info.interfaces() {
                // Only fastboot interfaces are worth opening; the open also
                // tells us whether we have permission to use the device.
                let device = if is_fastboot_interface(iface) {
                    match info.open() {
                        Ok(device) => Some(device),
                        Err(e) => {
                            log::debug!(
                                "Cannot open {:04x}:{:04x} at bus {} address {}: {}",
                                info.vendor_id(),
                                info.product_id(),
                                info.bus_number(),
                                info.device_address(),
                                e
                            );
                            None
                        }
                    }
                } else {
                    None
                };

                let descriptor = DeviceDescriptor {
                    vendor_id: info.vendor_id(),
                    class: iface.class(),
                    subclass: iface.subclass(),
                    protocol: iface.protocol(),
                    serial: info.serial_number().unwrap_or_default().to_string(),
                    writable: device.is_some(),
                };

                if visit(&descriptor) != Visit::Accept {
                    continue;
                }

                let Some(device) = device else {
                    log::warn!(
                        "Fastboot device '{}' found but cannot be opened (no permissions?)",
                        descriptor.serial
                    );
                    continue;
                };

                match FastbootDevice::claim(device, &info, iface.interface_number()) {
                    Ok(dev) => return Ok(Some(dev)),
                    Err(e) => log::warn!("Skipping device '{}': {}", descriptor.serial, e),
                }
            }
        }

        Ok(None)
    }
}

/// An opened fastboot interface
pub struct FastbootDevice {
    /// USB device handle
    _device: Device,
    /// Claimed fastboot interface
    interface: Interface,
    /// IN endpoint address
    in_ep: u8,
    /// OUT endpoint address
    out_ep: u8,
    /// Serial number, empty if the device reports none
    serial: String,
}

impl FastbootDevice {
    /// Claim interface `interface_num` of an already opened device
    fn claim(device: Device, info: &DeviceInfo, interface_num: u8) -> Result<Self> {
        let (in_ep, out_ep) = find_bulk_endpoints(&device, interface_num)?;

        let interface = device
            .claim_interface(interface_num)
            .map_err(|source| UsbError::ClaimFailed {
                interface: interface_num,
                source,
            })?;

        log::info!(
            "Opened fastboot device at bus {} address {} (interface {}, in 0x{:02x}, out 0x{:02x})",
            info.bus_number(),
            info.device_address(),
            interface_num,
            in_ep,
            out_ep
        );

        Ok(Self {
            _device: device,
            interface,
            in_ep,
            out_ep,
            serial: info.serial_number().unwrap_or_default().to_string(),
        })
    }

    /// Serial number of the device
    pub fn serial(&self) -> &str {
        &self.serial
    }

    fn bulk_out(&mut self, data: &[u8]) -> Result<usize> {
        let mut queue: Queue<Vec<u8>> = self.interface.bulk_out_queue(self.out_ep);
        queue.submit(data.to_vec());

        let completion = futures_lite::future::block_on(queue.next_complete());
        completion
            .status
            .map_err(|e| UsbError::TransferFailed(e.to_string()))?;

        log::trace!("USB write {} bytes", completion.data.actual_length());
        Ok(completion.data.actual_length())
    }

    fn bulk_in(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut queue: Queue<RequestBuffer> = self.interface.bulk_in_queue(self.in_ep);
        queue.submit(RequestBuffer::new(len));

        let completion = futures_lite::future::block_on(queue.next_complete());
        completion
            .status
            .map_err(|e| UsbError::TransferFailed(e.to_string()))?;

        log::trace!("USB read {} bytes", completion.data.len());
        Ok(completion.data)
    }
}

impl Transport for FastbootDevice {
    fn write(&mut self, data: &[u8]) -> CoreResult<usize> {
        let mut written = 0;
        for chunk in data.chunks(MAX_USB_TRANSFER) {
            let n = self.bulk_out(chunk)?;
            written += n;
            if n != chunk.len() {
                break;
            }
        }
        Ok(written)
    }

    fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
        let packet = self.bulk_in(buf.len())?;
        let len = packet.len().min(buf.len());
        buf[..len].copy_from_slice(&packet[..len]);
        Ok(len)
    }
}

/// Find the first bulk IN and bulk OUT endpoints of an interface
fn find_bulk_endpoints(device: &Device, interface_num: u8) -> Result<(u8, u8)> {
    let config = device
        .active_configuration()
        .map_err(|e| UsbError::ConfigurationUnavailable(e.to_string()))?;

    let mut in_ep = None;
    let mut out_ep = None;

    for alt in config.interface_alt_settings() {
        if alt.interface_number() != interface_num {
            continue;
        }
        for ep in alt.endpoints() {
            if ep.transfer_type() != EndpointType::Bulk {
                continue;
            }
            match ep.direction() {
                Direction::In => {
                    in_ep.get_or_insert(ep.address());
                }
                Direction::Out => {
                    out_ep.get_or_insert(ep.address());
                }
            }
        }
        break;
    }

    match (in_ep, out_ep) {
        (Some(in_ep), Some(out_ep)) => Ok((in_ep, out_ep)),
        _ => Err(UsbError::NoEndpoints(interface_num)),
    }
}
