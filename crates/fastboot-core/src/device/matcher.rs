//! Fastboot device matching
//!
//! A device qualifies when its vendor is known (or explicitly requested with
//! `-i`), the interface advertises the fastboot class triple and, if a serial
//! was requested, the serial is identical.

use super::{DeviceDescriptor, MatchFilter};

// ===========================================================================
// USB Identifiers
// ===========================================================================

/// USB vendor ids of devices known to expose a fastboot interface
pub const VENDOR_WHITELIST: &[(u16, &str)] = &[
    (0x18d1, "Google"),
    (0x0451, "Texas Instruments"),
    (0x0502, "Acer"),
    (0x0fce, "Sony Ericsson"),
    (0x05c6, "Qualcomm"),
    (0x22b8, "Motorola"),
    (0x0955, "Nvidia"),
    (0x413c, "Dell"),
    (0x8087, "Intel"),
    (0x0bb4, "HTC"),
];

/// Interface class/subclass/protocol triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceTriple {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

/// The vendor-specific interface used by fastboot bootloaders
pub const FASTBOOT_INTERFACE: InterfaceTriple = InterfaceTriple {
    class: 0xff,
    subclass: 0x42,
    protocol: 0x03,
};

/// Check whether a vendor id is on the built-in whitelist
pub fn is_known_vendor(vendor_id: u16) -> bool {
    VENDOR_WHITELIST.iter().any(|&(id, _)| id == vendor_id)
}

/// Decide whether `device` is an eligible fastboot target under `filter`
pub fn matches(device: &DeviceDescriptor, filter: &MatchFilter) -> bool {
    let requested = filter
        .vendor_id
        .is_some_and(|vid| vid != 0 && vid == device.vendor_id);
    let vendor_ok = requested || is_known_vendor(device.vendor_id);
    if !vendor_ok {
        return false;
    }

    let triple = InterfaceTriple {
        class: device.class,
        subclass: device.subclass,
        protocol: device.protocol,
    };
    if triple != FASTBOOT_INTERFACE {
        return false;
    }

    match &filter.serial {
        Some(serial) => device.serial.as_bytes() == serial.as_bytes(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fastboot_device(vendor_id: u16, serial: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            vendor_id,
            class: 0xff,
            subclass: 0x42,
            protocol: 0x03,
            serial: serial.to_string(),
            writable: true,
        }
    }

    #[test]
    fn test_whitelisted_vendors_match() {
        let filter = MatchFilter::any();
        for &(vid, name) in VENDOR_WHITELIST {
            assert!(
                matches(&fastboot_device(vid, "X"), &filter),
                "{} should match",
                name
            );
        }
    }

    #[test]
    fn test_unknown_vendor_rejected() {
        assert!(!matches(&fastboot_device(0x1234, "X"), &MatchFilter::any()));
    }

    #[test]
    fn test_vendor_override() {
        let filter = MatchFilter {
            vendor_id: Some(0x1234),
            serial: None,
        };
        assert!(matches(&fastboot_device(0x1234, "X"), &filter));
        // The override adds to the whitelist, it does not replace it
        assert!(matches(&fastboot_device(0x8087, "X"), &filter));
        assert!(!matches(&fastboot_device(0x4321, "X"), &filter));
    }

    #[test]
    fn test_zero_vendor_override_ignored() {
        let filter = MatchFilter {
            vendor_id: Some(0),
            serial: None,
        };
        assert!(!matches(&fastboot_device(0x0000, "X"), &filter));
        assert!(matches(&fastboot_device(0x18d1, "X"), &filter));
    }

    #[test]
    fn test_interface_triple_must_match() {
        let filter = MatchFilter::any();

        let mut dev = fastboot_device(0x18d1, "X");
        dev.class = 0x08;
        assert!(!matches(&dev, &filter));

        let mut dev = fastboot_device(0x18d1, "X");
        dev.subclass = 0x51;
        assert!(!matches(&dev, &filter));

        let mut dev = fastboot_device(0x18d1, "X");
        dev.protocol = 0x01;
        assert!(!matches(&dev, &filter));
    }

    #[test]
    fn test_triple_checked_even_with_override() {
        let filter = MatchFilter {
            vendor_id: Some(0x1234),
            serial: None,
        };
        let mut dev = fastboot_device(0x1234, "X");
        dev.subclass = 0x00;
        assert!(!matches(&dev, &filter));
    }

    #[test]
    fn test_serial_filter_is_exact() {
        let filter = MatchFilter {
            vendor_id: None,
            serial: Some("ABC123".to_string()),
        };
        assert!(matches(&fastboot_device(0x18d1, "ABC123"), &filter));
        assert!(!matches(&fastboot_device(0x18d1, "ABC1234"), &filter));
        assert!(!matches(&fastboot_device(0x18d1, "abc123"), &filter));
        assert!(!matches(&fastboot_device(0x18d1, ""), &filter));
    }

    #[test]
    fn test_no_serial_filter_accepts_any_serial() {
        let filter = MatchFilter::any();
        assert!(matches(&fastboot_device(0x0bb4, ""), &filter));
        assert!(matches(&fastboot_device(0x0bb4, "HT123"), &filter));
    }
}
