//! Error types for the USB layer

use thiserror::Error;

/// Errors raised while talking to the host USB stack
#[derive(Debug, Error)]
pub enum UsbError {
    /// Listing the bus failed
    #[error("USB enumeration failed: {0}")]
    EnumerationFailed(#[source] nusb::Error),

    /// Failed to claim the fastboot interface
    #[error("Failed to claim interface {interface}: {source}")]
    ClaimFailed {
        interface: u8,
        #[source]
        source: nusb::Error,
    },

    /// The interface lacks a bulk IN/OUT endpoint pair
    #[error("Interface {0} has no bulk endpoint pair")]
    NoEndpoints(u8),

    /// The active configuration could not be read
    #[error("Failed to read active configuration: {0}")]
    ConfigurationUnavailable(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),
}

/// Result type for USB operations
pub type Result<T> = std::result::Result<T, UsbError>;

impl From<UsbError> for fastboot_core::Error {
    fn from(e: UsbError) -> Self {
        fastboot_core::Error::Transport(e.to_string())
    }
}
