//! Error types for fastboot-core
//!
//! Every failure in this crate is fatal to the invocation: the driver prints
//! the message as `error: <message>` and exits with status 1.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognized command or missing following tokens
    #[error("{0}")]
    Usage(String),

    /// Malformed argument value (vendor id, signature size, ...)
    #[error("{0}")]
    Argument(String),

    /// A file could not be read from disk
    #[error("cannot load '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes handed to the archive reader are not an archive
    #[error("not a valid archive: {0}")]
    InvalidArchive(String),

    /// The archive does not contain the requested entry
    #[error("archive does not contain '{0}'")]
    MissingEntry(String),

    /// A package could not be turned into a flash plan
    #[error("{0}")]
    Package(String),

    /// An archive entry failed to decompress
    #[error("failed to unzip '{name}' from archive: {reason}")]
    Decode { name: String, reason: String },

    /// The device reported failure while executing the queue
    #[error("{0}")]
    Execution(String),

    /// The device sent a response that does not follow the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The USB layer failed to move bytes or enumerate devices
    #[error("usb error: {0}")]
    Transport(String),
}

impl Error {
    /// Whether the driver should print the usage text along with the message
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}

/// Result type for fastboot-core operations
pub type Result<T> = std::result::Result<T, Error>;
