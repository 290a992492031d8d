//! Fastboot wire protocol
//!
//! The host sends short ASCII commands and the device answers with
//! packets starting with a four byte status:
//!
//! | Status | Meaning |
//! |--------|---------|
//! | `OKAY` | Command done, the rest of the packet is the result |
//! | `FAIL` | Command failed, the rest of the packet is the reason |
//! | `DATA` | Ready to receive the number of bytes given as 8 hex digits |
//! | `INFO` | Informational text, more packets follow |
//!
//! Bytes are moved by a [`Transport`]; [`engine`] runs a whole queue.

pub mod engine;

pub use engine::{execute, ExecutionProgress, NoProgress};

use crate::error::{Error, Result};

// ===========================================================================
// Protocol limits
// ===========================================================================

/// Maximum length of a command sent to the device
pub const MAX_COMMAND_LEN: usize = 64;

/// Maximum length of a response packet
pub const MAX_RESPONSE_LEN: usize = 64;

/// Payloads are written in pieces of this size so progress can be reported
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Byte pipe to a fastboot device
///
/// A `write` hands over one complete command or payload; the implementation
/// is free to split it into several USB transfers. A `read` returns exactly
/// one response packet.
pub trait Transport {
    /// Send `data`, returning the number of bytes written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Receive one packet into `buf`, returning its length
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

/// Decoded response packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Okay(String),
    Fail(String),
    Data(u32),
    Info(String),
}

impl Response {
    /// Decode a raw packet
    pub fn parse(packet: &[u8]) -> Result<Response> {
        if packet.len() < 4 {
            return Err(Error::Protocol(format!(
                "short response ({} bytes)",
                packet.len()
            )));
        }

        let (status, rest) = packet.split_at(4);
        let text = String::from_utf8_lossy(rest).into_owned();

        match status {
            b"OKAY" => Ok(Response::Okay(text)),
            b"FAIL" => Ok(Response::Fail(text)),
            b"INFO" => Ok(Response::Info(text)),
            b"DATA" => u32::from_str_radix(text.trim(), 16)
                .map(Response::Data)
                .map_err(|_| Error::Protocol(format!("invalid data size '{}'", text))),
            _ => Err(Error::Protocol(format!(
                "unknown status code '{}'",
                String::from_utf8_lossy(status)
            ))),
        }
    }
}

/// What a finished command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OKAY` with its result text
    Okay(String),
    /// `DATA`, device waits for this many bytes
    Data(u32),
}

/// Send `command` and collect packets until a final status arrives
///
/// `INFO` lines are passed to `progress`. A `FAIL` becomes
/// [`Error::Execution`] carrying the remote reason.
pub fn send_command<T: Transport + ?Sized>(
    transport: &mut T,
    command: &str,
    progress: &mut dyn ExecutionProgress,
) -> Result<Reply> {
    if command.len() > MAX_COMMAND_LEN {
        return Err(Error::Argument(format!("command too large: '{}'", command)));
    }

    log::trace!("-> {}", command);
    let written = transport.write(command.as_bytes())?;
    if written != command.len() {
        return Err(Error::Transport(format!(
            "command write failed ({} of {} bytes)",
            written,
            command.len()
        )));
    }

    read_reply(transport, progress)
}

/// Read packets until `OKAY`, `FAIL` or `DATA`
pub fn read_reply<T: Transport + ?Sized>(
    transport: &mut T,
    progress: &mut dyn ExecutionProgress,
) -> Result<Reply> {
    let mut buf = [0u8; MAX_RESPONSE_LEN];

    loop {
        let len = transport.read(&mut buf)?;
        let response = Response::parse(&buf[..len])?;
        log::trace!("<- {:?}", response);

        match response {
            Response::Info(text) => progress.info(&text),
            Response::Okay(text) => return Ok(Reply::Okay(text)),
            Response::Data(size) => return Ok(Reply::Data(size)),
            Response::Fail(reason) => {
                return Err(Error::Execution(format!("remote: {}", reason)))
            }
        }
    }
}

/// Send `data` with the `download` command
pub fn download<T: Transport + ?Sized>(
    transport: &mut T,
    data: &[u8],
    progress: &mut dyn ExecutionProgress,
) -> Result<()> {
    let size = u32::try_from(data.len())
        .map_err(|_| Error::Argument(format!("payload too large ({} bytes)", data.len())))?;

    match send_command(transport, &format!("download:{:08x}", size), progress)? {
        Reply::Data(accepted) if accepted == size => {}
        Reply::Data(accepted) => {
            return Err(Error::Protocol(format!(
                "data size mismatch: sent {}, device accepted {}",
                size, accepted
            )))
        }
        Reply::Okay(_) => {
            return Err(Error::Protocol(
                "expected DATA response to download".to_string(),
            ))
        }
    }

    progress.transfer_started(data.len());
    let mut sent = 0;
    for chunk in data.chunks(DOWNLOAD_CHUNK_SIZE) {
        let written = transport.write(chunk)?;
        if written != chunk.len() {
            return Err(Error::Transport(format!(
                "data transfer failed ({} of {} bytes)",
                sent + written,
                data.len()
            )));
        }
        sent += written;
        progress.transfer_progress(sent);
    }
    progress.transfer_done();

    match read_reply(transport, progress)? {
        Reply::Okay(_) => Ok(()),
        Reply::Data(_) => Err(Error::Protocol(
            "unexpected DATA response after download".to_string(),
        )),
    }
}
