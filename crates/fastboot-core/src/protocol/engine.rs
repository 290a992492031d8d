//! Queue execution
//!
//! Runs a [`CommandQueue`] against a device, one operation at a time, in
//! queue order. The first failure stops the run.

use std::time::{Duration, Instant};

use super::{download, send_command, Reply, Transport};
use crate::error::{Error, Result};
use crate::queue::{CommandQueue, QueuedOperation};

/// Callback for progress reporting while a queue runs
pub trait ExecutionProgress {
    /// A device step starts (`sending 'boot' (10 KB)`, `erasing 'cache'`)
    fn begin(&mut self, description: &str);

    /// Payload bytes are about to be sent
    fn transfer_started(&mut self, total_bytes: usize);

    /// Called after each chunk of payload has been sent
    fn transfer_progress(&mut self, bytes_sent: usize);

    /// The whole payload has been sent
    fn transfer_done(&mut self);

    /// The current step succeeded
    fn okay(&mut self, elapsed: Duration);

    /// The current step failed
    fn failed(&mut self, reason: &str);

    /// Informational text from the device
    fn info(&mut self, text: &str);

    /// A bootloader variable was read
    fn display(&mut self, label: &str, value: &str);

    /// A notice from the queue itself
    fn notice(&mut self, message: &str);

    /// Every operation has completed
    fn finished(&mut self, elapsed: Duration);
}

/// A no-op progress reporter
pub struct NoProgress;

impl ExecutionProgress for NoProgress {
    fn begin(&mut self, _description: &str) {}
    fn transfer_started(&mut self, _total_bytes: usize) {}
    fn transfer_progress(&mut self, _bytes_sent: usize) {}
    fn transfer_done(&mut self) {}
    fn okay(&mut self, _elapsed: Duration) {}
    fn failed(&mut self, _reason: &str) {}
    fn info(&mut self, _text: &str) {}
    fn display(&mut self, _label: &str, _value: &str) {}
    fn notice(&mut self, _message: &str) {}
    fn finished(&mut self, _elapsed: Duration) {}
}

/// Run every operation of `queue` against the device behind `transport`
///
/// The queue is consumed; payload buffers are released as soon as their
/// operation has finished.
pub fn execute<T: Transport + ?Sized>(
    transport: &mut T,
    queue: CommandQueue,
    progress: &mut dyn ExecutionProgress,
) -> Result<()> {
    let start = Instant::now();
    log::debug!(
        "Executing {} operations ({} payload bytes)",
        queue.len(),
        queue.payload_bytes()
    );

    for op in queue {
        run_operation(transport, op, progress)?;
    }

    progress.finished(start.elapsed());
    Ok(())
}

fn run_operation<T: Transport + ?Sized>(
    transport: &mut T,
    op: QueuedOperation,
    progress: &mut dyn ExecutionProgress,
) -> Result<()> {
    match op {
        QueuedOperation::Flash { partition, data } => {
            step(progress, &sending(&partition, data.len()), |p| {
                download(transport, &data, p)
            })?;
            drop(data);
            step(progress, &format!("writing '{}'", partition), |p| {
                expect_okay(transport, &format!("flash:{}", partition), p).map(drop)
            })
        }
        QueuedOperation::Erase { partition } => {
            step(progress, &format!("erasing '{}'", partition), |p| {
                expect_okay(transport, &format!("erase:{}", partition), p).map(drop)
            })
        }
        QueuedOperation::Display { variable, label } => {
            let command = format!("getvar:{}", variable);
            match expect_okay(transport, &command, progress) {
                Ok(value) => {
                    progress.display(&label, &value);
                    Ok(())
                }
                Err(e) => {
                    progress.failed(&format!("{} ({})", command, e));
                    Err(step_error(&command, e))
                }
            }
        }
        QueuedOperation::Notice { message } => {
            progress.notice(&message);
            Ok(())
        }
        QueuedOperation::Command { command, message } => {
            let description = if message.is_empty() { &command } else { &message };
            step(progress, description, |p| {
                expect_okay(transport, &command, p).map(drop)
            })
        }
        QueuedOperation::Reboot => step(progress, "rebooting", |p| {
            expect_okay(transport, "reboot", p).map(drop)
        }),
        QueuedOperation::RebootBootloader => step(progress, "rebooting into bootloader", |p| {
            expect_okay(transport, "reboot-bootloader", p).map(drop)
        }),
        QueuedOperation::Download { tag, data } => {
            step(progress, &sending(&tag, data.len()), |p| {
                download(transport, &data, p)
            })
        }
    }
}

fn sending(name: &str, len: usize) -> String {
    format!("sending '{}' ({} KB)", name, len / 1024)
}

/// Run one reported step, timing it and turning remote failures into
/// errors that name the step
fn step<F>(progress: &mut dyn ExecutionProgress, description: &str, f: F) -> Result<()>
where
    F: FnOnce(&mut dyn ExecutionProgress) -> Result<()>,
{
    progress.begin(description);
    let started = Instant::now();

    match f(progress) {
        Ok(()) => {
            progress.okay(started.elapsed());
            Ok(())
        }
        Err(e) => {
            progress.failed(&e.to_string());
            Err(step_error(description, e))
        }
    }
}

fn step_error(description: &str, e: Error) -> Error {
    match e {
        Error::Execution(reason) => Error::Execution(format!("{} failed ({})", description, reason)),
        other => other,
    }
}

fn expect_okay<T: Transport + ?Sized>(
    transport: &mut T,
    command: &str,
    progress: &mut dyn ExecutionProgress,
) -> Result<String> {
    match send_command(transport, command, progress)? {
        Reply::Okay(value) => Ok(value),
        Reply::Data(_) => Err(Error::Protocol(format!(
            "unexpected DATA response to '{}'",
            command
        ))),
    }
}
