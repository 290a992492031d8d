//! Queued device operations
//!
//! The command line is translated into a [`CommandQueue`] before any device
//! is touched. The queue is append-only: operations run in exactly the order
//! they were added, nothing is merged, reordered or dropped. Payloads are
//! moved into the queue on append and are owned by the execution engine
//! once the queue is handed over.

/// One intended action against the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedOperation {
    /// Download `data` and write it to `partition`
    Flash { partition: String, data: Vec<u8> },
    /// Erase `partition`
    Erase { partition: String },
    /// Read bootloader variable `variable` and print it under `label`
    Display { variable: String, label: String },
    /// Print `message`, no device traffic
    Notice { message: String },
    /// Send the raw command `command`, described to the user as `message`
    Command { command: String, message: String },
    /// Reboot into the normal system
    Reboot,
    /// Reboot back into the bootloader
    RebootBootloader,
    /// Download `data` into the device staging buffer, labelled `tag`
    Download { tag: String, data: Vec<u8> },
}

impl QueuedOperation {
    /// Payload carried by the operation, if any
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            QueuedOperation::Flash { data, .. } | QueuedOperation::Download { data, .. } => {
                Some(data)
            }
            _ => None,
        }
    }
}

/// Ordered list of operations waiting to be executed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandQueue {
    ops: Vec<QueuedOperation>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation
    pub fn push(&mut self, op: QueuedOperation) {
        log::trace!("Queued {:?}", OpSummary(&op));
        self.ops.push(op);
    }

    /// Append every operation of `ops`, keeping their order
    pub fn extend<I: IntoIterator<Item = QueuedOperation>>(&mut self, ops: I) {
        for op in ops {
            self.push(op);
        }
    }

    /// Queue a flash of `data` to `partition`
    pub fn flash(&mut self, partition: &str, data: Vec<u8>) {
        self.push(QueuedOperation::Flash {
            partition: partition.to_string(),
            data,
        });
    }

    /// Queue an erase of `partition`
    pub fn erase(&mut self, partition: &str) {
        self.push(QueuedOperation::Erase {
            partition: partition.to_string(),
        });
    }

    /// Queue a variable read
    pub fn display(&mut self, variable: &str, label: &str) {
        self.push(QueuedOperation::Display {
            variable: variable.to_string(),
            label: label.to_string(),
        });
    }

    /// Queue a message for the user
    pub fn notice(&mut self, message: &str) {
        self.push(QueuedOperation::Notice {
            message: message.to_string(),
        });
    }

    /// Queue a raw command
    pub fn command(&mut self, command: &str, message: &str) {
        self.push(QueuedOperation::Command {
            command: command.to_string(),
            message: message.to_string(),
        });
    }

    /// Queue a normal reboot
    pub fn reboot(&mut self) {
        self.push(QueuedOperation::Reboot);
    }

    /// Queue a download of `data` labelled `tag`
    pub fn download(&mut self, tag: &str, data: Vec<u8>) {
        self.push(QueuedOperation::Download {
            tag: tag.to_string(),
            data,
        });
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing has been queued
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over the queued operations in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, QueuedOperation> {
        self.ops.iter()
    }

    /// Last queued operation
    pub fn last(&self) -> Option<&QueuedOperation> {
        self.ops.last()
    }

    /// Total payload bytes that will be sent to the device
    pub fn payload_bytes(&self) -> usize {
        self.ops
            .iter()
            .filter_map(QueuedOperation::payload)
            .map(<[u8]>::len)
            .sum()
    }
}

impl IntoIterator for CommandQueue {
    type Item = QueuedOperation;
    type IntoIter = std::vec::IntoIter<QueuedOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandQueue {
    type Item = &'a QueuedOperation;
    type IntoIter = std::slice::Iter<'a, QueuedOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Debug view of an operation that elides payload bytes
struct OpSummary<'a>(&'a QueuedOperation);

impl std::fmt::Debug for OpSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            QueuedOperation::Flash { partition, data } => {
                write!(f, "Flash({}, {} bytes)", partition, data.len())
            }
            QueuedOperation::Download { tag, data } => {
                write!(f, "Download({}, {} bytes)", tag, data.len())
            }
            op => write!(f, "{:?}", op),
        }
    }
}
