//! Full-package flashing
//!
//! A package is a zip archive holding every image needed to reflash a
//! device. The set of images and the order they are written in are fixed:
//! the device firmware expects the bootloader stage first and the platform
//! image last.

use std::path::Path;

use crate::error::{Error, Result};
use crate::loader::{extract_entry, load_file, Archive};
use crate::queue::QueuedOperation;

/// One required package member and the partition it is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Entry name inside the archive
    pub entry: &'static str,
    /// Target partition on the device
    pub partition: &'static str,
}

/// Images of a full package, in flashing order
pub const PACKAGE_MANIFEST: &[ManifestEntry] = &[
    ManifestEntry {
        entry: "dnx.bin",
        partition: "dnx",
    },
    ManifestEntry {
        entry: "ifwi.bin",
        partition: "ifwi",
    },
    ManifestEntry {
        entry: "stitch.normalos.bin",
        partition: "boot",
    },
    ManifestEntry {
        entry: "stitch.preos.bin",
        partition: "preos",
    },
    ManifestEntry {
        entry: "platform.img.gz",
        partition: "platform",
    },
];

const SEPARATOR: &str = "--------------------------------------------";

/// Status queries shown before a package is flashed
pub fn info_dump() -> Vec<QueuedOperation> {
    vec![
        QueuedOperation::Notice {
            message: SEPARATOR.to_string(),
        },
        QueuedOperation::Display {
            variable: "preos".to_string(),
            label: "Current Pre-OS Version ".to_string(),
        },
        QueuedOperation::Display {
            variable: "ifwi".to_string(),
            label: "Current IFWI Version   ".to_string(),
        },
        QueuedOperation::Notice {
            message: SEPARATOR.to_string(),
        },
    ]
}

/// Build the operations that reflash a device from the package at `path`
///
/// The plan is only returned once every manifest entry has been extracted;
/// a missing or corrupt entry fails the whole plan.
pub fn plan_package(path: &Path) -> Result<Vec<QueuedOperation>> {
    let data = load_file(path)?;
    let mut archive = Archive::open(data).map_err(|e| {
        Error::Package(format!(
            "failed to access zipdata in '{}': {}",
            path.display(),
            e
        ))
    })?;

    log::info!(
        "Planning package {} ({} entries)",
        path.display(),
        archive.len()
    );

    let mut plan = info_dump();
    for item in PACKAGE_MANIFEST {
        let data = extract_entry(&mut archive, item.entry).map_err(|e| match e {
            Error::MissingEntry(name) => Error::Package(format!("package missing {}", name)),
            other => other,
        })?;

        plan.push(QueuedOperation::Flash {
            partition: item.partition.to_string(),
            data,
        });
    }

    Ok(plan)
}
