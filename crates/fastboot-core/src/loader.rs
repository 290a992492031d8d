//! File and archive loading
//!
//! Payloads are read fully into memory before anything is queued. Failed
//! loads leave nothing behind: file handles and partially filled buffers
//! are owned locals and are dropped on the error path.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{Error, Result};

/// Read the whole file at `path`
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Loaded {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Size of the buffer used to decompress an entry of `size` bytes
///
/// Some decompressors write slightly past the nominal end, so the buffer
/// gets 0.1% of headroom.
pub fn decompression_capacity(size: usize) -> usize {
    size.saturating_add(size / 1000).saturating_add(1)
}

/// Metadata of one archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry path inside the archive
    pub name: String,
    /// Stored (compressed) size in bytes
    pub compressed_size: u64,
    /// Size after decompression in bytes
    pub size: u64,
    index: usize,
}

/// In-memory zip archive
pub struct Archive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl Archive {
    /// Open `data` as a zip archive
    pub fn open(data: Vec<u8>) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::InvalidArchive(e.to_string()))?;
        log::debug!("Opened archive with {} entries", zip.len());
        Ok(Self { zip })
    }

    /// Number of entries in the archive
    pub(crate) fn len(&self) -> usize {
        self.zip.len()
    }

    /// Look up an entry by exact name
    pub fn lookup(&mut self, name: &str) -> Result<Option<ArchiveEntry>> {
        let Some(index) = self.zip.index_for_name(name) else {
            return Ok(None);
        };

        let file = self.zip.by_index(index).map_err(|e| Error::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(ArchiveEntry {
            name: name.to_string(),
            compressed_size: file.compressed_size(),
            size: file.size(),
            index,
        }))
    }

    /// Decompress `entry` into a freshly allocated buffer
    pub fn decompress(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let decode_err = |reason: String| Error::Decode {
            name: entry.name.clone(),
            reason,
        };

        let size = usize::try_from(entry.size)
            .map_err(|_| decode_err(format!("entry too large ({} bytes)", entry.size)))?;

        let capacity = decompression_capacity(size);
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| decode_err(format!("failed to allocate {} bytes", size)))?;

        let mut file = self
            .zip
            .by_index(entry.index)
            .map_err(|e| decode_err(e.to_string()))?;

        // Never inflate past the reserved buffer, whatever the stream holds
        (&mut file)
            .take(capacity as u64)
            .read_to_end(&mut data)
            .map_err(|e| decode_err(e.to_string()))?;

        if data.len() >= capacity {
            return Err(decode_err(format!(
                "entry inflates past {} bytes, declared size is {}",
                capacity, size
            )));
        }

        if data.len() != size {
            return Err(decode_err(format!(
                "expected {} bytes, got {}",
                size,
                data.len()
            )));
        }

        log::debug!(
            "Extracted '{}' ({} -> {} bytes)",
            entry.name,
            entry.compressed_size,
            data.len()
        );
        Ok(data)
    }
}

/// Extract the entry called `name` from `archive`
pub fn extract_entry(archive: &mut Archive, name: &str) -> Result<Vec<u8>> {
    let entry = archive
        .lookup(name)?
        .ok_or_else(|| Error::MissingEntry(name.to_string()))?;
    archive.decompress(&entry)
}
