use std::collections::HashSet;
use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::types::StlError;

/// Decompression bounds applied while reading an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Upper bound on the downloaded archive and on the total bytes decompressed from it.
    pub max_archive_bytes: u64,
    pub max_entry_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 512 * 1024 * 1024,
            max_entry_bytes: 256 * 1024 * 1024,
        }
    }
}

/// In-memory ZIP over a fetched byte buffer. Lives for one extraction request.
pub struct ArchiveHandle {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    names: HashSet<String>,
    limits: ArchiveLimits,
    bytes_read: u64,
}

impl std::fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("entries", &self.names.len())
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}

impl ArchiveHandle {
    pub fn open(bytes: Vec<u8>, limits: ArchiveLimits) -> Result<Self, StlError> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| StlError::CorruptArchive(e.to_string()))?;

        let names = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();

        Ok(Self {
            archive,
            names,
            limits,
            bytes_read: 0,
        })
    }

    /// Names of every file entry, exactly as stored in the central directory.
    pub fn entry_names(&self) -> &HashSet<String> {
        &self.names
    }

    /// Decompress one entry. Can be called repeatedly on the same handle.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StlError> {
        let remaining = self
            .limits
            .max_archive_bytes
            .saturating_sub(self.bytes_read);
        let cap = self.limits.max_entry_bytes.min(remaining);

        let entry = self.archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => {
                StlError::Unexpected(format!("Entry '{name}' not in archive"))
            }
            other => StlError::CorruptArchive(other.to_string()),
        })?;

        if entry.size() > cap {
            return Err(too_large(name, entry.size(), cap));
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        // Declared sizes can lie; read one byte past the cap to catch that.
        entry
            .take(cap.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| StlError::CorruptArchive(format!("Failed to read '{name}': {e}")))?;

        let read = buf.len() as u64;
        if read > cap {
            return Err(too_large(name, read, cap));
        }

        self.bytes_read = self.bytes_read.saturating_add(read);
        Ok(buf)
    }
}

fn too_large(name: &str, size: u64, cap: u64) -> StlError {
    StlError::ArchiveTooLarge(format!("'{name}' is {size} bytes, limit is {cap}"))
}

/// Check that uploaded bytes parse as a ZIP. Returns the number of entries.
pub fn validate_archive(bytes: &[u8]) -> Result<usize, StlError> {
    ZipArchive::new(Cursor::new(bytes))
        .map(|archive| archive.len())
        .map_err(|e| StlError::CorruptArchive(e.to_string()))
}
