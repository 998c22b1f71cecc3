// Partition-window device access
// Every other component reads the backing store exclusively through this type.

use fatx_core::FatxError;
use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Read-only accessor over one partition window of a disk image or raw device.
///
/// Offsets passed to [`read_at`](PartitionReader::read_at) are relative to the
/// window base; requests that would cross the window end fail with
/// [`FatxError::OutOfRange`] before any device access happens. The handle is
/// released on drop.
pub struct PartitionReader {
    file: File,
    base_offset: u64,
    length: u64,
    sector_size: u32,
}

impl PartitionReader {
    pub fn open(
        path: impl AsRef<Path>,
        base_offset: u64,
        length: u64,
        sector_size: u32,
    ) -> Result<Self, FatxError> {
        let path = path.as_ref();
        debug!(
            "Opening {} read-only, window {:#x}+{:#x}",
            path.display(),
            base_offset,
            length
        );
        let file = File::open(path)?;
        Ok(PartitionReader {
            file,
            base_offset,
            length,
            sector_size,
        })
    }

    /// Window length in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// Read exactly `len` bytes at window-relative `offset`.
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, FatxError> {
        let out_of_range = FatxError::OutOfRange {
            offset,
            len: len as u64,
            window: self.length,
        };
        let end = match offset.checked_add(len as u64) {
            Some(end) => end,
            None => return Err(out_of_range),
        };
        if end > self.length {
            return Err(out_of_range);
        }

        self.file.seek(SeekFrom::Start(self.base_offset + offset))?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}
