// FATX filesystem reader
//
// `FatxReader` is the mount/session object: it owns the partition window,
// the parsed volume geometry and the in-memory FAT. All public operations
// (attribute lookup, listing, walking, byte-range reads) go through it.

use fatx_core::{DriveLetter, FatxError};
use log::{debug, info};
use std::path::Path;

use super::boot_sector::{FatType, Volume, BOOT_SECTOR_SIZE};
use super::dir_entry::{self, attributes, DirEntryOutcome, FatxAttr, DIR_ENTRY_SIZE};
use super::fat::FatTable;
use super::path_resolver::PathResolver;
use crate::device_reader::PartitionReader;

pub const DEFAULT_SECTOR_SIZE: u32 = 512;

/// Mount-level facts about an opened volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub fs_type: String,
    pub volume_id: u32,
    pub cluster_size: u32,
    pub total_clusters: u32,
}

/// An opened FATX volume.
pub struct FatxReader {
    reader: PartitionReader,
    volume: Volume,
    fat: FatTable,
}

impl FatxReader {
    /// Mount the FATX volume inside the given partition window.
    ///
    /// Any validation failure aborts the mount; no partially initialized
    /// reader is ever returned.
    pub fn open(
        path: impl AsRef<Path>,
        base_offset: u64,
        length: u64,
        sector_size: u32,
    ) -> Result<Self, FatxError> {
        let path = path.as_ref();
        info!(
            "Mounting FATX partition of {} at {:#x}+{:#x}",
            path.display(),
            base_offset,
            length
        );

        let mut reader = PartitionReader::open(path, base_offset, length, sector_size)?;
        let boot = reader.read_at(0, BOOT_SECTOR_SIZE)?;
        let volume = Volume::parse(&boot, length, sector_size)?;

        info!(
            "FATX volume {:#010x}: {} clusters of {} bytes, root cluster {}, {}-bit FAT",
            volume.volume_id,
            volume.total_clusters,
            volume.bytes_per_cluster,
            volume.root_cluster,
            match volume.fat_type {
                FatType::Fatx16 => 16,
                FatType::Fatx32 => 32,
            },
        );

        let fat = FatTable::load(&mut reader, &volume)?;

        Ok(FatxReader {
            reader,
            volume,
            fat,
        })
    }

    /// Mount a drive of the standard retail disk layout.
    pub fn open_drive(path: impl AsRef<Path>, drive: DriveLetter) -> Result<Self, FatxError> {
        let window = drive.window();
        Self::open(path, window.base_offset, window.length, DEFAULT_SECTOR_SIZE)
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn fat(&self) -> &FatTable {
        &self.fat
    }

    pub fn volume_info(&self) -> VolumeInfo {
        VolumeInfo {
            fs_type: match self.volume.fat_type {
                FatType::Fatx16 => "FATX16".to_string(),
                FatType::Fatx32 => "FATX32".to_string(),
            },
            volume_id: self.volume.volume_id,
            cluster_size: self.volume.bytes_per_cluster,
            total_clusters: self.volume.total_clusters,
        }
    }

    /// Synthetic attribute for the root directory, which has no entry of its
    /// own on disk.
    pub(crate) fn root_attr(&self) -> FatxAttr {
        FatxAttr {
            filename: "/".to_string(),
            attributes: attributes::DIRECTORY,
            file_size: 0,
            first_cluster: self.volume.root_cluster,
            modified: Default::default(),
            created: Default::default(),
            accessed: Default::default(),
        }
    }

    /// Read the full content of one data cluster.
    pub(crate) fn read_cluster(&mut self, cluster: u32) -> Result<Vec<u8>, FatxError> {
        if !self.volume.cluster_valid(cluster) {
            return Err(FatxError::CorruptChain(format!(
                "cluster {} out of range (1..{})",
                cluster, self.volume.total_clusters
            )));
        }
        let offset = self.volume.cluster_offset(cluster);
        self.reader
            .read_at(offset, self.volume.bytes_per_cluster as usize)
    }

    /// Decoded attribute of the entry at `path`.
    pub fn get_attr(&mut self, path: &str) -> Result<FatxAttr, FatxError> {
        Ok(PathResolver::new(self).resolve(path)?.attr)
    }

    /// Live entries of the directory at `path`.
    pub fn list_dir(&mut self, path: &str) -> Result<Vec<FatxAttr>, FatxError> {
        self.open_dir(path)?.collect()
    }

    /// Lazy iterator over the live entries of the directory at `path`.
    pub fn open_dir(&mut self, path: &str) -> Result<DirIter<'_>, FatxError> {
        let resolved = PathResolver::new(self).resolve(path)?;
        if !resolved.attr.is_directory() {
            return Err(FatxError::NotADirectory(path.to_string()));
        }
        let cluster = resolved.attr.first_cluster;
        DirIter::open(self, cluster)
    }

    /// Entries of the directory chain starting at `cluster`.
    pub(crate) fn read_directory(&mut self, cluster: u32) -> Result<Vec<FatxAttr>, FatxError> {
        DirIter::open(self, cluster)?.collect()
    }

    /// Depth-first pre-order traversal starting at the directory at `path`.
    pub fn walk(&mut self, path: &str) -> Result<Walk<'_>, FatxError> {
        let resolved = PathResolver::new(self).resolve(path)?;
        if !resolved.attr.is_directory() {
            return Err(FatxError::NotADirectory(path.to_string()));
        }
        let start = normalize_path(path);
        let cluster = resolved.attr.first_cluster;
        Ok(Walk {
            fs: self,
            stack: vec![(start, cluster)],
        })
    }

    /// Read `size` bytes of the file at `path`, starting at byte `offset`.
    ///
    /// Returns exactly `size` bytes or fails; `size == 0` succeeds with empty
    /// bytes for any `offset <= file_size`.
    pub fn read(&mut self, path: &str, offset: u64, size: u64) -> Result<Vec<u8>, FatxError> {
        let attr = self.get_attr(path)?;
        if attr.is_directory() {
            return Err(FatxError::IsADirectory(path.to_string()));
        }
        self.read_range(&attr, offset, size)
    }

    /// Read the whole content of the file at `path`.
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>, FatxError> {
        let attr = self.get_attr(path)?;
        if attr.is_directory() {
            return Err(FatxError::IsADirectory(path.to_string()));
        }
        self.read_range(&attr, 0, attr.file_size as u64)
    }

    /// Byte-range read over an already resolved attribute.
    pub fn read_range(
        &mut self,
        attr: &FatxAttr,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, FatxError> {
        let file_size = attr.file_size as u64;
        if size == 0 {
            return if offset <= file_size {
                Ok(Vec::new())
            } else {
                Err(FatxError::InvalidRange {
                    offset,
                    size,
                    file_size,
                })
            };
        }
        if offset >= file_size || size > file_size - offset {
            return Err(FatxError::InvalidRange {
                offset,
                size,
                file_size,
            });
        }
        debug!(
            "Reading {} bytes at offset {} of '{}' (cluster {})",
            size, offset, attr.filename, attr.first_cluster
        );

        let bytes_per_cluster = self.volume.bytes_per_cluster as u64;
        let skip = (offset / bytes_per_cluster) as usize;
        let mut intra = offset % bytes_per_cluster;
        let mut remaining = size as usize;
        let mut data = Vec::with_capacity(remaining);

        let chain = self.fat.chain_to_vec(attr.first_cluster)?;
        for &cluster in chain.iter().skip(skip) {
            let take = remaining.min((bytes_per_cluster - intra) as usize);
            let cluster_offset = self.volume.cluster_offset(cluster);
            let part = self.reader.read_at(cluster_offset + intra, take)?;
            data.extend_from_slice(&part);
            intra = 0;
            remaining -= take;
            if remaining == 0 {
                break;
            }
        }
        if remaining > 0 {
            return Err(FatxError::CorruptChain(format!(
                "chain of '{}' ended {} bytes short of its file size",
                attr.filename, remaining
            )));
        }
        Ok(data)
    }
}

/// Lazy iterator over the live entries of one directory.
///
/// Walks the directory's cluster chain, slicing each cluster into 64-byte
/// records. Deleted and unused records are skipped; the end-of-directory
/// sentinel stops the whole iteration, later chain clusters included.
pub struct DirIter<'a> {
    fs: &'a mut FatxReader,
    clusters: std::vec::IntoIter<u32>,
    buf: Vec<u8>,
    pos: usize,
    done: bool,
}

impl<'a> DirIter<'a> {
    pub(crate) fn open(fs: &'a mut FatxReader, start_cluster: u32) -> Result<Self, FatxError> {
        let clusters = fs.fat.chain_to_vec(start_cluster)?.into_iter();
        Ok(DirIter {
            fs,
            clusters,
            buf: Vec::new(),
            pos: 0,
            done: false,
        })
    }
}

impl Iterator for DirIter<'_> {
    type Item = Result<FatxAttr, FatxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if self.pos + DIR_ENTRY_SIZE > self.buf.len() {
                let cluster = match self.clusters.next() {
                    Some(cluster) => cluster,
                    None => {
                        self.done = true;
                        return None;
                    }
                };
                self.buf = match self.fs.read_cluster(cluster) {
                    Ok(data) => data,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                };
                self.pos = 0;
            }

            let raw = &self.buf[self.pos..self.pos + DIR_ENTRY_SIZE];
            self.pos += DIR_ENTRY_SIZE;
            match dir_entry::decode(raw) {
                Ok(DirEntryOutcome::Valid(attr)) => return Some(Ok(attr)),
                Ok(DirEntryOutcome::Deleted) | Ok(DirEntryOutcome::Unused) => continue,
                Ok(DirEntryOutcome::EndOfDirectory) => {
                    self.done = true;
                    return None;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Depth-first pre-order directory tree traversal.
///
/// Keeps an explicit work stack of `(path, cluster)` pairs instead of
/// recursing, so adversarially deep trees cannot grow the call stack. Each
/// visited directory yields `(path, dir_names, file_names)`.
pub struct Walk<'a> {
    fs: &'a mut FatxReader,
    stack: Vec<(String, u32)>,
}

impl Iterator for Walk<'_> {
    type Item = Result<(String, Vec<String>, Vec<String>), FatxError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (path, cluster) = self.stack.pop()?;
        let entries = match self.fs.read_directory(cluster) {
            Ok(entries) => entries,
            Err(e) => {
                self.stack.clear();
                return Some(Err(e));
            }
        };

        let mut dir_names = Vec::new();
        let mut file_names = Vec::new();
        let mut subdirs = Vec::new();
        for entry in entries {
            if entry.is_directory() {
                subdirs.push((join_path(&path, &entry.filename), entry.first_cluster));
                dir_names.push(entry.filename);
            } else {
                file_names.push(entry.filename);
            }
        }
        // Reversed so the first subdirectory is visited next
        for item in subdirs.into_iter().rev() {
            self.stack.push(item);
        }

        Some(Ok((path, dir_names, file_names)))
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("a/b/"), "/a/b");
        assert_eq!(normalize_path("/a"), "/a");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("/a", "b"), "/a/b");
    }
}
