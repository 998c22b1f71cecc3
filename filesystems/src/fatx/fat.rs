// File Allocation Table handling
//
// The whole FAT region is loaded at mount time and 16-bit entries are widened
// to the 32-bit marker space, so chain walks never touch the device.

use byteorder::{ByteOrder, LittleEndian};
use fatx_core::FatxError;
use log::trace;

use super::boot_sector::{FatType, Volume, RESERVED_CLUSTERS};
use crate::device_reader::PartitionReader;

const CLUSTER_FREE: u32 = 0x0000_0000;
const CLUSTER_BAD: u32 = 0xFFFF_FFF7;
/// Entries at or above this value terminate a chain.
const CLUSTER_END: u32 = 0xFFFF_FFF8;
/// 16-bit marker range; values here widen into the 32-bit marker space.
const FATX16_MARKER_BASE: u16 = 0xFFF0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    Bad,
    Next(u32),
    EndOfChain,
}

/// In-memory File Allocation Table, indexed by cluster number.
pub struct FatTable {
    entries: Vec<u32>,
    total_clusters: u32,
}

impl FatTable {
    /// Read the FAT region of `volume` through `reader`.
    pub fn load(reader: &mut PartitionReader, volume: &Volume) -> Result<Self, FatxError> {
        let count = volume.total_clusters as usize;
        let raw = reader.read_at(
            volume.fat_offset,
            count * volume.fat_type.entry_size() as usize,
        )?;

        let mut entries = Vec::with_capacity(count);
        match volume.fat_type {
            FatType::Fatx16 => {
                for chunk in raw.chunks_exact(2) {
                    entries.push(widen16(LittleEndian::read_u16(chunk)));
                }
            }
            FatType::Fatx32 => {
                for chunk in raw.chunks_exact(4) {
                    entries.push(LittleEndian::read_u32(chunk));
                }
            }
        }
        trace!("Loaded FAT with {} entries", entries.len());

        Ok(FatTable {
            entries,
            total_clusters: volume.total_clusters,
        })
    }

    /// Classified FAT entry for `cluster`.
    pub fn entry(&self, cluster: u32) -> Result<FatEntry, FatxError> {
        let raw = self
            .entries
            .get(cluster as usize)
            .copied()
            .ok_or_else(|| {
                FatxError::CorruptChain(format!(
                    "cluster {} beyond FAT of {} entries",
                    cluster,
                    self.entries.len()
                ))
            })?;
        Ok(match raw {
            CLUSTER_FREE => FatEntry::Free,
            CLUSTER_BAD => FatEntry::Bad,
            v if v >= CLUSTER_END => FatEntry::EndOfChain,
            v => FatEntry::Next(v),
        })
    }

    /// Lazy chain walk from `start`, bounded to `total_clusters` links.
    pub fn chain(&self, start: u32) -> ClusterChain<'_> {
        ClusterChain {
            table: self,
            current: Some(start),
            steps: 0,
        }
    }

    /// Collect the full chain from `start`.
    pub fn chain_to_vec(&self, start: u32) -> Result<Vec<u32>, FatxError> {
        self.chain(start).collect()
    }
}

fn widen16(value: u16) -> u32 {
    if value >= FATX16_MARKER_BASE {
        0xFFFF_0000 | value as u32
    } else {
        value as u32
    }
}

/// Iterator over the clusters of one chain.
///
/// Yields each cluster index in order; a cycle (more links than the volume
/// has clusters), an out-of-range index or a link into a free or bad entry
/// ends the iteration with a [`FatxError::CorruptChain`].
pub struct ClusterChain<'a> {
    table: &'a FatTable,
    current: Option<u32>,
    steps: u32,
}

impl Iterator for ClusterChain<'_> {
    type Item = Result<u32, FatxError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cluster = self.current?;
        self.current = None;

        if self.steps >= self.table.total_clusters {
            return Some(Err(FatxError::CorruptChain(format!(
                "chain exceeds {} links, cycle suspected",
                self.table.total_clusters
            ))));
        }
        if cluster < RESERVED_CLUSTERS || cluster >= self.table.total_clusters {
            return Some(Err(FatxError::CorruptChain(format!(
                "cluster {} out of range (1..{})",
                cluster, self.table.total_clusters
            ))));
        }
        self.steps += 1;

        match self.table.entry(cluster) {
            Ok(FatEntry::Next(next)) => self.current = Some(next),
            Ok(FatEntry::EndOfChain) => {}
            Ok(FatEntry::Free) | Ok(FatEntry::Bad) => {
                return Some(Err(FatxError::CorruptChain(format!(
                    "cluster {} is marked free or bad",
                    cluster
                ))));
            }
            Err(e) => return Some(Err(e)),
        }
        Some(Ok(cluster))
    }
}
