// FATX boot block parsing and volume geometry
//
// The boot block is 4 KiB at partition offset 0:
//   0x00  magic "FATX"
//   0x04  volume id (u32 LE)
//   0x08  sectors per cluster (u32 LE)
//   0x0C  root directory first cluster (u32 LE)
//   0x10  reserved/padding to 0x1000
// The FAT follows immediately, rounded up to a 4 KiB boundary; the data area
// follows the FAT. Cluster numbering starts at 1 (entry 0 holds the media
// descriptor).

use byteorder::{ByteOrder, LittleEndian};
use fatx_core::FatxError;

pub const BOOT_SECTOR_SIZE: usize = 4096;
pub const FATX_SIGNATURE: &[u8; 4] = b"FATX";

/// FAT region alignment; the FAT is padded out to this boundary.
const FAT_ALIGNMENT: u64 = 4096;

/// Volumes with fewer clusters than this use 16-bit FAT entries.
pub const FATX16_CLUSTER_LIMIT: u32 = 0xFFF0;

/// Low FAT entries not addressable as data clusters.
pub const RESERVED_CLUSTERS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatType {
    Fatx16,
    Fatx32,
}

impl FatType {
    pub fn entry_size(self) -> u64 {
        match self {
            FatType::Fatx16 => 2,
            FatType::Fatx32 => 4,
        }
    }
}

/// Parsed volume geometry, immutable for the session lifetime.
#[derive(Debug, Clone)]
pub struct Volume {
    pub volume_id: u32,
    pub sector_size: u32,
    pub bytes_per_cluster: u32,
    pub total_clusters: u32,
    pub root_cluster: u32,
    pub fat_offset: u64,
    pub data_offset: u64,
    pub fat_type: FatType,
}

impl Volume {
    /// Parse the boot block and derive the volume layout.
    pub fn parse(
        boot: &[u8],
        partition_length: u64,
        sector_size: u32,
    ) -> Result<Self, FatxError> {
        if boot.len() < BOOT_SECTOR_SIZE {
            return Err(FatxError::InvalidVolume(format!(
                "boot block truncated: {} bytes",
                boot.len()
            )));
        }
        if &boot[0..4] != FATX_SIGNATURE {
            return Err(FatxError::InvalidVolume(format!(
                "bad signature {:02x?}",
                &boot[0..4]
            )));
        }

        let volume_id = LittleEndian::read_u32(&boot[4..8]);
        let sectors_per_cluster = LittleEndian::read_u32(&boot[8..12]);
        let root_cluster = LittleEndian::read_u32(&boot[12..16]);

        // Cluster size must be a power-of-two multiple of the sector size
        if sectors_per_cluster == 0
            || !sectors_per_cluster.is_power_of_two()
            || sectors_per_cluster > 1024
        {
            return Err(FatxError::InvalidVolume(format!(
                "implausible sectors per cluster: {}",
                sectors_per_cluster
            )));
        }
        let bytes_per_cluster = sectors_per_cluster
            .checked_mul(sector_size)
            .ok_or_else(|| {
                FatxError::InvalidVolume(format!(
                    "cluster size overflow: {} sectors of {} bytes",
                    sectors_per_cluster, sector_size
                ))
            })?;

        let total_clusters = (partition_length / bytes_per_cluster as u64) as u32;
        if total_clusters <= RESERVED_CLUSTERS {
            return Err(FatxError::InvalidVolume(format!(
                "partition of {} bytes holds no data clusters",
                partition_length
            )));
        }

        let fat_type = if total_clusters < FATX16_CLUSTER_LIMIT {
            FatType::Fatx16
        } else {
            FatType::Fatx32
        };

        let fat_offset = BOOT_SECTOR_SIZE as u64;
        let fat_bytes = total_clusters as u64 * fat_type.entry_size();
        let fat_bytes = fat_bytes.div_ceil(FAT_ALIGNMENT) * FAT_ALIGNMENT;
        let data_offset = fat_offset + fat_bytes;
        if data_offset >= partition_length {
            return Err(FatxError::InvalidVolume(format!(
                "partition of {} bytes too small for a {}-byte FAT region",
                partition_length, fat_bytes
            )));
        }

        if root_cluster < RESERVED_CLUSTERS || root_cluster >= total_clusters {
            return Err(FatxError::InvalidVolume(format!(
                "root cluster {} out of range (1..{})",
                root_cluster, total_clusters
            )));
        }

        Ok(Volume {
            volume_id,
            sector_size,
            bytes_per_cluster,
            total_clusters,
            root_cluster,
            fat_offset,
            data_offset,
            fat_type,
        })
    }

    /// Window-relative byte offset of a data cluster's content.
    pub fn cluster_offset(&self, cluster: u32) -> u64 {
        self.data_offset
            + (cluster - RESERVED_CLUSTERS) as u64 * self.bytes_per_cluster as u64
    }

    /// True when `cluster` addresses a data cluster of this volume.
    pub fn cluster_valid(&self, cluster: u32) -> bool {
        cluster >= RESERVED_CLUSTERS && cluster < self.total_clusters
    }
}
