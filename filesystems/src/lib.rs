// Read-only FATX filesystem driver
//
// FATX is the FAT-derived filesystem used by the original Xbox. Media is
// carved into fixed-offset partition windows; each window holds a 4 KiB boot
// block, a File Allocation Table and a cluster-addressed data area. This
// crate mounts one window and exposes attribute lookup, directory listing,
// tree walking and byte-range file reads. It never writes.

pub mod device_reader;
pub mod fatx;

pub use device_reader::PartitionReader;
pub use fatx::{
    DirIter, FatType, FatxAttr, FatxReader, FatxTimestamp, Volume, VolumeInfo, Walk,
};
