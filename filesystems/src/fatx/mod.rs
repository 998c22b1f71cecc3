// FATX module - boot block, FAT, directory entries, path resolution, reader

pub mod boot_sector;
pub mod dir_entry;
pub mod fat;
pub mod path_resolver;
pub mod reader;

pub use boot_sector::{FatType, Volume};
pub use dir_entry::{attributes, DirEntryOutcome, FatxAttr, FatxTimestamp};
pub use fat::{FatEntry, FatTable};
pub use path_resolver::ResolvedPath;
pub use reader::{DirIter, FatxReader, VolumeInfo, Walk, DEFAULT_SECTOR_SIZE};
