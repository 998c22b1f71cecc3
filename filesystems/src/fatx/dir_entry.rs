// FATX directory entry decoding
//
// Entries are fixed 64-byte records:
//   0x00  name length; 0xE5 deleted, 0x00/0xFF end of directory
//   0x01  attribute flags
//   0x02  name bytes, 42-byte field padded past the stored length
//   0x2C  first cluster (u32 LE)
//   0x30  file size (u32 LE)
//   0x34  modified, created, accessed time/date pairs (u16 LE each)

use byteorder::{ByteOrder, LittleEndian};
use fatx_core::FatxError;
use std::fmt;

pub const DIR_ENTRY_SIZE: usize = 64;
pub const FILENAME_SIZE: usize = 42;

const DELETED_MARKER: u8 = 0xE5;
const END_OF_DIR_MARKER: u8 = 0xFF;

/// FATX packed timestamps count years from 2000, not 1980.
const FATX_EPOCH: u16 = 2000;

/// Attribute flag bits of a directory entry.
pub mod attributes {
    pub const READ_ONLY: u8 = 1 << 0;
    pub const SYSTEM: u8 = 1 << 1;
    pub const HIDDEN: u8 = 1 << 2;
    pub const VOLUME: u8 = 1 << 3;
    pub const DIRECTORY: u8 = 1 << 4;
}

/// Decoded FATX date/time pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FatxTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl FatxTimestamp {
    fn decode(time: u16, date: u16) -> Self {
        FatxTimestamp {
            year: ((date >> 9) & 0x7F) + FATX_EPOCH,
            month: ((date >> 5) & 0x0F) as u8,
            day: (date & 0x1F) as u8,
            hour: ((time >> 11) & 0x1F) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            // Two-second granularity on disk
            second: ((time & 0x1F) as u8) * 2,
        }
    }
}

/// Decoded metadata of one directory entry.
///
/// Boolean facets are derived from the attribute bitmask on demand; only the
/// mask itself is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatxAttr {
    pub filename: String,
    pub attributes: u8,
    pub file_size: u32,
    pub first_cluster: u32,
    pub modified: FatxTimestamp,
    pub created: FatxTimestamp,
    pub accessed: FatxTimestamp,
}

impl FatxAttr {
    pub fn is_readonly(&self) -> bool {
        self.attributes & attributes::READ_ONLY != 0
    }

    pub fn is_system(&self) -> bool {
        self.attributes & attributes::SYSTEM != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes & attributes::HIDDEN != 0
    }

    pub fn is_volume(&self) -> bool {
        self.attributes & attributes::VOLUME != 0
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & attributes::DIRECTORY != 0
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory()
    }
}

impl fmt::Display for FatxAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = vec![if self.is_directory() { "dir" } else { "file" }];
        if self.is_readonly() {
            flags.push("ro");
        }
        if self.is_system() {
            flags.push("sys");
        }
        if self.is_hidden() {
            flags.push("hid");
        }
        if self.is_volume() {
            flags.push("vol");
        }
        write!(
            f,
            "<{} attr={} size={:#x}>",
            self.filename,
            flags.join(","),
            self.file_size
        )
    }
}

/// Result of decoding one raw entry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntryOutcome {
    Valid(FatxAttr),
    /// Deleted entry, skip.
    Deleted,
    /// Name length is no sentinel but not a valid length either, skip.
    Unused,
    /// Terminates the whole directory listing, not just the current cluster.
    EndOfDirectory,
}

/// Decode a 64-byte directory entry record.
pub fn decode(raw: &[u8]) -> Result<DirEntryOutcome, FatxError> {
    debug_assert!(raw.len() >= DIR_ENTRY_SIZE);

    let name_len = raw[0];
    match name_len {
        0x00 | END_OF_DIR_MARKER => return Ok(DirEntryOutcome::EndOfDirectory),
        DELETED_MARKER => return Ok(DirEntryOutcome::Deleted),
        len if len as usize > FILENAME_SIZE => return Ok(DirEntryOutcome::Unused),
        _ => {}
    }

    let name_bytes = &raw[2..2 + name_len as usize];
    if !name_bytes
        .iter()
        .all(|b| b.is_ascii() && !b.is_ascii_control())
    {
        return Err(FatxError::InvalidName(format!("{:02x?}", name_bytes)));
    }
    let filename = String::from_utf8_lossy(name_bytes).into_owned();

    Ok(DirEntryOutcome::Valid(FatxAttr {
        filename,
        attributes: raw[1],
        first_cluster: LittleEndian::read_u32(&raw[0x2C..0x30]),
        file_size: LittleEndian::read_u32(&raw[0x30..0x34]),
        modified: FatxTimestamp::decode(
            LittleEndian::read_u16(&raw[0x34..0x36]),
            LittleEndian::read_u16(&raw[0x36..0x38]),
        ),
        created: FatxTimestamp::decode(
            LittleEndian::read_u16(&raw[0x38..0x3A]),
            LittleEndian::read_u16(&raw[0x3A..0x3C]),
        ),
        accessed: FatxTimestamp::decode(
            LittleEndian::read_u16(&raw[0x3C..0x3E]),
            LittleEndian::read_u16(&raw[0x3E..0x40]),
        ),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_entry(name: &[u8], attrs: u8, first_cluster: u32, file_size: u32) -> [u8; 64] {
        let mut raw = [0xFFu8; DIR_ENTRY_SIZE];
        raw[0] = name.len() as u8;
        raw[1] = attrs;
        raw[2..2 + name.len()].copy_from_slice(name);
        LittleEndian::write_u32(&mut raw[0x2C..0x30], first_cluster);
        LittleEndian::write_u32(&mut raw[0x30..0x34], file_size);
        for pair in raw[0x34..0x40].chunks_exact_mut(2) {
            pair.copy_from_slice(&[0, 0]);
        }
        raw
    }

    #[test]
    fn test_decode_file_entry() {
        let raw = raw_entry(b"default.xbe", 0x00, 7, 1234);
        let attr = match decode(&raw).unwrap() {
            DirEntryOutcome::Valid(attr) => attr,
            other => panic!("expected valid entry, got {:?}", other),
        };
        assert_eq!(attr.filename, "default.xbe");
        assert_eq!(attr.first_cluster, 7);
        assert_eq!(attr.file_size, 1234);
        assert!(attr.is_file());
        assert!(!attr.is_directory());
        assert!(!attr.is_hidden());
    }

    #[test]
    fn test_decode_directory_entry() {
        let raw = raw_entry(b"UDATA", attributes::DIRECTORY, 3, 0);
        match decode(&raw).unwrap() {
            DirEntryOutcome::Valid(attr) => {
                assert!(attr.is_directory());
                assert!(!attr.is_file());
            }
            other => panic!("expected valid entry, got {:?}", other),
        }
    }

    #[test]
    fn test_attribute_predicates_follow_bitmask() {
        let raw = raw_entry(
            b"x",
            attributes::READ_ONLY | attributes::SYSTEM | attributes::HIDDEN,
            2,
            0,
        );
        match decode(&raw).unwrap() {
            DirEntryOutcome::Valid(attr) => {
                assert!(attr.is_readonly());
                assert!(attr.is_system());
                assert!(attr.is_hidden());
                assert!(!attr.is_volume());
            }
            other => panic!("expected valid entry, got {:?}", other),
        }
    }

    #[test]
    fn test_sentinels() {
        let mut raw = raw_entry(b"gone", 0, 2, 0);
        raw[0] = 0xE5;
        assert_eq!(decode(&raw).unwrap(), DirEntryOutcome::Deleted);
        raw[0] = 0xFF;
        assert_eq!(decode(&raw).unwrap(), DirEntryOutcome::EndOfDirectory);
        raw[0] = 0x00;
        assert_eq!(decode(&raw).unwrap(), DirEntryOutcome::EndOfDirectory);
        // Above the name field width but no sentinel
        raw[0] = 50;
        assert_eq!(decode(&raw).unwrap(), DirEntryOutcome::Unused);
    }

    #[test]
    fn test_rejects_non_ascii_name() {
        let raw = raw_entry(&[0x80, 0x81], 0, 2, 0);
        assert!(matches!(decode(&raw), Err(FatxError::InvalidName(_))));
    }

    #[test]
    fn test_timestamp_decoding() {
        // 2004-11-25 13:30:42
        let date: u16 = (4 << 9) | (11 << 5) | 25;
        let time: u16 = (13 << 11) | (30 << 5) | 21;
        let ts = FatxTimestamp::decode(time, date);
        assert_eq!(ts.year, 2004);
        assert_eq!(ts.month, 11);
        assert_eq!(ts.day, 25);
        assert_eq!(ts.hour, 13);
        assert_eq!(ts.minute, 30);
        assert_eq!(ts.second, 42);
    }

    #[test]
    fn test_display_format() {
        let raw = raw_entry(b"save.dat", attributes::READ_ONLY, 2, 5);
        if let DirEntryOutcome::Valid(attr) = decode(&raw).unwrap() {
            assert_eq!(attr.to_string(), "<save.dat attr=file,ro size=0x5>");
        } else {
            panic!("expected valid entry");
        }
    }
}
